//! Compares an expected-output tree against witness values resolved
//! through the symbol table.

use std::path::Path;

use serde_json::{Number, Value};

use super::errors::{CheckError, CheckResult};
use super::symbols::SymbolTable;
use super::witness::Witness;

pub const DEFAULT_ROOT_COMPONENT: &str = "main";

/// Expected circuit outputs, mirroring the output signal layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedOutput {
    Leaf(String),
    List(Vec<ExpectedOutput>),
    /// Fields in document order.
    Record(Vec<(String, ExpectedOutput)>),
}

impl ExpectedOutput {
    pub fn parse_json(text: &str) -> CheckResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CheckError::malformed("expected output json", e.to_string()))?;
        Ok(Self::from(value))
    }

    pub fn load(path: &Path) -> CheckResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CheckError::io(path, e))?;
        Self::parse_json(&text)
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            ExpectedOutput::Leaf(_) => 1,
            ExpectedOutput::List(items) => items.iter().map(Self::leaf_count).sum(),
            ExpectedOutput::Record(fields) => fields.iter().map(|(_, v)| v.leaf_count()).sum(),
        }
    }
}

impl From<Value> for ExpectedOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                ExpectedOutput::List(items.into_iter().map(Self::from).collect())
            }
            Value::Object(fields) => ExpectedOutput::Record(
                fields.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            ),
            Value::String(s) => ExpectedOutput::Leaf(s),
            Value::Number(n) => ExpectedOutput::Leaf(number_text(&n)),
            Value::Bool(b) => ExpectedOutput::Leaf(b.to_string()),
            Value::Null => ExpectedOutput::Leaf("null".to_string()),
        }
    }
}

/// Integer literals are kept verbatim so big values stay exact. Other
/// literals with an exactly representable integral value (`7.0`, `1e1`)
/// print as that integer.
fn number_text(n: &Number) -> String {
    let literal = n.to_string();
    if literal.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        return literal;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE_FLOAT_INTEGER => {
            (f as i64).to_string()
        }
        _ => literal,
    }
}

/// 2^53, above which `f64` no longer holds every integer.
const MAX_SAFE_FLOAT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Walks an expected tree depth-first, failing on the first leaf that is
/// unknown or disagrees with the witness.
#[derive(Debug, Clone, Copy)]
pub struct OutputAsserter<'a> {
    symbols: &'a SymbolTable,
    witness: &'a Witness,
    root: &'a str,
}

impl<'a> OutputAsserter<'a> {
    pub fn new(symbols: &'a SymbolTable, witness: &'a Witness) -> Self {
        Self {
            symbols,
            witness,
            root: DEFAULT_ROOT_COMPONENT,
        }
    }

    pub fn with_root(mut self, root: &'a str) -> Self {
        self.root = root;
        self
    }

    pub fn check(&self, expected: Option<&ExpectedOutput>) -> CheckResult<()> {
        match expected {
            Some(tree) => self.visit(self.root.to_string(), tree),
            None => Ok(()),
        }
    }

    fn visit(&self, path: String, node: &ExpectedOutput) -> CheckResult<()> {
        match node {
            ExpectedOutput::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.visit(format!("{path}[{i}]"), item)?;
                }
                Ok(())
            }
            ExpectedOutput::Record(fields) => {
                for (name, item) in fields {
                    self.visit(format!("{path}.{name}"), item)?;
                }
                Ok(())
            }
            ExpectedOutput::Leaf(expected) => self.compare(&path, expected),
        }
    }

    fn compare(&self, path: &str, expected: &str) -> CheckResult<()> {
        let entry = self
            .symbols
            .get(path)
            .ok_or_else(|| CheckError::UnknownOutputSignal(path.to_string()))?;
        let var_idx = entry
            .var_idx
            .ok_or_else(|| CheckError::OutputSignalEliminated(path.to_string()))?;
        let actual = self.witness.get(var_idx).ok_or_else(|| {
            CheckError::malformed(
                "sym",
                format!(
                    "{path} maps to signal {var_idx} but the witness has {} values",
                    self.witness.len()
                ),
            )
        })?;

        let actual = actual.to_string();
        let expected = self
            .witness
            .field()
            .from_decimal(expected)
            .map(|e| e.to_string())
            .unwrap_or_else(|| expected.to_string());
        if actual != expected {
            return Err(CheckError::output_mismatch(path, &actual, &expected));
        }
        Ok(())
    }
}

/// Asserts outputs under the default `main` root.
pub fn assert_outputs(
    symbols: &SymbolTable,
    witness: &Witness,
    expected: Option<&ExpectedOutput>,
) -> CheckResult<()> {
    OutputAsserter::new(symbols, witness).check(expected)
}
