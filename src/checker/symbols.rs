//! Debug symbols (`.sym`): `labelIdx,varIdx,componentIdx,name` per line.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use super::errors::{CheckError, CheckResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry {
    pub label_idx: u64,
    /// Witness slot; `None` when the compiler eliminated the signal (`-1`).
    pub var_idx: Option<usize>,
    pub component_idx: u64,
}

/// Forward map name -> entry plus reverse map witness index -> aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolEntry>,
    signals: HashMap<usize, Vec<String>>,
}

impl SymbolTable {
    /// Lines that are not exactly four comma-separated fields with numeric
    /// indices are skipped.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for line in text.lines() {
            if let Some((name, entry)) = parse_line(line) {
                table.insert(name, entry);
            }
        }
        table
    }

    pub fn load(path: &Path) -> CheckResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CheckError::MalformedSymbols {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text);
        if table.is_empty() {
            warn!(path = %path.display(), "symbol file has no entries");
        } else {
            debug!(path = %path.display(), symbols = table.len(), "loaded symbols");
        }
        Ok(table)
    }

    /// Adds or redeclares `name`. A redeclaration moves the alias off the
    /// slot it previously named.
    pub fn insert(&mut self, name: String, entry: SymbolEntry) {
        let previous = self.symbols.get(&name).and_then(|old| old.var_idx);
        if let Some(old_idx) = previous.filter(|&old_idx| Some(old_idx) != entry.var_idx) {
            if let Some(aliases) = self.signals.get_mut(&old_idx) {
                aliases.retain(|alias| alias != &name);
                if aliases.is_empty() {
                    self.signals.remove(&old_idx);
                }
            }
        }
        if let Some(var_idx) = entry.var_idx {
            let aliases = self.signals.entry(var_idx).or_default();
            if !aliases.contains(&name) {
                aliases.push(name.clone());
            }
        }
        self.symbols.insert(name, entry);
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.symbols.get(name)
    }

    /// Every name aliasing witness slot `var_idx`, in file order.
    pub fn names_for(&self, var_idx: usize) -> &[String] {
        self.signals.get(&var_idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn parse_line(line: &str) -> Option<(String, SymbolEntry)> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
    let [label, var, component, name] = fields.as_slice() else {
        return None;
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let var_idx = match var.trim().parse::<i64>().ok()? {
        -1 => None,
        idx => Some(usize::try_from(idx).ok()?),
    };
    let entry = SymbolEntry {
        label_idx: label.trim().parse().ok()?,
        var_idx,
        component_idx: component.trim().parse().ok()?,
    };
    Some((name.to_string(), entry))
}
