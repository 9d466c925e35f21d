//! Checks a witness against every constraint of a system, stopping at the
//! first violation with a report detailed enough to debug the circuit.

use std::fmt;

use tracing::debug;

use super::errors::{CheckError, CheckResult};
use super::field::{FieldElement, PrimeField};
use super::r1cs::{ConstraintSystem, LinearCombination};
use super::symbols::SymbolTable;
use super::witness::Witness;

/// Coefficients this close to the prime are shown as negatives.
pub const DEFAULT_NEGATIVE_THRESHOLD: u64 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedSignal {
    pub signal: usize,
    pub value: FieldElement,
    pub names: Vec<String>,
}

/// Diagnostics for the first unsatisfied constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationReport {
    /// 1-based index into the constraint list.
    pub position: usize,
    pub a: String,
    pub b: String,
    pub c: String,
    /// Signals used by the constraint, excluding the constant signal 0.
    pub related: Vec<RelatedSignal>,
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Invalid constraint #{}:", self.position)?;
        writeln!(f, "{} * {} != {}", self.a, self.b, self.c)?;
        write!(f, "Related signals:")?;
        for signal in &self.related {
            write!(
                f,
                "\n  signal{}: {}, value: {}",
                signal.signal,
                signal.names.join(" "),
                signal.value
            )?;
        }
        Ok(())
    }
}

/// Renders `(c1*signal1 + c2*signal2)`, dropping zero terms; an LC with no
/// nonzero term renders as `0`.
pub fn render_lc(field: &PrimeField, lc: &LinearCombination, threshold: u64) -> String {
    let terms: Vec<String> = lc
        .terms()
        .filter(|(_, coeff)| !coeff.is_zero())
        .map(|(idx, coeff)| format!("{}*signal{}", field.display_signed(coeff, threshold), idx))
        .collect();
    if terms.is_empty() {
        "0".to_string()
    } else {
        format!("({})", terms.join(" + "))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstraintVerifier<'a> {
    system: &'a ConstraintSystem,
    symbols: Option<&'a SymbolTable>,
    negative_threshold: u64,
}

impl<'a> ConstraintVerifier<'a> {
    pub fn new(system: &'a ConstraintSystem) -> Self {
        Self {
            system,
            symbols: None,
            negative_threshold: DEFAULT_NEGATIVE_THRESHOLD,
        }
    }

    /// Symbols used to name the signals of a violated constraint.
    pub fn with_symbols(mut self, symbols: &'a SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub fn with_negative_threshold(mut self, threshold: u64) -> Self {
        self.negative_threshold = threshold;
        self
    }

    pub fn verify(&self, witness: &Witness) -> CheckResult<()> {
        let field = self.system.field();
        if witness.field() != field {
            return Err(CheckError::malformed(
                "wtns",
                format!(
                    "witness prime {} differs from constraint system prime {}",
                    witness.field().modulus(),
                    field.modulus()
                ),
            ));
        }

        let values = witness.values();
        for (idx, constraint) in self.system.constraints().iter().enumerate() {
            let position = idx + 1;
            let (a, b, c) = constraint.evaluate(field, values).map_err(|err| {
                CheckError::malformed("r1cs", format!("constraint #{position}: {err}"))
            })?;
            if !field.is_zero(&field.sub(&field.mul(&a, &b), &c)) {
                return Err(CheckError::ConstraintViolation(Box::new(
                    self.report(position, witness),
                )));
            }
        }

        debug!(
            constraints = self.system.num_constraints(),
            witness_len = witness.len(),
            "all constraints satisfied"
        );
        Ok(())
    }

    fn report(&self, position: usize, witness: &Witness) -> ViolationReport {
        let field = self.system.field();
        let constraint = &self.system.constraints()[position - 1];
        let render = |lc: &LinearCombination| render_lc(field, lc, self.negative_threshold);
        let related = constraint
            .support()
            .into_iter()
            .filter(|&signal| signal != 0)
            .map(|signal| RelatedSignal {
                signal,
                // Evaluation succeeded, so every supported signal is in range.
                value: witness.get(signal).cloned().unwrap_or_default(),
                names: self
                    .symbols
                    .map(|s| s.names_for(signal).to_vec())
                    .unwrap_or_default(),
            })
            .collect();
        ViolationReport {
            position,
            a: render(&constraint.a),
            b: render(&constraint.b),
            c: render(&constraint.c),
            related,
        }
    }
}

/// Checks every constraint with default rendering and no symbol names.
pub fn verify(system: &ConstraintSystem, witness: &Witness) -> CheckResult<()> {
    ConstraintVerifier::new(system).verify(witness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::r1cs::R1csConstraint;
    use crate::checker::symbols::SymbolEntry;
    use num_bigint::BigUint;

    fn small_field() -> PrimeField {
        PrimeField::new(BigUint::from(13u8)).unwrap()
    }

    fn product_system(field: &PrimeField) -> ConstraintSystem {
        let constraint = R1csConstraint::new(
            LinearCombination::new().with_term(1, field.one()),
            LinearCombination::new().with_term(2, field.one()),
            LinearCombination::new().with_term(3, field.one()),
        );
        ConstraintSystem::new(field.clone(), 4, vec![constraint])
    }

    fn witness(field: &PrimeField, raw: &[u64]) -> Witness {
        Witness::new(field.clone(), raw.iter().map(|v| field.from_u64(*v)).collect()).unwrap()
    }

    #[test]
    fn satisfied_product_constraint() {
        let f = small_field();
        let system = product_system(&f);
        verify(&system, &witness(&f, &[1, 3, 4, 12])).unwrap();
        // 5 * 6 = 30 = 4 (mod 13)
        verify(&system, &witness(&f, &[1, 5, 6, 4])).unwrap();
    }

    #[test]
    fn violation_reports_position_and_signals() {
        let f = small_field();
        let system = product_system(&f);
        let mut symbols = SymbolTable::default();
        let entry = |var: usize| SymbolEntry {
            label_idx: var as u64,
            var_idx: Some(var),
            component_idx: 0,
        };
        symbols.insert("main.x".into(), entry(1));
        symbols.insert("main.z".into(), entry(3));
        symbols.insert("main.alias_z".into(), entry(3));

        let err = ConstraintVerifier::new(&system)
            .with_symbols(&symbols)
            .verify(&witness(&f, &[1, 3, 4, 11]))
            .unwrap_err();
        let report = match err {
            CheckError::ConstraintViolation(report) => report,
            other => panic!("expected a constraint violation, got {other}"),
        };
        assert_eq!(report.position, 1);
        assert_eq!(report.a, "(1*signal1)");
        assert_eq!(report.c, "(1*signal3)");
        assert_eq!(report.related.len(), 3);
        assert_eq!(report.related[2].value, f.from_u64(11));
        assert_eq!(report.related[2].names, vec!["main.z", "main.alias_z"]);
        assert!(report.related[1].names.is_empty());
        assert!(report
            .to_string()
            .contains("signal3: main.z main.alias_z, value: 11"));
    }

    #[test]
    fn first_violation_wins() {
        let f = small_field();
        let one = |idx| LinearCombination::new().with_term(idx, f.one());
        let constraints = vec![
            R1csConstraint::new(one(1), one(0), one(1)),
            R1csConstraint::new(one(1), one(1), one(2)),
            R1csConstraint::new(one(2), one(2), one(1)),
        ];
        let system = ConstraintSystem::new(f.clone(), 3, constraints);
        // 2 * 2 = 5 fails at #2; #3 would fail too.
        let err = verify(&system, &witness(&f, &[1, 2, 5])).unwrap_err();
        match err {
            CheckError::ConstraintViolation(report) => assert_eq!(report.position, 2),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn out_of_range_signal_is_malformed() {
        let f = small_field();
        let system = product_system(&f);
        let err = verify(&system, &witness(&f, &[1, 3, 4])).unwrap_err();
        assert!(matches!(err, CheckError::MalformedArtifact { .. }));
        assert!(err.to_string().contains("constraint #1"));
    }

    #[test]
    fn prime_mismatch_is_malformed() {
        let f = small_field();
        let system = product_system(&f);
        let other = PrimeField::new(BigUint::from(17u8)).unwrap();
        let err = verify(&system, &witness(&other, &[1, 3, 4, 12])).unwrap_err();
        assert!(err.to_string().contains("differs"));
    }

    #[test]
    fn lc_rendering() {
        let f = PrimeField::bn254();
        let minus_one = f.neg(&f.one());
        let lc = LinearCombination::new()
            .with_term(0, f.zero())
            .with_term(2, minus_one)
            .with_term(5, f.from_u64(3));
        assert_eq!(render_lc(&f, &lc, 200), "((-1)*signal2 + 3*signal5)");
        let zero = LinearCombination::new().with_term(4, f.zero());
        assert_eq!(render_lc(&f, &zero, 200), "0");
        assert_eq!(render_lc(&f, &LinearCombination::new(), 200), "0");
    }
}
