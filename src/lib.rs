//! r1cs-checker: witness verification for circom circuits
//!
//! Given a compiled constraint system (`.r1cs`), its debug symbols (`.sym`)
//! and a computed witness, this crate checks that the witness satisfies every
//! constraint and that the circuit's output signals hold the values a test
//! case expects.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use r1cs_checker::{CircuitChecker, ExpectedOutput, WitnessInput};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let mut checker = CircuitChecker::new();
//! checker.load(Path::new("circuit.r1cs"), Path::new("circuit.sym"))?;
//!
//! let expected = ExpectedOutput::parse_json(r#"{"out": "7"}"#)?;
//! checker.verify(WitnessInput::Path(Path::new("witness.wtns")), Some(&expected))?;
//! # Ok(())
//! # }
//! ```
//!
//! Compiling circuits and running witness generators is left to the circom
//! toolchain; this crate only consumes their output files.

pub mod checker;

pub use checker::{
    assert_outputs, verify, CheckError, CheckResult, CheckerConfig, CircuitChecker,
    ConstraintSystem, ExpectedOutput, PrimeField, SymbolTable, ViolationReport, Witness,
    WitnessInput, WitnessType,
};
