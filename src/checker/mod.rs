//! R1CS witness checking for circom circuits.
//!
//! - `field`: arithmetic modulo the circuit prime
//! - `binfile`, `r1cs`, `witness`: artifact decoding (and encoding, for fixtures)
//! - `symbols`: the `.sym` name <-> witness index table
//! - `constraints`: constraint satisfaction with diagnostics
//! - `outputs`: expected-output assertions
//! - `circuit_checker`: load once, verify many witnesses

pub mod binfile;
pub mod circuit_checker;
pub mod config;
pub mod constraints;
pub mod errors;
pub mod field;
pub mod outputs;
pub mod r1cs;
pub mod symbols;
pub mod testcase;
pub mod witness;


// Re-export core types for convenience
pub use circuit_checker::{CircuitChecker, WitnessInput};
pub use config::{CheckerConfig, WitnessType};
pub use constraints::{render_lc, verify, ConstraintVerifier, RelatedSignal, ViolationReport};
pub use errors::{CheckError, CheckResult};
pub use field::{FieldElement, PrimeField};
pub use outputs::{assert_outputs, ExpectedOutput, OutputAsserter};
pub use r1cs::{ConstraintSystem, LinearCombination, R1csConstraint, R1csHeader};
pub use symbols::{SymbolEntry, SymbolTable};
pub use testcase::{discover, TestCase};
pub use witness::{Witness, WitnessFormat};
