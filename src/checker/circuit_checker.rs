//! Entry point tying the decoders, the constraint verifier and the output
//! asserter together for one compiled circuit.

use std::path::Path;

use tracing::{debug, info, warn};

use super::config::CheckerConfig;
use super::constraints::{ConstraintVerifier, DEFAULT_NEGATIVE_THRESHOLD};
use super::errors::{CheckError, CheckResult};
use super::outputs::{ExpectedOutput, OutputAsserter, DEFAULT_ROOT_COMPONENT};
use super::r1cs::ConstraintSystem;
use super::symbols::SymbolTable;
use super::witness::{Witness, WitnessFormat};

/// Where a witness comes from.
#[derive(Debug, Clone, Copy)]
pub enum WitnessInput<'a> {
    Path(&'a Path),
    /// Raw artifact bytes; the format is sniffed from the content.
    Bytes(&'a [u8]),
}

#[derive(Debug, Clone)]
struct LoadedCircuit {
    system: ConstraintSystem,
    symbols: SymbolTable,
}

#[derive(Debug, Clone)]
enum State {
    Unloaded,
    Loaded(LoadedCircuit),
}

/// Loads a circuit's constraint system and symbols once, then checks any
/// number of witnesses against them.
///
/// Once loaded the checker is read-only, so `&CircuitChecker` can be shared
/// across threads checking different witnesses.
#[derive(Debug, Clone)]
pub struct CircuitChecker {
    state: State,
    root_component: String,
    negative_threshold: u64,
}

impl Default for CircuitChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitChecker {
    pub fn new() -> Self {
        Self {
            state: State::Unloaded,
            root_component: DEFAULT_ROOT_COMPONENT.to_string(),
            negative_threshold: DEFAULT_NEGATIVE_THRESHOLD,
        }
    }

    pub fn with_config(config: &CheckerConfig) -> Self {
        Self {
            state: State::Unloaded,
            root_component: config.root_component.clone(),
            negative_threshold: config.negative_display_threshold,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, State::Loaded(_))
    }

    /// Decodes the `.r1cs` and `.sym` files. Does nothing if already loaded.
    pub fn load(&mut self, r1cs_path: &Path, sym_path: &Path) -> CheckResult<()> {
        if self.is_loaded() {
            return Ok(());
        }
        let bytes = std::fs::read(r1cs_path).map_err(|e| CheckError::io(r1cs_path, e))?;
        let system = ConstraintSystem::decode(&bytes)?;
        let symbols = SymbolTable::load(sym_path)?;
        info!(
            r1cs = %r1cs_path.display(),
            constraints = system.num_constraints(),
            wires = system.header().n_wires,
            symbols = symbols.len(),
            bn254 = system.field().is_bn254(),
            digest = %hex::encode(system.digest()),
            "loaded circuit"
        );
        self.load_artifacts(system, symbols);
        Ok(())
    }

    /// Installs already-decoded artifacts. Does nothing if already loaded.
    pub fn load_artifacts(&mut self, system: ConstraintSystem, symbols: SymbolTable) {
        if !self.is_loaded() {
            self.state = State::Loaded(LoadedCircuit { system, symbols });
        }
    }

    fn loaded(&self) -> CheckResult<&LoadedCircuit> {
        match &self.state {
            State::Loaded(circuit) => Ok(circuit),
            State::Unloaded => Err(CheckError::NotLoaded),
        }
    }

    pub fn system(&self) -> CheckResult<&ConstraintSystem> {
        Ok(&self.loaded()?.system)
    }

    /// Decodes a fresh witness, checks every constraint, then the expected
    /// outputs if given. Returns the first failure.
    pub fn verify(
        &self,
        witness: WitnessInput<'_>,
        expected: Option<&ExpectedOutput>,
    ) -> CheckResult<()> {
        let circuit = self.loaded()?;
        let field = circuit.system.field();
        let witness = match witness {
            WitnessInput::Path(path) => Witness::load(path, field)?,
            WitnessInput::Bytes(bytes) => {
                Witness::from_bytes(bytes, WitnessFormat::detect(None, bytes), field)?
            }
        };
        self.verify_witness(&witness, expected)
    }

    pub fn verify_witness(
        &self,
        witness: &Witness,
        expected: Option<&ExpectedOutput>,
    ) -> CheckResult<()> {
        let circuit = self.loaded()?;
        let n_wires = circuit.system.header().n_wires as usize;
        if witness.len() != n_wires {
            warn!(
                witness_len = witness.len(),
                n_wires, "witness length differs from the declared wire count"
            );
        }

        ConstraintVerifier::new(&circuit.system)
            .with_symbols(&circuit.symbols)
            .with_negative_threshold(self.negative_threshold)
            .verify(witness)?;

        OutputAsserter::new(&circuit.symbols, witness)
            .with_root(&self.root_component)
            .check(expected)
    }

    /// Checks one test case directory's witness; the expected outputs are
    /// skipped when `expected_output` is given but does not exist.
    pub fn check_test_case(
        &self,
        witness_path: &Path,
        expected_output: Option<&Path>,
    ) -> CheckResult<()> {
        let expected = match expected_output {
            Some(path) if path.is_file() => {
                let expected = ExpectedOutput::load(path)?;
                debug!(path = %path.display(), leaves = expected.leaf_count(), "expected outputs");
                Some(expected)
            }
            Some(path) => {
                warn!(path = %path.display(), "no output file, skipping output check");
                None
            }
            None => None,
        };
        self.verify(WitnessInput::Path(witness_path), expected.as_ref())
    }
}
