use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::constraints::DEFAULT_NEGATIVE_THRESHOLD;
use super::errors::{CheckError, CheckResult};
use super::outputs::DEFAULT_ROOT_COMPONENT;

/// Name of the optional per-circuit configuration file.
pub const CONFIG_FILE_NAME: &str = "checker.toml";

/// Which witness file each test case provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WitnessType {
    /// `witness.wtns`
    Bin,
    /// `witness.json`
    #[default]
    Text,
}

impl WitnessType {
    pub fn file_name(self) -> &'static str {
        match self {
            WitnessType::Bin => "witness.wtns",
            WitnessType::Text => "witness.json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    pub r1cs_file: PathBuf,
    pub sym_file: PathBuf,
    pub root_component: String,
    pub negative_display_threshold: u64,
    pub witness_type: WitnessType,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            r1cs_file: PathBuf::from("circuit.r1cs"),
            sym_file: PathBuf::from("circuit.sym"),
            root_component: DEFAULT_ROOT_COMPONENT.to_string(),
            negative_display_threshold: DEFAULT_NEGATIVE_THRESHOLD,
            witness_type: WitnessType::default(),
        }
    }
}

impl CheckerConfig {
    pub fn from_toml(text: &str) -> CheckResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CheckError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CheckResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CheckError::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Reads `checker.toml` from `circuit_dir` if present, else defaults.
    pub fn for_circuit_dir(circuit_dir: &Path) -> CheckResult<Self> {
        let path = circuit_dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            debug!(path = %path.display(), "using circuit config");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> CheckResult<()> {
        if self.root_component.is_empty() {
            return Err(CheckError::invalid_config("root_component must not be empty"));
        }
        Ok(())
    }

    /// Artifact paths, resolved against `circuit_dir` when relative.
    pub fn artifact_paths(&self, circuit_dir: &Path) -> (PathBuf, PathBuf) {
        (circuit_dir.join(&self.r1cs_file), circuit_dir.join(&self.sym_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_circom_layout() {
        let config = CheckerConfig::default();
        let (r1cs, sym) = config.artifact_paths(Path::new("circuits/adder"));
        assert_eq!(r1cs, Path::new("circuits/adder/circuit.r1cs"));
        assert_eq!(sym, Path::new("circuits/adder/circuit.sym"));
        assert_eq!(config.root_component, "main");
        assert_eq!(config.negative_display_threshold, 200);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CheckerConfig::from_toml("witness_type = \"bin\"\nroot_component = \"top\"\n")
            .unwrap();
        assert_eq!(config.witness_type, WitnessType::Bin);
        assert_eq!(config.witness_type.file_name(), "witness.wtns");
        assert_eq!(config.root_component, "top");
        assert_eq!(config.sym_file, PathBuf::from("circuit.sym"));
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(matches!(
            CheckerConfig::from_toml("witness_type = \"xml\""),
            Err(CheckError::InvalidConfig(_))
        ));
        assert!(CheckerConfig::from_toml("unknown = 1").is_err());
        assert!(CheckerConfig::from_toml("root_component = \"\"").is_err());
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            CheckerConfig::for_circuit_dir(dir.path()).unwrap(),
            CheckerConfig::default()
        );
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "negative_display_threshold = 5\n")
            .unwrap();
        let config = CheckerConfig::for_circuit_dir(dir.path()).unwrap();
        assert_eq!(config.negative_display_threshold, 5);
    }
}
