//! Discovery of test-case directories (`input.json` + witness + optional
//! `output.json`) under a data directory.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::config::WitnessType;
use super::errors::{CheckError, CheckResult};

pub const INPUT_FILE_NAME: &str = "input.json";
pub const OUTPUT_FILE_NAME: &str = "output.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub dir: PathBuf,
    pub witness: PathBuf,
    /// Expected outputs; may not exist on disk.
    pub expected_output: PathBuf,
}

impl TestCase {
    pub fn new(dir: &Path, witness_type: WitnessType) -> Self {
        Self {
            dir: dir.to_path_buf(),
            witness: dir.join(witness_type.file_name()),
            expected_output: dir.join(OUTPUT_FILE_NAME),
        }
    }
}

/// Every directory under `data_dir` holding an `input.json`, sorted by path.
pub fn discover(data_dir: &Path, witness_type: WitnessType) -> CheckResult<Vec<TestCase>> {
    let mut cases = Vec::new();
    for entry in WalkDir::new(data_dir).follow_links(true) {
        let entry = entry.map_err(|e| CheckError::io(data_dir, e.into()))?;
        if entry.file_type().is_file() && entry.file_name() == INPUT_FILE_NAME {
            if let Some(dir) = entry.path().parent() {
                cases.push(TestCase::new(dir, witness_type));
            }
        }
    }
    cases.sort_by(|a, b| a.dir.cmp(&b.dir));
    debug!(data_dir = %data_dir.display(), cases = cases.len(), "discovered test cases");
    Ok(cases)
}
