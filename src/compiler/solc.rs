//! `solc --standard-json` driver.

use std::path::{Path, PathBuf};

use super::{CompileError, CompileInput, Compiler, CompilerOutput};
use crate::util::process::{find_executable, find_solc, ProcessBuilder};

/// Runs a local `solc` binary in standard-JSON mode.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    program: PathBuf,
}

impl SolcCompiler {
    pub fn new(program: impl AsRef<Path>) -> Self {
        SolcCompiler {
            program: program.as_ref().to_path_buf(),
        }
    }

    /// Locate `solc`, honouring an explicit program name or path first.
    pub fn discover(configured: Option<&str>) -> Result<Self, CompileError> {
        let found = match configured {
            Some(name) => find_executable(name).or_else(|| {
                let path = Path::new(name);
                path.is_file().then(|| path.to_path_buf())
            }),
            None => find_solc(),
        };

        found.map(SolcCompiler::new).ok_or_else(|| CompileError::Tool {
            message: format!(
                "could not find the Solidity compiler `{}`; install solc or set [compiler] solc in .jutsu/config.toml",
                configured.unwrap_or("solc")
            ),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Compiler for SolcCompiler {
    fn compile(&self, input: &CompileInput) -> Result<CompilerOutput, CompileError> {
        let request = serde_json::to_vec(input).map_err(|e| CompileError::Tool {
            message: format!("failed to encode compiler input: {}", e),
        })?;

        let process = ProcessBuilder::new(&self.program)
            .arg("--standard-json")
            .stdin(request);
        tracing::debug!("running {}", process.display_command());

        // solc reports source errors in its JSON and still exits 0.
        let output = process.exec_and_check().map_err(|e| CompileError::Tool {
            message: format!("{:#}", e),
        })?;

        serde_json::from_slice(&output.stdout).map_err(|e| CompileError::Tool {
            message: format!("unreadable output from `{}`: {}", self.program.display(), e),
        })
    }
}
