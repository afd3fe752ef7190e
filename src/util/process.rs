//! Running external tools.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// A one-shot invocation of an external program with optional stdin.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    stdin: Option<Vec<u8>>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Bytes written to the child's stdin, which is then closed.
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// Run to completion, capturing stdout and stderr.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        // Feed stdin from a separate thread so a child that writes before it
        // has read everything cannot fill the stdout pipe and stall.
        let writer = match (child.stdin.take(), self.stdin.clone()) {
            (Some(mut pipe), Some(data)) => Some(std::thread::spawn(move || pipe.write_all(&data))),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(result) => result.with_context(|| {
                    format!("failed to write to `{}`", self.program.display())
                })?,
                Err(_) => bail!("stdin writer for `{}` panicked", self.program.display()),
            }
        }

        Ok(output)
    }

    /// Run and fail on a non-zero exit, quoting stderr.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            bail!(
                "`{}` exited with {}\n{}",
                self.display_command(),
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "a signal".to_string()),
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }
        Ok(output)
    }

    pub fn display_command(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Locate solc, honoring `SOLC` before searching PATH.
pub fn find_solc() -> Option<PathBuf> {
    std::env::var("SOLC")
        .ok()
        .and_then(|solc| find_executable(&solc))
        .or_else(|| find_executable("solc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_stdin_round_trips_through_cat() {
        let output = ProcessBuilder::new("cat").stdin("{\"language\":\"Solidity\"}").exec().unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "{\"language\":\"Solidity\"}");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_quotes_stderr() {
        let err = ProcessBuilder::new("sh")
            .arg("-c")
            .arg("echo boom >&2; exit 3")
            .exec_and_check()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exited with 3"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_spawn_failure_names_program() {
        let err = ProcessBuilder::new("/nonexistent/solc").exec().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/solc"));
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("solc").arg("--standard-json");
        assert_eq!(pb.display_command(), "solc --standard-json");
    }
}
