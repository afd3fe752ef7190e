//! Implementation of `jutsu flatten` and `jutsu build`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::compiler::{compile_entry, CompileError, CompiledContract, Compiler};
use crate::core::JutsuError;
use crate::flatten::{self, FlattenError, FlattenedUnit};
use crate::util::fs::write_string;

/// Options for flattening.
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub entry: PathBuf,
    /// Write the result here instead of returning it only
    pub output: Option<PathBuf>,
}

pub fn require_file(path: &Path) -> Result<(), JutsuError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(JutsuError::NotFound {
            what: format!("File does not exist: {}", path.display()),
        })
    }
}

/// Map flattener failures that users act on to the shared taxonomy,
/// keeping the rest (with their source spans) as they are.
pub(crate) fn classify_flatten(err: FlattenError) -> anyhow::Error {
    match err {
        FlattenError::CyclicImport { ref cycle } => JutsuError::CyclicImport {
            cycle: flatten::errors::display_cycle(cycle),
        }
        .into(),
        other => other.into(),
    }
}

/// Flatten `entry` and optionally write the result.
pub fn flatten_file(opts: &FlattenOptions) -> Result<FlattenedUnit> {
    require_file(&opts.entry)?;
    let unit = flatten::flatten(&opts.entry).map_err(classify_flatten)?;

    if let Some(ref output) = opts.output {
        write_string(output, &unit.render())?;
        tracing::info!("wrote flattened {} to {}", unit.source_name(), output.display());
    }

    Ok(unit)
}

/// Compile `entry` and write its ABI artifact.
pub fn build(compiler: &dyn Compiler, entry: &Path) -> Result<CompiledContract> {
    require_file(entry)?;

    compile_entry(compiler, entry).map_err(|err| {
        let err = match err.downcast::<FlattenError>() {
            Ok(flatten_err) => return classify_flatten(flatten_err),
            Err(err) => err,
        };
        match err.downcast::<CompileError>() {
            Ok(CompileError::Diagnostics { messages }) => JutsuError::Compile {
                diagnostics: messages.join("\n"),
            }
            .into(),
            Ok(other) => other.into(),
            Err(err) => err,
        }
    })
}
