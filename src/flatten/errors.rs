//! Flattening error types and diagnostics.

use std::io;
use std::path::{Path, PathBuf};

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Error while resolving or flattening an import graph.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum FlattenError {
    #[error("file not found: {}", .path.display())]
    #[diagnostic(code(jutsu::flatten::entry_not_found))]
    EntryNotFound { path: PathBuf },

    #[error("failed to read `{}`", .path.display())]
    #[diagnostic(code(jutsu::flatten::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot resolve import `{target}` from `{}`", .importer.display())]
    #[diagnostic(
        code(jutsu::flatten::unresolved_import),
        help("import paths are resolved relative to the importing file; run `jutsu add <component>` if it is a component")
    )]
    UnresolvedImport {
        target: String,
        importer: PathBuf,
        #[source_code]
        src: NamedSource<String>,
        #[label("imported here")]
        span: SourceSpan,
        #[source]
        source: io::Error,
    },

    #[error("cyclic import: {}", display_cycle(.cycle))]
    #[diagnostic(
        code(jutsu::flatten::cyclic_import),
        help("break the cycle by moving shared declarations into a separate file")
    )]
    CyclicImport { cycle: Vec<PathBuf> },

    #[error("{message} in `{}`", .path.display())]
    #[diagnostic(code(jutsu::flatten::parse))]
    Parse {
        message: String,
        path: PathBuf,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },
}

impl FlattenError {
    /// Build a parse error pointing at `offset..offset + len` in `text`.
    pub fn parse(
        path: &Path,
        text: &str,
        message: impl Into<String>,
        offset: usize,
        len: usize,
    ) -> Self {
        FlattenError::Parse {
            message: message.into(),
            path: path.to_path_buf(),
            src: NamedSource::new(path.display().to_string(), text.to_string()),
            span: (offset, len).into(),
        }
    }
}

pub fn display_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}
