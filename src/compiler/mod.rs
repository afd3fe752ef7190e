//! Compilation adapter.
//!
//! Hands a flattened unit to a [`Compiler`] as a standard-JSON source map,
//! picks the entry contract's artifact out of the output and persists its
//! ABI next to the entry file under `abis/`.

pub mod solc;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::flatten::{self, FlattenedUnit};

pub use solc::SolcCompiler;

/// Directory, next to the entry file, that receives ABI artifacts.
pub const ABI_DIR: &str = "abis";

/// Compiler failures.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler reported errors; messages are verbatim.
    #[error("{}", .messages.join("\n"))]
    Diagnostics { messages: Vec<String> },

    #[error("`{source_name}` declares no contract, interface or library")]
    NoContract { source_name: String },

    #[error("compiler output has no artifact for `{name}` in `{source_name}`")]
    MissingArtifact { name: String, source_name: String },

    /// The compiler itself could not be run or returned garbage.
    #[error("{message}")]
    Tool { message: String },
}

/// A standard-JSON compiler request.
#[derive(Debug, Clone, Serialize)]
pub struct CompileInput {
    pub language: String,
    pub sources: BTreeMap<String, SourceContent>,
    pub settings: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceContent {
    pub content: String,
}

impl CompileInput {
    /// A single-document request selecting every output.
    pub fn single(source_name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            source_name.into(),
            SourceContent {
                content: content.into(),
            },
        );
        CompileInput {
            language: "Solidity".to_string(),
            sources,
            settings: json!({
                "outputSelection": { "*": { "*": ["*"] } }
            }),
        }
    }
}

/// A standard-JSON compiler response, reduced to what we read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompilerOutput {
    pub errors: Vec<CompilerMessage>,
    pub contracts: BTreeMap<String, BTreeMap<String, ContractOutput>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerMessage {
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub formatted_message: Option<String>,
}

impl CompilerMessage {
    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }

    /// The human-readable form, preferring the compiler's own formatting.
    pub fn text(&self) -> &str {
        self.formatted_message.as_deref().unwrap_or(&self.message)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractOutput {
    pub abi: Value,
    pub evm: EvmOutput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EvmOutput {
    pub bytecode: Bytecode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Bytecode {
    pub object: String,
}

/// A contract compiler.
pub trait Compiler {
    /// Compile `input`. Source-level problems come back inside the output;
    /// only failures to run the compiler are errors here.
    fn compile(&self, input: &CompileInput) -> Result<CompilerOutput, CompileError>;
}

/// Bytecode and ABI of the entry contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    /// Hex bytecode without a `0x` prefix.
    pub bytecode: String,
    pub abi: Value,
}

/// A compiled entry file and where its ABI was written.
#[derive(Debug, Clone)]
pub struct CompiledContract {
    pub artifact: Artifact,
    pub abi_path: PathBuf,
}

/// Compile a flattened unit and select its primary contract.
pub fn compile_unit(compiler: &dyn Compiler, unit: &FlattenedUnit) -> Result<Artifact, CompileError> {
    let name = unit
        .primary_type()
        .ok_or_else(|| CompileError::NoContract {
            source_name: unit.source_name().to_string(),
        })?
        .to_string();

    let input = CompileInput::single(unit.source_name(), unit.render());
    let mut output = compiler.compile(&input)?;

    let (errors, warnings): (Vec<_>, Vec<_>) =
        output.errors.iter().partition(|m| m.is_error());
    for warning in warnings {
        tracing::warn!("{}", warning.text().trim_end());
    }
    if !errors.is_empty() {
        return Err(CompileError::Diagnostics {
            messages: errors.iter().map(|m| m.text().to_string()).collect(),
        });
    }

    let contract = output
        .contracts
        .get_mut(unit.source_name())
        .and_then(|contracts| contracts.remove(&name))
        .ok_or_else(|| CompileError::MissingArtifact {
            name: name.clone(),
            source_name: unit.source_name().to_string(),
        })?;

    let bytecode = contract.evm.bytecode.object;
    let bytecode = bytecode.strip_prefix("0x").unwrap_or(&bytecode).to_string();

    Ok(Artifact {
        name,
        bytecode,
        abi: contract.abi,
    })
}

/// Flatten, compile and persist the ABI for the contract at `entry`.
pub fn compile_entry(compiler: &dyn Compiler, entry: &Path) -> Result<CompiledContract> {
    let unit = flatten::flatten(entry)?;
    tracing::info!(
        "compiling {} ({} source bodies)",
        unit.source_name(),
        unit.bodies().len()
    );

    let artifact = compile_unit(compiler, &unit)?;
    let abi_path = write_abi(entry, &artifact.abi)?;

    Ok(CompiledContract { artifact, abi_path })
}

/// Path of the ABI artifact for an entry file: `<dir>/abis/<stem>.json`.
pub fn abi_path(entry: &Path) -> PathBuf {
    let dir = entry.parent().unwrap_or_else(|| Path::new("."));
    let stem = entry
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "contract".to_string());
    dir.join(ABI_DIR).join(format!("{}.json", stem))
}

/// Write `abi` as tab-indented JSON next to `entry`.
pub fn write_abi(entry: &Path, abi: &Value) -> Result<PathBuf> {
    let path = abi_path(entry);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    abi.serialize(&mut ser)?;
    buf.write_all(b"\n")?;

    std::fs::write(&path, buf)
        .with_context(|| format!("failed to write ABI: {}", path.display()))?;
    tracing::debug!("wrote ABI to {}", path.display());

    Ok(path)
}
