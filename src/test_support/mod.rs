//! Test doubles for the collaborators Jutsu talks to.
//!
//! Every fake records what it was asked to do so tests can assert on the
//! calls that were (or were not) made.
//!
//! # Example
//!
//! ```rust,ignore
//! use jutsu::test_support::{FakeRegistry, MemoryStore};
//!
//! #[test]
//! fn test_example() {
//!     let store = MemoryStore::new();
//!     let root = store.tree(vec![store.file("A.sol", b"contract A {}")]);
//!
//!     let registry = FakeRegistry::new();
//!     registry.register("A", "1.0.0", root.as_str());
//!
//!     // Hand `&registry` and `&store` to the operation under test...
//! }
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::chain::{ChainClient, ChainError, DeployReceipt};
use crate::compiler::{
    Bytecode, CompileError, CompileInput, Compiler, CompilerMessage, CompilerOutput,
    ContractOutput, EvmOutput,
};
use crate::core::{Address, ContentAddress};
use crate::registry::{
    functions, AbiParam, AbiRequest, AbiResponse, AbiValue, RegistryClient, RegistryError,
    TxReceipt,
};
use crate::store::{ContentStore, EntryKind, StoreEntry, StoreError};
use crate::util::hash::sha256_bytes;

// ============================================================================
// Compiler
// ============================================================================

/// A compiler returning a canned response for every source it is given.
#[derive(Debug)]
pub struct FakeCompiler {
    contract: Option<(String, String, Value)>,
    error: Option<String>,
    inputs: Mutex<Vec<CompileInput>>,
}

impl FakeCompiler {
    /// Report contract `name` with `bytecode` and `abi` in every source.
    pub fn succeeding(name: &str, bytecode: &str, abi: Value) -> Self {
        FakeCompiler {
            contract: Some((name.to_string(), bytecode.to_string(), abi)),
            error: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Report a single error diagnostic.
    pub fn failing(message: &str) -> Self {
        FakeCompiler {
            contract: None,
            error: Some(message.to_string()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// The most recent input the compiler saw.
    pub fn last_input(&self) -> Option<CompileInput> {
        self.inputs.lock().unwrap().last().cloned()
    }
}

impl Compiler for FakeCompiler {
    fn compile(&self, input: &CompileInput) -> Result<CompilerOutput, CompileError> {
        self.inputs.lock().unwrap().push(input.clone());

        let mut output = CompilerOutput::default();
        if let Some(ref message) = self.error {
            output.errors.push(CompilerMessage {
                severity: "error".to_string(),
                message: message.clone(),
                formatted_message: None,
            });
            return Ok(output);
        }

        if let Some((ref name, ref bytecode, ref abi)) = self.contract {
            for source_name in input.sources.keys() {
                let mut contracts = BTreeMap::new();
                contracts.insert(
                    name.clone(),
                    ContractOutput {
                        abi: abi.clone(),
                        evm: EvmOutput {
                            bytecode: Bytecode {
                                object: bytecode.clone(),
                            },
                        },
                    },
                );
                output.contracts.insert(source_name.clone(), contracts);
            }
        }
        Ok(output)
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug)]
struct RegistryState {
    /// name -> versions in registration order
    projects: BTreeMap<String, Vec<(String, String)>>,
    published: Vec<(String, String, String)>,
    balance: u128,
    cost: u128,
    precheck_rejection: Option<String>,
    transport_failure: Option<String>,
    last_estimate: Option<AbiRequest>,
    calls: usize,
}

/// An in-memory registry contract.
///
/// `getProject` answers with the most recently registered version and
/// `publishProject` registers what it is given. Unknown names revert.
#[derive(Debug)]
pub struct FakeRegistry {
    state: Mutex<RegistryState>,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRegistry {
    /// An empty registry with a well funded wallet.
    pub fn new() -> Self {
        FakeRegistry {
            state: Mutex::new(RegistryState {
                projects: BTreeMap::new(),
                published: Vec::new(),
                balance: 1_000_000_000_000_000_000,
                cost: 21_000,
                precheck_rejection: None,
                transport_failure: None,
                last_estimate: None,
                calls: 0,
            }),
        }
    }

    /// Owner reported for every project.
    pub fn owner() -> Address {
        "0x00000000000000000000000000000000000000aa"
            .parse()
            .unwrap()
    }

    /// Register `name@version` at `cid`.
    pub fn register(&self, name: &str, version: &str, cid: &str) {
        self.state
            .lock()
            .unwrap()
            .projects
            .entry(name.to_string())
            .or_default()
            .push((version.to_string(), cid.to_string()));
    }

    /// Fail every call with a transport error.
    pub fn fail_transport(&self, message: &str) {
        self.state.lock().unwrap().transport_failure = Some(message.to_string());
    }

    pub fn set_balance(&self, balance: u128) {
        self.state.lock().unwrap().balance = balance;
    }

    pub fn set_cost(&self, cost: u128) {
        self.state.lock().unwrap().cost = cost;
    }

    /// Make `publishCheck` answer `(false, reason)`.
    pub fn reject_precheck(&self, reason: &str) {
        self.state.lock().unwrap().precheck_rejection = Some(reason.to_string());
    }

    /// `(name, version, cid)` of every `publishProject` post.
    pub fn published(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().published.clone()
    }

    /// Number of calls of any kind.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn last_estimate(&self) -> Option<AbiRequest> {
        self.state.lock().unwrap().last_estimate.clone()
    }

    fn enter(&self) -> Result<std::sync::MutexGuard<'_, RegistryState>, RegistryError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if let Some(ref message) = state.transport_failure {
            return Err(RegistryError::Transport {
                message: message.clone(),
            });
        }
        Ok(state)
    }
}

fn string_arg(request: &AbiRequest, name: &str) -> String {
    request
        .params
        .iter()
        .zip(&request.args)
        .find(|(param, _)| param.name == name)
        .and_then(|(_, value)| match value {
            AbiValue::String(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn reverted(request: &AbiRequest, reason: &str) -> RegistryError {
    RegistryError::Reverted {
        function: request.function.clone(),
        reason: reason.to_string(),
    }
}

fn respond(outputs: &[AbiParam], values: Vec<AbiValue>) -> AbiResponse {
    AbiResponse::from_values(outputs.iter().cloned().zip(values).collect())
}

impl RegistryClient for FakeRegistry {
    fn get(&self, request: &AbiRequest, outputs: &[AbiParam]) -> Result<AbiResponse, RegistryError> {
        let state = self.enter()?;
        let name = string_arg(request, "name");

        match request.function.as_str() {
            functions::GET_CID_BY_VERSION => {
                let version = string_arg(request, "version");
                let versions = state
                    .projects
                    .get(&name)
                    .ok_or_else(|| reverted(request, "project not found"))?;
                let cid = versions
                    .iter()
                    .rev()
                    .find(|(v, _)| *v == version)
                    .map(|(_, cid)| cid.clone())
                    .unwrap_or_default();
                Ok(respond(outputs, vec![AbiValue::String(cid)]))
            }
            functions::GET_PROJECT => {
                let (index, versions) = state
                    .projects
                    .iter()
                    .enumerate()
                    .find(|(_, (n, _))| **n == name)
                    .map(|(i, (_, v))| (i, v))
                    .ok_or_else(|| reverted(request, "project not found"))?;
                let (version, cid) = versions
                    .last()
                    .cloned()
                    .ok_or_else(|| reverted(request, "project not found"))?;
                Ok(respond(
                    outputs,
                    vec![
                        AbiValue::Uint((index + 1).to_string()),
                        AbiValue::String(name),
                        AbiValue::Address(Self::owner()),
                        AbiValue::String(version),
                        AbiValue::String(cid),
                    ],
                ))
            }
            functions::PUBLISH_CHECK => {
                let values = match state.precheck_rejection {
                    Some(ref reason) => vec![AbiValue::Bool(false), AbiValue::String(reason.clone())],
                    None => vec![AbiValue::Bool(true), AbiValue::String(String::new())],
                };
                Ok(respond(outputs, values))
            }
            other => Err(reverted(request, &format!("unknown function {}", other))),
        }
    }

    fn post(&self, request: &AbiRequest, _from: &Address) -> Result<TxReceipt, RegistryError> {
        let mut state = self.enter()?;
        if request.function != functions::PUBLISH_PROJECT {
            return Err(reverted(request, "unknown function"));
        }

        let name = string_arg(request, "name");
        let version = string_arg(request, "version");
        let cid = string_arg(request, "ipfs");
        state
            .projects
            .entry(name.clone())
            .or_default()
            .push((version.clone(), cid.clone()));
        state.published.push((name, version, cid));

        let block = state.published.len() as u64;
        Ok(TxReceipt {
            transaction_hash: format!("0x{:064x}", block),
            block_number: Some(block),
        })
    }

    fn estimate_post(&self, request: &AbiRequest, _from: &Address) -> Result<u128, RegistryError> {
        let mut state = self.enter()?;
        state.last_estimate = Some(request.clone());
        Ok(state.cost)
    }

    fn balance(&self, _address: &Address) -> Result<u128, RegistryError> {
        let state = self.enter()?;
        Ok(state.balance)
    }
}

// ============================================================================
// Content stores
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    blobs: HashMap<ContentAddress, Vec<u8>>,
    trees: HashMap<ContentAddress, Vec<StoreEntry>>,
}

/// An in-memory content store. Trees are assembled by hand with
/// [`MemoryStore::file`] and [`MemoryStore::tree`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    next_tree: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` and return a file entry named `name` pointing at it.
    pub fn file(&self, name: &str, bytes: &[u8]) -> StoreEntry {
        let address = ContentAddress::new(format!("blob-{}", sha256_bytes(bytes)));
        self.state
            .lock()
            .unwrap()
            .blobs
            .insert(address.clone(), bytes.to_vec());
        StoreEntry {
            name: name.to_string(),
            kind: EntryKind::File,
            address,
        }
    }

    /// Store a directory holding `entries`.
    pub fn tree(&self, entries: Vec<StoreEntry>) -> ContentAddress {
        let n = self.next_tree.fetch_add(1, Ordering::SeqCst);
        let address = ContentAddress::new(format!("tree-{}", n));
        self.state
            .lock()
            .unwrap()
            .trees
            .insert(address.clone(), entries);
        address
    }
}

impl ContentStore for MemoryStore {
    fn upload(&self, _dir: &Path, _name: &str) -> Result<ContentAddress, StoreError> {
        Err(StoreError::Rejected {
            message: "memory store is read-only".to_string(),
        })
    }

    fn list(&self, address: &ContentAddress) -> Result<Vec<StoreEntry>, StoreError> {
        let state = self.state.lock().unwrap();
        match state.trees.get(address) {
            Some(entries) => Ok(entries.clone()),
            None if state.blobs.contains_key(address) => Err(StoreError::NotADirectory {
                address: address.clone(),
            }),
            None => Err(StoreError::Missing {
                address: address.clone(),
            }),
        }
    }

    fn read(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        self.state
            .lock()
            .unwrap()
            .blobs
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::Missing {
                address: address.clone(),
            })
    }
}

/// Wraps a store and records uploads.
#[derive(Debug)]
pub struct CountingStore<S> {
    inner: S,
    uploads: Mutex<Vec<PathBuf>>,
}

impl<S: ContentStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        CountingStore {
            inner,
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Number of uploads made through this store.
    pub fn uploads(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    /// Directory handed to the most recent upload.
    pub fn last_upload_dir(&self) -> Option<PathBuf> {
        self.uploads.lock().unwrap().last().cloned()
    }
}

impl<S: ContentStore> ContentStore for CountingStore<S> {
    fn ensure_ready(&self) -> Result<(), StoreError> {
        self.inner.ensure_ready()
    }

    fn upload(&self, dir: &Path, name: &str) -> Result<ContentAddress, StoreError> {
        self.uploads.lock().unwrap().push(dir.to_path_buf());
        self.inner.upload(dir, name)
    }

    fn list(&self, address: &ContentAddress) -> Result<Vec<StoreEntry>, StoreError> {
        self.inner.list(address)
    }

    fn read(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        self.inner.read(address)
    }
}

// ============================================================================
// Chain
// ============================================================================

/// A node that mines every deployment immediately.
#[derive(Debug, Default)]
pub struct FakeChain {
    deployments: Mutex<Vec<(String, Address)>>,
    insufficient: Option<(u128, u128)>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse deployments for lack of funds.
    pub fn insufficient(balance: u128, required: u128) -> Self {
        FakeChain {
            deployments: Mutex::new(Vec::new()),
            insufficient: Some((balance, required)),
        }
    }

    /// `(data, from)` of every deployment sent.
    pub fn deployments(&self) -> Vec<(String, Address)> {
        self.deployments.lock().unwrap().clone()
    }

    /// Address every deployment lands at.
    pub fn contract_address() -> Address {
        "0x00000000000000000000000000000000000000cc"
            .parse()
            .unwrap()
    }
}

impl ChainClient for FakeChain {
    fn deploy(&self, data: &str, from: &Address) -> Result<DeployReceipt, ChainError> {
        if let Some((balance, required)) = self.insufficient {
            return Err(ChainError::InsufficientFunds { balance, required });
        }

        let mut deployments = self.deployments.lock().unwrap();
        deployments.push((data.to_string(), from.clone()));
        Ok(DeployReceipt {
            transaction_hash: format!("0x{:064x}", deployments.len()),
            contract_address: Self::contract_address(),
            gas_used: Some(21_000),
        })
    }
}
