//! Import graph flattening.
//!
//! Turns a multi-file contract project into one compilation unit:
//!
//! 1. resolve the entry file's import closure ([`ResolvedGraph`]),
//! 2. order the files so dependencies come before dependents,
//! 3. drop bodies that are textually identical to one already emitted,
//! 4. prepend a license/pragma header taken from the entry file.

pub mod errors;
pub mod graph;
pub mod lexer;

use std::collections::HashSet;
use std::path::Path;

pub use errors::FlattenError;
pub use graph::ResolvedGraph;

/// License used when the entry file declares none.
pub const DEFAULT_LICENSE: &str = "UNLICENSED";

/// The synthesized first lines of a flattened unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub license: Option<String>,
    pub pragma: Option<String>,
}

impl Header {
    /// Render the SPDX line and, when known, the pragma line.
    pub fn render(&self) -> String {
        let mut out = format!(
            "// SPDX-License-Identifier: {}\n",
            self.license.as_deref().unwrap_or(DEFAULT_LICENSE)
        );
        if let Some(ref pragma) = self.pragma {
            out.push_str(&format!("pragma solidity {};\n", pragma));
        }
        out
    }
}

/// A single-document compilation unit.
#[derive(Debug, Clone)]
pub struct FlattenedUnit {
    source_name: String,
    primary_type: Option<String>,
    header: Header,
    bodies: Vec<String>,
}

impl FlattenedUnit {
    /// File name the unit is compiled under (the entry's file name).
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The entry file's primary type name.
    pub fn primary_type(&self) -> Option<&str> {
        self.primary_type.as_deref()
    }

    /// The header taken from the entry file.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Unique bodies, dependencies first.
    pub fn bodies(&self) -> &[String] {
        &self.bodies
    }

    /// The full source text: header followed by every body.
    pub fn render(&self) -> String {
        let mut out = self.header.render();
        for body in &self.bodies {
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }
        out
    }
}

/// Flatten the contract at `entry` and its transitive imports.
pub fn flatten(entry: &Path) -> Result<FlattenedUnit, FlattenError> {
    let graph = ResolvedGraph::resolve(entry)?;
    flatten_graph(&graph)
}

/// Flatten an already resolved graph.
pub fn flatten_graph(graph: &ResolvedGraph) -> Result<FlattenedUnit, FlattenError> {
    let mut seen = HashSet::new();
    let mut bodies = Vec::new();

    for unit in graph.topological_order()? {
        let body = unit.body();
        if body.is_empty() {
            continue;
        }
        if seen.insert(body) {
            bodies.push(body.to_string());
        } else {
            tracing::debug!("skipping duplicate body from {}", unit.path().display());
        }
    }

    let entry = graph.entry();
    let source_name = entry
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(
        "flattened {} into {} bodies from {} files",
        source_name,
        bodies.len(),
        graph.len()
    );

    Ok(FlattenedUnit {
        source_name,
        primary_type: entry.primary_type().map(str::to_string),
        header: Header {
            license: entry.license().map(str::to_string),
            pragma: entry.pragma().map(str::to_string),
        },
        bodies,
    })
}
