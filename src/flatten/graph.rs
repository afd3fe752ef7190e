//! The resolved import graph.
//!
//! Nodes are canonical file paths, edges point from an importing file to the
//! file it imports. The graph is rebuilt on every compile.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use miette::NamedSource;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::FlattenError;
use crate::core::source_unit::{ImportTarget, SourceUnit};

/// Import graph rooted at an entry file.
#[derive(Debug)]
pub struct ResolvedGraph {
    graph: DiGraph<PathBuf, ()>,
    nodes: HashMap<PathBuf, NodeIndex>,
    units: HashMap<PathBuf, SourceUnit>,
    entry: PathBuf,
}

impl ResolvedGraph {
    /// Resolve the full import closure of `entry`.
    ///
    /// Files reached along several paths are parsed once. A file that
    /// imports one of its own importers is a [`FlattenError::CyclicImport`].
    pub fn resolve(entry: &Path) -> Result<Self, FlattenError> {
        if !entry.is_file() {
            return Err(FlattenError::EntryNotFound {
                path: entry.to_path_buf(),
            });
        }
        let entry = entry.canonicalize().map_err(|source| FlattenError::Io {
            path: entry.to_path_buf(),
            source,
        })?;

        let mut resolved = ResolvedGraph {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            units: HashMap::new(),
            entry: entry.clone(),
        };
        let mut stack = Vec::new();
        resolved.visit(entry, &mut stack)?;

        tracing::debug!("resolved {} source files", resolved.units.len());
        Ok(resolved)
    }

    fn visit(&mut self, path: PathBuf, stack: &mut Vec<PathBuf>) -> Result<NodeIndex, FlattenError> {
        if let Some(pos) = stack.iter().position(|p| p == &path) {
            let mut cycle = stack[pos..].to_vec();
            cycle.push(path);
            return Err(FlattenError::CyclicImport { cycle });
        }
        if let Some(&node) = self.nodes.get(&path) {
            return Ok(node);
        }

        let unit = SourceUnit::load(&path)?;
        tracing::debug!("parsed {} ({} imports)", path.display(), unit.imports().len());

        let imports = unit.imports().to_vec();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let node = self.graph.add_node(path.clone());
        self.nodes.insert(path.clone(), node);
        self.units.insert(path.clone(), unit);

        stack.push(path.clone());
        for import in &imports {
            let target = self.resolve_import(&path, &dir, import)?;
            let child = self.visit(target, stack)?;
            if !self.graph.contains_edge(node, child) {
                self.graph.add_edge(node, child, ());
            }
        }
        stack.pop();

        Ok(node)
    }

    fn resolve_import(
        &self,
        importer: &Path,
        dir: &Path,
        import: &ImportTarget,
    ) -> Result<PathBuf, FlattenError> {
        dir.join(&import.path).canonicalize().map_err(|source| {
            let text = self
                .units
                .get(importer)
                .map(|u| u.text().to_string())
                .unwrap_or_default();
            FlattenError::UnresolvedImport {
                target: import.path.clone(),
                importer: importer.to_path_buf(),
                src: NamedSource::new(importer.display().to_string(), text),
                span: (import.span.start, import.span.len()).into(),
                source,
            }
        })
    }

    /// The entry file's unit.
    pub fn entry(&self) -> &SourceUnit {
        &self.units[&self.entry]
    }

    /// Look up a unit by canonical path.
    pub fn get(&self, path: &Path) -> Option<&SourceUnit> {
        self.units.get(path)
    }

    /// Number of distinct files in the graph.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Canonical paths directly imported by `path`, sorted.
    pub fn imports_of(&self, path: &Path) -> Vec<&Path> {
        let mut deps: Vec<&Path> = match self.nodes.get(path) {
            Some(&node) => self
                .graph
                .neighbors(node)
                .map(|n| self.graph[n].as_path())
                .collect(),
            None => Vec::new(),
        };
        deps.sort();
        deps
    }

    /// Units with every dependency before its dependents.
    ///
    /// Among files whose dependencies are all emitted, the one with the
    /// smallest canonical path goes first, so the order is deterministic.
    pub fn topological_order(&self) -> Result<Vec<&SourceUnit>, FlattenError> {
        let mut pending: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|n| (n, self.graph.neighbors(n).count()))
            .collect();

        let mut ready: BTreeMap<&Path, NodeIndex> = pending
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&n, _)| (self.graph[n].as_path(), n))
            .collect();

        let mut order = Vec::with_capacity(self.units.len());
        while let Some((path, node)) = ready.pop_first() {
            order.push(&self.units[path]);
            for importer in self.graph.neighbors_directed(node, Direction::Incoming) {
                if let Some(count) = pending.get_mut(&importer) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(self.graph[importer].as_path(), importer);
                    }
                }
            }
        }

        if order.len() != self.units.len() {
            let mut cycle: Vec<PathBuf> = pending
                .iter()
                .filter(|(_, &count)| count > 0)
                .map(|(&n, _)| self.graph[n].clone())
                .collect();
            cycle.sort();
            return Err(FlattenError::CyclicImport { cycle });
        }

        Ok(order)
    }
}
