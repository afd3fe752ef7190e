//! Jutsu - a package manager for smart-contract components
//!
//! This crate provides the core library functionality for Jutsu, including
//! import flattening, registry resolution, content transfer and the
//! publish workflow.

pub mod chain;
pub mod compiler;
pub mod core;
pub mod flatten;
pub mod ops;
pub mod registry;
pub mod store;
pub mod transfer;
pub mod util;

/// Test doubles for Jutsu unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides fake registry, store, compiler and chain collaborators plus
/// on-disk project fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{
    address::Address, descriptor::ConfigDescriptor, errors::JutsuError, package_ref::PackageRef,
};

pub use flatten::{flatten, FlattenedUnit};
pub use util::context::GlobalContext;
