//! Core data structures for Jutsu.
//!
//! This module contains the foundational types used throughout Jutsu:
//! - Parsed contract sources (SourceUnit)
//! - Package references, content addresses and registry records
//! - The project descriptor (config.json)
//! - The error taxonomy

pub mod address;
pub mod descriptor;
pub mod errors;
pub mod package_ref;
pub mod source_unit;

pub use address::Address;
pub use descriptor::{ConfigDescriptor, DESCRIPTOR_NAME};
pub use errors::JutsuError;
pub use package_ref::{ContentAddress, PackageRef, RegistryRecord};
pub use source_unit::{ImportTarget, SourceUnit};
