//! High-level operations.
//!
//! This module contains the implementation of Jutsu commands. Each
//! operation takes its collaborators as trait objects so the binary can
//! wire real clients and tests can wire fakes.

pub mod jutsu_add;
pub mod jutsu_build;
pub mod jutsu_deploy;
pub mod jutsu_new;
pub mod jutsu_publish;

pub use jutsu_add::{add, install_dir, AddOptions, AddResult};
pub use jutsu_build::{build, flatten_file, FlattenOptions};
pub use jutsu_deploy::{deploy, DeployOptions, DeployReport};
pub use jutsu_new::{contract_name, new_project, NewOptions, NewProject};
pub use jutsu_publish::{publish, publish_with, PublishOptions, PublishReport, PublishStep};
