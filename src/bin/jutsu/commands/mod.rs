//! Command implementations

pub mod add;
pub mod build;
pub mod completions;
pub mod deploy;
pub mod flatten;
pub mod new;
pub mod publish;
