//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use jutsu::util::config::Config;
use jutsu::util::context::env_keys;
use jutsu::util::shell::ColorChoice;

/// Jutsu - a package manager for smart-contract components
#[derive(Parser)]
#[command(name = "jutsu")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_name = "WHEN")]
    pub color: ColorChoice,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that take precedence over the config files.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Registry gateway URL
    #[arg(long, env = "JUTSU_REGISTRY_URL", global = true, hide = true)]
    pub registry_url: Option<String>,

    /// Use the local content store at this path
    #[arg(long, env = "JUTSU_STORE_PATH", global = true, hide = true)]
    pub store_path: Option<PathBuf>,

    /// Path to solc
    #[arg(long, env = "JUTSU_SOLC", global = true, hide = true)]
    pub solc: Option<String>,
}

impl Overrides {
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();
        config.registry.url = self.registry_url.clone();
        config.store.path = self.store_path.clone();
        config.compiler.solc = self.solc.clone();
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new component project
    New(NewArgs),

    /// Install a component into src/<name>
    Add(AddArgs),

    /// Publish the current project to the registry
    Publish(PublishArgs),

    /// Compile a contract and deploy it
    Deploy(DeployArgs),

    /// Inline a contract's imports into one source
    Flatten(FlattenArgs),

    /// Compile a contract and write its ABI
    Build(BuildArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Project name
    pub name: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Component to install, as `name` or `name@version`
    #[arg(value_name = "COMPONENT")]
    pub component: String,
}

#[derive(Args)]
pub struct PublishArgs {}

#[derive(Args)]
pub struct DeployArgs {
    /// Contract source file
    pub file: PathBuf,

    /// Environment variable holding the RPC URL
    #[arg(short, long, default_value = env_keys::CUSTOM_RPC)]
    pub network: String,

    /// ABI-encoded constructor arguments
    #[arg(short, long, num_args = 1..)]
    pub arguments: Vec<String>,
}

#[derive(Args)]
pub struct FlattenArgs {
    /// Contract source file
    pub file: PathBuf,

    /// Write the flattened source here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Contract source file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}
