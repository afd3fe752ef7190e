//! `jutsu deploy` command

use anyhow::Result;

use crate::cli::DeployArgs;
use crate::GlobalOptions;
use jutsu::ops::jutsu_build::require_file;
use jutsu::ops::jutsu_deploy::{deploy, DeployOptions};
use jutsu::util::shell::Status;

pub fn execute(args: DeployArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    let ctx = global_opts.context()?;
    let entry = ctx.resolve_path(&args.file);
    require_file(&entry)?;
    let deployer = ctx.env().wallet_address()?;
    let chain = ctx.chain(&args.network)?;
    let compiler = ctx.compiler()?;

    let span = shell.span(Status::Deploying, args.file.display());
    let report = deploy(
        &compiler,
        &chain,
        &DeployOptions {
            entry,
            network: args.network,
            args: args.arguments,
            deployer: Some(deployer),
        },
    )?;

    shell.note(format!("ABI written to {}", report.abi_path.display()));
    shell.note(format!("transaction {}", report.transaction_hash));
    if let Some(gas) = report.gas_used {
        shell.note(format!("gas used {}", gas));
    }
    span.finish_with_message(
        Status::Deployed,
        format!("{} at {}", report.contract, report.contract_address),
    );

    Ok(())
}
