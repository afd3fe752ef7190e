//! `jutsu publish` command

use anyhow::Result;

use crate::cli::PublishArgs;
use crate::GlobalOptions;
use jutsu::ops::jutsu_publish::{publish_with, PublishOptions, PublishStep};
use jutsu::util::shell::Status;

/// Status line shown while a step runs.
fn step_message(step: PublishStep) -> Option<(Status, &'static str)> {
    match step {
        PublishStep::Validate => None,
        PublishStep::Precheck => Some((Status::Checking, "name and version with the registry")),
        PublishStep::Estimate => Some((Status::Checking, "wallet balance")),
        PublishStep::Transfer => Some((Status::Uploading, "project files")),
        PublishStep::Commit => Some((Status::Publishing, "registry entry")),
        PublishStep::Finalize => None,
    }
}

pub fn execute(_args: PublishArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    let ctx = global_opts.context()?;
    let project_root = ctx.project_root()?.to_path_buf();
    let publisher = Some(ctx.env().wallet_address()?);
    let registry = ctx.registry()?;
    let store = ctx.store()?;

    let span = shell.span(Status::Publishing, project_root.display());
    let mut spinner = None;
    let report = publish_with(
        registry.as_ref(),
        store.as_ref(),
        &PublishOptions {
            project_root,
            publisher,
        },
        &mut |step| {
            // Dropping the previous spinner clears it.
            spinner = step_message(step).map(|(status, msg)| shell.spinner(status, msg));
        },
    );
    drop(spinner);
    let report = report?;

    shell.note(format!("content address {}", report.address));
    shell.note(format!("transaction {}", report.receipt.transaction_hash));
    span.finish_with_message(
        Status::Published,
        format!("{} v{}", report.name, report.version),
    );

    Ok(())
}
