//! `jutsu add` command

use anyhow::{Context, Result};

use crate::cli::AddArgs;
use crate::GlobalOptions;
use jutsu::core::PackageRef;
use jutsu::ops::jutsu_add::{add, AddOptions, AddResult};
use jutsu::util::diagnostic::suggestions;
use jutsu::util::fs::relative_path;
use jutsu::util::shell::Status;

pub fn execute(args: AddArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    let package: PackageRef = args
        .component
        .parse()
        .with_context(|| format!("invalid component `{}`", args.component))?;

    let ctx = global_opts.context()?;
    let project_root = ctx.project_root()?.to_path_buf();
    let registry = ctx.registry()?;
    let store = ctx.store()?;

    let spinner = shell.spinner(Status::Resolving, &package);
    let result = add(
        registry.as_ref(),
        store.as_ref(),
        &AddOptions {
            package,
            project_root: project_root.clone(),
        },
    );
    spinner.finish();

    match result? {
        AddResult::Installed {
            package,
            address,
            record,
            dest,
            report,
        } => {
            let version = record
                .map(|r| r.version)
                .or(package.version.clone())
                .unwrap_or_default();
            shell.status(
                Status::Installed,
                format!(
                    "{} v{} ({} files) to {}",
                    package.name,
                    version,
                    report.files,
                    relative_path(&project_root, &dest).display()
                ),
            );
            tracing::debug!("installed from {}", address);
        }
        AddResult::NotFound { package } => {
            shell.warn(format!("Package `{}` not found", package));
            shell.note(suggestions::CHECK_NAME);
        }
    }

    Ok(())
}
