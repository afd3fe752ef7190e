//! `jutsu new` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::NewArgs;
use crate::GlobalOptions;
use jutsu::ops::jutsu_new::{new_project, NewOptions};
use jutsu::util::shell::Status;

pub fn execute(args: NewArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let path = PathBuf::from(&args.name);

    let created = new_project(
        &path,
        &NewOptions {
            name: args.name.clone(),
        },
    )?;

    for entry in &created.entries {
        shell.status(Status::Created, path.join(entry).display());
    }
    shell.note(format!(
        "add your wallet address to {} before publishing",
        path.join(".env").display()
    ));

    Ok(())
}
