//! `jutsu flatten` command

use std::io::Write;

use anyhow::Result;

use crate::cli::FlattenArgs;
use crate::GlobalOptions;
use jutsu::ops::jutsu_build::{flatten_file, FlattenOptions};
use jutsu::util::shell::Status;

pub fn execute(args: FlattenArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let cwd = std::env::current_dir()?;

    let opts = FlattenOptions {
        entry: cwd.join(&args.file),
        output: args.output.as_ref().map(|p| cwd.join(p)),
    };
    let unit = flatten_file(&opts)?;

    match args.output {
        Some(output) => shell.status(
            Status::Finished,
            format!(
                "{} ({} source bodies) -> {}",
                unit.source_name(),
                unit.bodies().len(),
                output.display()
            ),
        ),
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(unit.render().as_bytes())?;
        }
    }

    Ok(())
}
