//! `jutsu build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::GlobalOptions;
use jutsu::ops::jutsu_build::build;
use jutsu::util::shell::Status;

pub fn execute(args: BuildArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    let ctx = global_opts.context()?;
    let entry = ctx.resolve_path(&args.file);
    let compiler = ctx.compiler()?;

    let span = shell.span(Status::Compiling, args.file.display());
    let compiled = build(&compiler, &entry)?;

    shell.note(format!("ABI written to {}", compiled.abi_path.display()));
    span.finish_with_message(
        Status::Finished,
        format!(
            "{} ({} bytes of bytecode)",
            compiled.artifact.name,
            compiled.artifact.bytecode.len() / 2
        ),
    );

    Ok(())
}
