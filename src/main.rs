use ccov::cli::{self, Cli, Commands};
use ccov::commands::{self, RunCommandConfig};
use ccov::errors::CcovError;
use std::process::ExitCode;

fn main() -> ExitCode {
    ccov::observability::install_panic_hook();
    let cli = cli::parse_args();
    cli::init_logging(cli.verbosity);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Init { force, root }) => {
            let root = commands::resolve_root(root.as_deref())?;
            commands::init_config(&root, force)?;
        }
        None => {
            commands::handle_run(RunCommandConfig {
                html_mode: cli.html_mode,
                upload_mode: cli.upload_mode,
                root: cli.root,
                config: cli.config,
                dry_run: cli.dry_run,
                json: cli.json,
                quiet: cli.quiet,
                plain: cli.plain,
            })?;
        }
    }
    Ok(())
}

/// A failing child's exit code passes through; everything else is 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CcovError>()
        .map(CcovError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}
