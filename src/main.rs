use chatstream::cli::{parse_args, resolve_config, run_cli_command, run_repl, run_turn, CliCommand, Terminal};
use chatstream::ChatSession;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "chatstream=info";

/// How long runtime shutdown waits for background tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let command = parse_args(std::env::args());
    if let Some(result) = run_cli_command(&command) {
        return result;
    }
    let CliCommand::Chat(args) = command else {
        return Ok(());
    };

    color_eyre::install()?;
    init_tracing();

    let config = resolve_config(&args).wrap_err("failed to load configuration")?;
    tracing::debug!(?config, "configuration resolved");

    let runtime = tokio::runtime::Runtime::new()?;
    let mut session = ChatSession::from_config(config)?;

    let succeeded = runtime.block_on(async {
        let mut term = Terminal::new(std::io::stdout(), std::io::stderr()).with_ctrl_c();
        match args.prompt.as_deref() {
            Some(prompt) => Ok(run_turn(&mut session, prompt, &mut term).await?.is_ok()),
            None => {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                run_repl(&mut session, stdin, &mut term).await?;
                Ok::<bool, color_eyre::Report>(true)
            }
        }
    })?;

    // Stdin reads run on a blocking thread that may never return.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    std::io::stdout().flush()?;

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
