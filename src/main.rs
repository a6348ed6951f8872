use gosh::Interpreter;
use gosh::config::{LOG_ENV, Options, ShellConfig};
use std::io;
use std::process::ExitCode;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();
    let options: Options = argh::from_env();

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gosh: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(options: Options) -> gosh::Result<()> {
    let config = ShellConfig::from_options(options)?;
    let mut shell = Interpreter::from_config(&config)?;

    // Keeps the SIGINT listener alive for the whole session.
    let runtime = signal_runtime()?;
    let _listener = shell.env().relay.listen(&runtime)?;

    let result = shell.repl(io::stdin(), &mut io::stdout(), &mut io::stdout());
    if let Err(e) = shell.shutdown() {
        error!(error = %e, "history not saved");
        eprintln!("gosh: {}", e);
    }
    info!("bye");
    result
}

fn signal_runtime() -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("gosh-signals")
        .enable_all()
        .build()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}
