use clap::Parser;
use stanza_cli::{args, driver};

fn main() {
    let args = args::Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("STANZA_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match driver::run(&args) {
        Ok(summary) => std::process::exit(summary.exit_code()),
        Err(error) => {
            eprintln!("{error:#}");
            std::process::exit(2);
        }
    }
}
