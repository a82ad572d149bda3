use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "gitlake",
    version,
    about = "Ingest git repository history into normalized domain records"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error
///   2 — configuration error
///   3 — acquisition error (unsupported scheme, auth, unreachable repo)
///   4 — database error
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let lower = format!("{err:#}").to_lowercase();

    if lower.contains("config") {
        2
    } else if lower.contains("acquisition")
        || lower.contains("unsupported locator")
        || lower.contains("clone workspace")
    {
        3
    } else if lower.contains("sqlite") || lower.contains("flush") || lower.contains("database") {
        4
    } else {
        1
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(commands::run(cli.command)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_config() {
        let err = anyhow::anyhow!("Configuration error: batch_size must be at least 1");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_unsupported_scheme() {
        let err = anyhow::anyhow!("Unsupported locator scheme: ftp://h/r");
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_database() {
        let err = anyhow::anyhow!("Flush of Commit batch failed: SQLite error");
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_unknown() {
        let err = anyhow::anyhow!("something else entirely");
        assert_eq!(classify_exit_code(&err), 1);
    }
}
