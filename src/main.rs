use clap::Parser;
use mis_finanzas::args::{Args, Command};
use mis_finanzas::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().finanzas_home().path();

    // When FINANZAS_IN_TEST_MODE is set and non-empty, requests go to an in-memory workbook seeded
    // with sample data instead of the Google Sheets API.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args).await?.print(),

        Command::Serve(serve_args) => commands::serve(Config::load(home).await?, mode, serve_args)
            .await?
            .print(),

        Command::Get(get_args) => commands::get(Config::load(home).await?, mode, get_args)
            .await?
            .print_json(),

        Command::Post(post_args) => commands::post(Config::load(home).await?, mode, post_args)
            .await?
            .print_json(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "mis_finanzas={level},{}={level},tower_http={level}",
                env!("CARGO_CRATE_NAME"),
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
