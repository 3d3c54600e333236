use clap::Parser;
use esnaf_kasa::args::{Args, Command};
use esnaf_kasa::{commands, App, Config, Mode, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info, trace};
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
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().kasa_home().path();

    // This allows for running the program without a server. When KASA_IN_TEST_MODE is set and
    // non-empty, then the mode will be Mode::Test, otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.api_url()).await?.print(),

        Command::Register(credential_args) => {
            let app = load_app(home, mode).await?;
            commands::register(&app, &credential_args.credentials())
                .await?
                .print()
        }

        Command::Login(credential_args) => {
            let mut app = load_app(home, mode).await?;
            commands::login(&mut app, &credential_args.credentials())
                .await?
                .print()
        }

        Command::Logout => {
            let mut app = load_app(home, mode).await?;
            commands::logout(&mut app).await?.print()
        }

        Command::Dashboard(dashboard_args) => {
            let mut app = load_app(home, mode).await?;
            commands::dashboard(&mut app, dashboard_args.sort(), dashboard_args.format())
                .await?
                .print()
        }

        Command::List(list_args) => {
            let mut app = load_app(home, mode).await?;
            commands::list(&mut app, list_args.filter(), list_args.format())
                .await?
                .print()
        }

        Command::Add(add_args) => {
            let mut app = load_app(home, mode).await?;
            commands::add(&mut app, add_args.transaction())
                .await?
                .print()
        }

        Command::Delete(delete_args) => {
            let mut app = load_app(home, mode).await?;
            let id = delete_args.id();
            if delete_args.yes() || commands::confirm_delete(id, std::io::stdin().lock())? {
                commands::delete(&mut app, id).await?.print()
            } else {
                info!("Kept transaction {id}")
            }
        }
    };
    Ok(())
}

async fn load_app(home: &Path, mode: Mode) -> Result<App> {
    let config = Config::load(home).await?;
    App::load(config, mode).await
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
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
