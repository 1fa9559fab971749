//! SecurePass - password vault client
//!
#![doc = "SecurePass - password vault client"]
#![doc = "Main entry point for the SecurePass command-line client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use securepass::cli::{Cli, Commands};
use securepass::commands::{self, Context};
use securepass::config::Config;
use securepass::password::generate_password;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    if let Err(e) = run(cli).await {
        tracing::debug!("Command failed: {:#}", e);
        commands::report_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Needs neither configuration nor a server.
    if let Commands::Generate { length } = cli.command {
        println!("{}", generate_password(length));
        return Ok(());
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let assume_yes = matches!(
        cli.command,
        Commands::Delete { yes: true, .. } | Commands::Dedupe { yes: true }
    );
    let mut ctx = Context::new(config, assume_yes)?;

    let result = match cli.command {
        Commands::Login { username, password } => {
            tracing::info!("Signing in");
            commands::auth::login(&mut ctx, username, password).await
        }
        Commands::Register { username, password } => {
            tracing::info!("Registering a new account");
            commands::auth::register(&mut ctx, username, password).await
        }
        Commands::Logout => {
            commands::auth::logout(&mut ctx);
            Ok(())
        }
        Commands::Status => {
            commands::auth::status(&ctx);
            Ok(())
        }
        Commands::List {
            search,
            weak,
            show_passwords,
        } => commands::vault::list(&mut ctx, search, weak, show_passwords).await,
        Commands::Add {
            site,
            username,
            password,
            generate,
        } => commands::vault::add(&mut ctx, site, username, password, generate).await,
        Commands::Update {
            id,
            password,
            generate,
        } => commands::vault::update(&mut ctx, id, password, generate).await,
        Commands::Delete { id, .. } => commands::vault::delete(&mut ctx, id).await,
        Commands::Refresh => commands::vault::refresh(&mut ctx).await,
        Commands::Dedupe { .. } => commands::vault::dedupe(&mut ctx).await,
        Commands::Import { file, format } => {
            tracing::info!("Importing from {}", file.display());
            commands::transfer::import(&mut ctx, &file, format).await
        }
        Commands::Export { file, format } => {
            tracing::info!("Exporting to {}", file.display());
            commands::transfer::export(&mut ctx, &file, format).await
        }
        Commands::Generate { .. } => Ok(()),
    };

    ctx.flush();
    result
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so command output
/// stays pipeable.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "securepass=debug"
    } else {
        "securepass=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
