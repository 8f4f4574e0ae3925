mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use kh_core::config::Config;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "keyhold=trace,kh_server=debug,kh_avatar=debug,kh_db=debug,tower_http=debug".to_string()
        } else {
            "keyhold=info,kh_server=info,kh_avatar=info,kh_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            tracing::info!("keyhold {} starting", env!("CARGO_PKG_VERSION"));
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(kh_server::start(config))?;
            Ok(())
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::HashPassword { password } => {
            println!("{}", kh_server::password::hash_password(&password)?);
            Ok(())
        }
        Commands::Version => {
            println!("keyhold {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        for w in &warnings {
            println!("⚠ {w}");
        }
    }
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Session timeout: {}h", config.auth.session_timeout_hours);
    println!("  Picture storage: {}", config.uploads.storage_dir.display());
    println!(
        "  Allowed extensions: {}",
        config.uploads.allowed_extensions.join(", ")
    );

    Ok(())
}
