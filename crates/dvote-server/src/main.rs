use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

const DEFAULT_LOG_FILTER: &str = "dvote=info,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    init_tracing(&config.logging);

    ensure_database_dir(&config.database.url);
    let db = dvote_db::create_pool(&config.database.url, config.database.max_connections).await?;
    dvote_db::run_migrations(&db).await?;
    if args.migrate_only {
        return Ok(());
    }

    let state = dvote_core::AppState::new(
        db,
        dvote_core::AppConfig {
            vote_policy: config.voting.policy,
            max_vote_attempts: config.voting.max_attempts,
        },
    );
    let app = dvote_api::app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        "listening on http://{} (database {}, vote policy {})",
        config.server.bind_address,
        config.database.url,
        config.voting.policy
    );

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(logging.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// SQLite creates the file but not its parent directory.
fn ensure_database_dir(database_url: &str) {
    if let Some(db_path) = database_url
        .strip_prefix("sqlite://")
        .and_then(|s| s.split('?').next())
    {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Could not create directory '{}': {}", parent.display(), e);
                }
            }
        }
    }
}
