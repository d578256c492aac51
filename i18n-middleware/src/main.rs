use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::{Json, Router, routing::get};
use clap::Parser;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use i18n_middleware::{Config, I18n, Resolution, Translator, config::LoggingConfig};

/// Demo server for the i18n middleware
#[derive(Debug, Parser)]
#[command(name = "i18n-middleware", version)]
struct Args {
    /// Path to config.toml (defaults to conf/config.toml or ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Debug, Serialize)]
struct Greeting {
    locale: String,
    greeting: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _log_guard = init_logging(&config.logging)?;

    let i18n = I18n::new(config.i18n.clone().build()?)?;
    let routes = Router::new().route("/", get(greet)).route("/locale", get(locale));
    let app = i18n.localize(routes).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn greet(t: Translator) -> Json<Greeting> {
    Json(Greeting { locale: t.locale().to_string(), greeting: t.t("greeting") })
}

async fn locale(resolution: Resolution) -> Json<Resolution> {
    Json(resolution)
}

/// Console logging plus an optional daily-rolling log file.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level '{}'", config.level))?;
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    let Some(file) = &config.file else {
        registry.init();
        return Ok(None);
    };

    let path = Path::new(file);
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().with_context(|| format!("Invalid log file '{}'", file))?;
    std::fs::create_dir_all(directory)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, file_name));
    registry.with(fmt::layer().with_writer(writer).with_ansi(false)).init();

    Ok(Some(guard))
}
