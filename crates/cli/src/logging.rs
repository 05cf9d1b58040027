use anyhow::Context;
use clap::ValueEnum;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

pub fn init_logging(level: Option<LogLevel>) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.unwrap_or(LogLevel::Info).as_str().parse()?)
        .from_env()
        .context("invalid RUST_LOG value")?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .context("logging already initialized")?;
    Ok(())
}
