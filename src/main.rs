use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use navira_server::{AttachmentNaming, ServerConfig};
use navira_telemetry::{LogFormat, TelemetryConfig};

/// WebSocket ingest endpoint for location pings, SOS alerts and incident reports.
#[derive(Debug, Parser)]
#[command(name = "navira", version)]
struct Args {
    /// Interface to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 8765)]
    port: u16,

    /// Directory incident attachments are written to.
    #[arg(long, default_value = "reports")]
    reports_dir: PathBuf,

    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatArg,

    /// Add the connection id to attachment file names so incidents with the
    /// same timestamp cannot overwrite each other.
    #[arg(long)]
    disambiguate_attachments: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            reports_dir: self.reports_dir.clone(),
            naming: if self.disambiguate_attachments {
                AttachmentNaming::TimestampAndConnection
            } else {
                AttachmentNaming::Timestamp
            },
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    navira_telemetry::init_telemetry(&TelemetryConfig {
        format: args.log_format.into(),
        ..TelemetryConfig::default()
    });

    let _handle = match navira_server::start(args.server_config()).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start server");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl+c");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutting down");
    ExitCode::SUCCESS
}
