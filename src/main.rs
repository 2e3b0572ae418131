//! streameye binary: CLI, logging and signal wiring around [`MjpegServer`]
//!
//! Usage: `<jpeg stream> | streameye [options]`

use std::ffi::OsString;
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use streameye::{MjpegServer, Result, ServerConfig};

/// MJPEG fan-out streaming server: pipe JPEG frames in, serve
/// multipart/x-mixed-replace out
#[derive(Debug, Parser)]
#[command(name = "streameye", version, about)]
struct Args {
    /// Debug mode, increased log verbosity
    #[arg(short = 'd', conflicts_with = "quiet")]
    debug: bool,

    /// Listen only on the localhost interface
    #[arg(short = 'l')]
    listen_localhost: bool,

    /// TCP port to listen on
    #[arg(short = 'p', value_name = "PORT", default_value_t = 8080)]
    port: u16,

    /// Quiet mode, log only errors
    #[arg(short = 'q')]
    quiet: bool,

    /// Separator between JPEG frames received at input
    /// (autodetects JPEG frame boundaries by default)
    ///
    /// Taken as raw bytes; the separator is not required to be valid UTF-8.
    #[arg(short = 's', value_name = "SEPARATOR", allow_hyphen_values = true)]
    separator: Option<OsString>,

    /// Client read timeout, in seconds
    #[arg(short = 't', value_name = "TIMEOUT", default_value_t = 10)]
    timeout: u32,
}

impl Args {
    fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            listen_localhost: self.listen_localhost,
            client_read_timeout: Duration::from_secs(u64::from(self.timeout)),
            // On Unix this is exactly the argv bytes, so separators may
            // contain arbitrary bytes such as 0xFF.
            separator: self.separator.clone().map(OsString::into_encoded_bytes),
        }
    }
}

fn init_logging(args: &Args) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(args.log_filter()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_owned()))
        .init();
}

/// Resolves on the first SIGINT/SIGTERM; later signals are logged and
/// ignored while shutdown is in progress
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        tracing::info!("interrupt received, quitting");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = interrupt.recv() => {}
                    _ = terminate.recv() => {}
                }
                tracing::info!("interrupt already received, ignoring signal");
            }
        });
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("interrupt received, quitting");
    })
}

async fn run(args: Args) -> Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "streamEye starting");

    let config = args.server_config();
    if config.separator_policy().is_collision_prone() {
        tracing::info!(
            "the input separator supplied is very likely to appear \
             in the actual frame data (consider a longer one)"
        );
    }

    let shutdown = shutdown_signal()?;
    let server = MjpegServer::bind(config).await?;
    server.serve(tokio::io::stdin(), shutdown).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(args).await {
        Ok(()) => {
            tracing::info!("bye!");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(error = %error, "fatal error");
            ExitCode::FAILURE
        }
    }
}
