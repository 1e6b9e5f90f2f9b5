//! One full-page capture through the bridge extension.
//!
//! Demonstrates:
//! - Binding the bridge server and waiting for the extension
//! - Focusing the attached tab
//! - Running a capture and printing the UI status text
//!
//! Usage:
//!   cargo run --example fullpage
//!   cargo run --example fullpage -- --debug
//!   cargo run --example fullpage -- --port 9222 --config capture.json

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use fullpage_capture::orchestrator::STATUS_IN_PROGRESS;
use fullpage_capture::transport::PendingServer;
use fullpage_capture::{CaptureConfig, CaptureService, Result, Tab};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
struct Args {
    debug: bool,
    port: u16,
    config: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Self {
        let mut args = Self::default();
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" => args.debug = true,
                "--port" => args.port = iter.next().and_then(|p| p.parse().ok()).unwrap_or(0),
                "--config" => args.config = iter.next().map(PathBuf::from),
                _ => {}
            }
        }
        args
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Full-page capture ===\n");

    // ========================================================================
    // Configuration
    // ========================================================================

    let config = match &args.config {
        Some(path) => CaptureConfig::from_file(path)?,
        None => CaptureConfig::new().with_download_dir(
            dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
        ),
    };

    println!("[1] Output directory: {}", config.download_dir.display());

    // ========================================================================
    // Bridge
    // ========================================================================

    let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), args.port).await?;
    println!("[2] Waiting for the bridge extension on {}...", server.ws_url());

    let tab = Tab::connect(server).await?;
    tab.focus().await?;
    println!("    ✓ Attached to tab {}\n", tab.tab_id());

    // ========================================================================
    // Capture
    // ========================================================================

    let (service, mut events) = CaptureService::for_tab(tab, config)?;

    println!("[3] {STATUS_IN_PROGRESS}");
    let report = service.capture().await?;
    println!(
        "    ✓ {} of {} sections captured (skipped {:?}, failed {:?})",
        report.captured().len(),
        report.total_sections,
        report.skipped(),
        report.failed()
    );

    if let Some(event) = events.recv().await {
        println!("\n{}", event.status_text());
    }

    service.shutdown();
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "fullpage_capture=debug"
    } else {
        "fullpage_capture=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();
}
