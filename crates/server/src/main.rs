use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use interview_report::config::{DEFAULT_FONT_NAME, DEFAULT_PHOTO_TIMEOUT};
use interview_report::{HttpPhotoFetcher, Layout, RendererConfig, ReportRenderer};
use interview_report_server::{build_router, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Serves interview report PDFs over HTTP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// TrueType font used for all report text [default: $INTERVIEW_REPORT_FONT or bundled]
    #[arg(long)]
    font: Option<PathBuf>,

    /// Logical name the report font is registered under
    #[arg(long, default_value = DEFAULT_FONT_NAME)]
    font_name: String,

    /// Full-page background image [default: $INTERVIEW_REPORT_TEMPLATE or bundled]
    #[arg(long)]
    template: Option<PathBuf>,

    /// Corner radius of the candidate photo, in points
    #[arg(long, default_value_t = Layout::default().photo_corner_radius)]
    photo_corner_radius: f64,

    /// Give up on a candidate photo download after this many seconds
    #[arg(long, default_value_t = DEFAULT_PHOTO_TIMEOUT.as_secs())]
    photo_timeout_secs: u64,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(err) = serve(cli).await {
        error!("{}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn serve(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let timeout = Duration::from_secs(cli.photo_timeout_secs);
    let config = RendererConfig::resolve(cli.font, cli.template)
        .with_font_name(cli.font_name)
        .with_layout(Layout::default().with_photo_corner_radius(cli.photo_corner_radius))
        .with_photo_timeout(timeout);

    info!(
        font = %config.font_path.display(),
        template = %config.template_path.display(),
        "Loading report assets"
    );

    let fetcher = HttpPhotoFetcher::new(tokio::runtime::Handle::current(), config.photo_timeout)?;
    let renderer = ReportRenderer::new(config).with_photo_fetcher(fetcher);
    info!(font = renderer.font().name(), "Report renderer ready");

    let app = build_router(AppState::new(renderer));

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
