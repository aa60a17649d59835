//! Whiteout server
//!
//! Web front end for two jobs:
//!
//! - Editing page 1 of an uploaded PDF: erase the name and date regions and
//!   write new text over them (preview as PNG, or download)
//! - Filling the stock `big.pdf` / `small.pdf` certificate templates with a
//!   plate number and dates, with a calibration preview that suggests values
//!   from an uploaded certificate
//!
//! Requests are independent; the only shared state is read-only (asset
//! directory, fonts loaded at startup, the rasterizer).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whiteout_core::{OverlayFont, PageRasterizer, PdfiumRasterizer};

mod error;
mod form;
mod handlers;
mod page;

/// Font for the freeform name/date edit, relative to the assets directory.
const FREEFORM_FONT: &str = "fonts/HelveticaNowMicro-Regular.ttf";
/// Font for both template flows.
const TEMPLATE_FONT: &str = "fonts/arial-unicode-ms-bold.ttf";

/// Command-line arguments for the whiteout server
#[derive(Parser, Debug)]
#[command(name = "whiteout-server")]
#[command(about = "Whiteout-and-overlay PDF editing server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "10000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Directory holding big.pdf, small.pdf and fonts/
    #[arg(long, env = "WHITEOUT_ASSETS_DIR", default_value = ".")]
    assets_dir: PathBuf,

    /// Directory containing the PDFium shared library
    #[arg(long, env = "PDFIUM_DIR")]
    pdfium_dir: Option<PathBuf>,

    /// Maximum request body size in megabytes
    #[arg(long, default_value = "50")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub assets_dir: PathBuf,
    pub freeform_font: OverlayFont,
    pub template_font: OverlayFont,
    pub rasterizer: Arc<dyn PageRasterizer>,
}

impl AppState {
    /// Load fonts from `assets_dir`, falling back to Helvetica for any that
    /// are missing.
    pub fn load(assets_dir: PathBuf, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            freeform_font: OverlayFont::load_or_builtin(&assets_dir.join(FREEFORM_FONT)),
            template_font: OverlayFont::load_or_builtin(&assets_dir.join(TEMPLATE_FONT)),
            assets_dir,
            rasterizer,
        }
    }
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .route("/render_page", post(handlers::render_page))
        .route("/render_template", post(handlers::render_template))
        .route("/generate_template", post(handlers::generate_template_pdf))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_directives = if args.verbose {
        "whiteout_server=debug,whiteout_core=debug,tower_http=debug"
    } else {
        "whiteout_server=info,whiteout_core=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Assets directory: {}", args.assets_dir.display());
    let rasterizer = Arc::new(PdfiumRasterizer::new(args.pdfium_dir.clone()));
    let state = AppState::load(args.assets_dir.clone(), rasterizer);

    let app = build_router(state, args.max_upload_mb * 1024 * 1024);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Max upload: {} MB", args.max_upload_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
