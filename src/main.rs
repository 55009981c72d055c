use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use vendor_eval::config::AppConfig;
use vendor_eval::error::AppError;
use vendor_eval::evaluations::{
    evaluation_router, Dataset, EvaluationService, InMemoryEvaluationStore,
};
use vendor_eval::telemetry;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: Arc<PrometheusHandle>,
}

#[derive(Parser, Debug)]
#[command(
    name = "Vendor Evaluation Tracker",
    about = "Run the evaluation tracking service or drive generation and export from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with evaluation records directly from a seed dataset
    Evaluations {
        #[command(subcommand)]
        command: EvaluationsCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// JSON dataset to preload into the store at startup (overrides EVAL_DATASET)
    #[arg(long)]
    data: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum EvaluationsCommand {
    /// Generate missing evaluations for one project and print the report
    Generate(GenerateArgs),
    /// Generate for every eligible project, then write the CSV export
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Project code to generate evaluations for
    project_code: String,
    /// JSON dataset describing projects, vendors, requirements, and members
    #[arg(long)]
    data: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// JSON dataset describing projects, vendors, requirements, and members
    #[arg(long)]
    data: PathBuf,
    /// Destination file for the CSV; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Evaluations {
            command: EvaluationsCommand::Generate(args),
        } => run_generate(args),
        Command::Evaluations {
            command: EvaluationsCommand::Export(args),
        } => run_export(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let seed_path = args.data.take().or_else(|| config.dataset.seed_path.take());
    let store = match seed_path {
        Some(path) => Dataset::from_path(path)?.into_store(),
        None => InMemoryEvaluationStore::new(),
    };
    let service = Arc::new(EvaluationService::new(Arc::new(store)));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = evaluation_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "vendor evaluation tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), AppError> {
    let store = Dataset::from_path(&args.data)?.into_store();
    let service = EvaluationService::new(Arc::new(store));

    let report = service.generate(&args.project_code)?;
    println!("project: {}", report.project_code);
    print!("{report}");
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let dataset = Dataset::from_path(&args.data)?;
    let codes = dataset.active_project_codes();
    let service = EvaluationService::new(Arc::new(dataset.into_store()));

    for code in codes {
        match service.generate(&code) {
            Ok(report) => println!("generated {} evaluations for {}", report.created.len(), code),
            // Skip projects that are not set up for generation; the export
            // still covers whatever records exist.
            Err(err) => eprintln!("skipping {code}: {err}"),
        }
    }

    let body = service.export_csv()?;
    match args.out {
        Some(path) => std::fs::write(path, body)?,
        None => std::io::stdout().write_all(&body)?,
    }
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
