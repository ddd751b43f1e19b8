use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use track_snap::auto_layout::generate_auto_layout;
use track_snap::geometry::connection_indicators;
use track_snap::layout::check_finite;
use track_snap::report::{LayoutReport, validate_layout};
use track_snap::snap::{DEFAULT_SNAP_DISTANCE, find_snap_position};
use track_snap::types::{ConnectionPoint, Piece, SnapResult};
use tracing::Level;

const MAX_GENERATED_PIECES: usize = 1000;

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapRequest {
    piece: Piece,
    #[serde(default)]
    existing: Vec<Piece>,
    #[serde(default = "default_snap_distance")]
    snap_distance: f64,
}

fn default_snap_distance() -> f64 {
    DEFAULT_SNAP_DISTANCE
}

#[derive(Serialize)]
struct SnapResponse {
    snap: Option<SnapResult>,
}

#[derive(Deserialize, Serialize)]
struct LayoutRequest {
    pieces: Vec<Piece>,
}

#[derive(Deserialize, Serialize)]
struct GenerateRequest {
    #[serde(default)]
    straights: usize,
    #[serde(default)]
    curves: usize,
}

#[derive(Serialize)]
struct GenerateResponse {
    pieces: Vec<Piece>,
}

#[derive(Serialize)]
struct PointsResponse {
    points: Vec<ConnectionPoint>,
}

fn bad_request(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}

async fn snap(Json(req): Json<SnapRequest>) -> Result<Json<SnapResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /snap"
    );

    if !req.snap_distance.is_finite() || req.snap_distance < 0.0 {
        return Err(bad_request("snap distance must be a non-negative number"));
    }
    check_finite(std::slice::from_ref(&req.piece)).map_err(bad_request)?;
    check_finite(&req.existing).map_err(bad_request)?;

    let snap = find_snap_position(&req.piece, &req.existing, req.snap_distance);
    Ok(Json(SnapResponse { snap }))
}

async fn validate(
    Json(req): Json<LayoutRequest>,
) -> Result<Json<LayoutReport>, (StatusCode, String)> {
    tracing::info!(pieces = req.pieces.len(), "POST /validate");
    check_finite(&req.pieces).map_err(bad_request)?;
    Ok(Json(validate_layout(&req.pieces)))
}

async fn generate(
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /generate"
    );

    if req.straights.saturating_add(req.curves) > MAX_GENERATED_PIECES {
        return Err(bad_request(format!(
            "at most {MAX_GENERATED_PIECES} pieces can be generated"
        )));
    }
    Ok(Json(GenerateResponse {
        pieces: generate_auto_layout(req.straights, req.curves),
    }))
}

async fn points(
    Json(req): Json<LayoutRequest>,
) -> Result<Json<PointsResponse>, (StatusCode, String)> {
    tracing::info!(pieces = req.pieces.len(), "POST /points");
    check_finite(&req.pieces).map_err(bad_request)?;
    Ok(Json(PointsResponse {
        points: connection_indicators(&req.pieces),
    }))
}

#[tokio::main]
async fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/snap", post(snap))
        .route("/validate", post(validate))
        .route("/generate", post(generate))
        .route("/points", post(points))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.expect("server error");
}
