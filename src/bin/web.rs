use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use orbital_cloud::logging::init_tracing;
use orbital_cloud::{
    AppConfig, CloudStore, OrbitalError, OrbitalParams, OrbitalSampler, SampleResult,
    ViewSettings,
};

const MAX_COUNT: usize = 500_000;

#[derive(Deserialize)]
struct SampleQuery {
    n: Option<u32>,
    l: Option<u32>,
    m: Option<i32>,
    count: Option<usize>,
    max: Option<f64>,
    seed: Option<u64>,
    constrain: Option<bool>,
}

#[derive(Serialize)]
struct SampleResponse {
    n: u32,
    l: u32,
    m: i32,
    count: usize,
    max_radius: f64,
    positions_pos: Vec<[f64; 3]>,
    positions_neg: Vec<[f64; 3]>,
    pmax: f64,
    attempts: u64,
    view: ViewSettings,
}

impl SampleResponse {
    fn new(params: OrbitalParams, result: SampleResult, view: ViewSettings) -> Self {
        SampleResponse {
            n: params.n,
            l: params.l,
            m: params.m,
            count: params.num_points,
            max_radius: params.r_max,
            positions_pos: result.positions_pos,
            positions_neg: result.positions_neg,
            pmax: result.pmax,
            attempts: result.attempts,
            view,
        }
    }
}

struct AppState {
    sampler: OrbitalSampler,
    defaults: OrbitalParams,
    view: ViewSettings,
    store: CloudStore,
}

struct ApiError(StatusCode, String);

impl From<OrbitalError> for ApiError {
    fn from(e: OrbitalError) -> Self {
        let status = match e {
            OrbitalError::InvalidQuantumState { .. }
            | OrbitalError::InvalidSampleRequest(_)
            | OrbitalError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            OrbitalError::DegenerateEnvelope { .. } | OrbitalError::AttemptsExhausted { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            OrbitalError::Io(_) | OrbitalError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

fn params_from_query(q: &SampleQuery, defaults: OrbitalParams) -> OrbitalParams {
    let params = OrbitalParams {
        n: q.n.unwrap_or(defaults.n),
        l: q.l.unwrap_or(defaults.l),
        m: q.m.unwrap_or(defaults.m),
        num_points: q.count.unwrap_or(defaults.num_points).min(MAX_COUNT),
        r_max: q.max.unwrap_or(defaults.r_max),
    };
    if q.constrain.unwrap_or(false) {
        params.constrain()
    } else {
        params
    }
}

async fn generate(
    state: &Arc<AppState>,
    params: OrbitalParams,
    seed: Option<u64>,
) -> Result<SampleResult, ApiError> {
    let request = params.to_request()?;
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || match seed {
        Some(seed) => state
            .sampler
            .run(&request, &mut ChaCha8Rng::seed_from_u64(seed)),
        None => state.sampler.run(&request, &mut rand::thread_rng()),
    })
    .await
    .map_err(|e| {
        error!("sampling task failed: {e}");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, "sampling task failed".to_string())
    })?
    .map_err(ApiError::from)
}

async fn samples(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SampleQuery>,
) -> Result<Json<SampleResponse>, ApiError> {
    let params = params_from_query(&q, state.defaults);
    let result = generate(&state, params, q.seed).await?;
    Ok(Json(SampleResponse::new(params, result, state.view)))
}

async fn regenerate(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SampleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = params_from_query(&q, state.defaults);
    let result = generate(&state, params, q.seed).await?;
    let snapshot = state.store.publish(params, result);
    info!(generation = snapshot.generation, "published cloud");
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn cloud(State(state): State<Arc<AppState>>) -> Response {
    match state.store.current() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (StatusCode::NOT_FOUND, "no cloud published yet").into_response(),
    }
}

async fn settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "orbital": state.defaults,
        "view": state.view,
        "sampler": state.sampler.config(),
    }))
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/samples", get(samples))
        .route("/regenerate", post(regenerate))
        .route("/cloud", get(cloud))
        .route("/config", get(settings))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    init_tracing("orbital_cloud=info,web=info");

    let config = match std::env::var("ORBITAL_CONFIG") {
        Ok(path) => AppConfig::load(&path).unwrap_or_else(|e| {
            error!("failed to load {path}: {e}");
            std::process::exit(1);
        }),
        Err(_) => AppConfig::default(),
    };
    let sampler = OrbitalSampler::new(config.sampler.clone()).unwrap_or_else(|e| {
        error!("{e}");
        std::process::exit(1);
    });
    let addr: SocketAddr = config.bind_addr.parse().unwrap_or_else(|e| {
        error!("invalid bind address {}: {e}", config.bind_addr);
        std::process::exit(1);
    });

    let state = Arc::new(AppState {
        sampler,
        defaults: config.orbital,
        view: config.view,
        store: CloudStore::new(),
    });
    let app = router(state);

    info!("Serving on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
