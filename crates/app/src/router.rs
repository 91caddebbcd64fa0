use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use gemdesk_mailer::EmailClient;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::{notify, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    mailer: EmailClient,
    admin_address: Arc<str>,
}

impl AppState {
    pub fn new(
        metrics: PrometheusHandle,
        mailer: EmailClient,
        admin_address: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            metrics,
            mailer,
            admin_address: admin_address.into(),
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn mailer(&self) -> &EmailClient {
        &self.mailer
    }

    pub fn admin_address(&self) -> &str {
        &self.admin_address
    }
}

pub fn app_router(state: AppState) -> Router {
    let notifications = Router::new()
        .route("/send-signup-notification", post(notify::signup))
        .route("/send-approval-notification", post(notify::approval))
        .layer(notification_cors());

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .merge(notifications)
        .with_state(state)
}

/// Browser callers hit the notification endpoints cross-origin with the
/// platform client's headers attached.
fn notification_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> Response {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        Body::from(body),
    )
        .into_response()
}
