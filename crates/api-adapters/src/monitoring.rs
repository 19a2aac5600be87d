//! Health and liveness probes.
//!
//! `/healthcheck` only proves the process answers. `/liveness` probes the
//! store and reports in one of three shapes picked by `?format=`: the plain
//! status object, a JSON component tree (`json`), or a Prometheus gauge
//! (`metrics`).

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::state::AppState;

const STATUS_METRIC: &str = "kanban_api_status";

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct StatusLabels {
    component: String,
    line: String,
}

/// Prometheus registry holding the API status gauge.
pub struct Monitor {
    registry: Registry,
    status: Family<StatusLabels, Gauge>,
    line: String,
}

impl Monitor {
    pub fn new(line: &str) -> Self {
        let mut registry = Registry::default();
        let status = Family::<StatusLabels, Gauge>::default();
        registry.register(STATUS_METRIC, "Kanban API status: 1=OK, 0=KO", status.clone());
        Self { registry, status, line: line.to_string() }
    }

    fn record(&self, ok: bool) {
        let labels = StatusLabels { component: "global".into(), line: self.line.clone() };
        self.status.get_or_create(&labels).set(i64::from(ok));
    }

    fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LivenessQuery {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProbeItem {
    critical: u8,
    action: &'static str,
    label: &'static str,
    status: &'static str,
}

pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn liveness(State(state): State<AppState>, Query(query): Query<LivenessQuery>) -> Response {
    let probe = state.store.ping().await;
    if let Err(err) = &probe {
        tracing::error!(error = %err, "liveness probe failed");
    }
    let ok = probe.is_ok();
    state.monitor.record(ok);

    match query.format.as_deref() {
        Some("metrics") => match state.monitor.render() {
            Ok(text) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
                text,
            )
                .into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
        Some("json") => {
            let item = ProbeItem {
                critical: 1,
                action: "PingStore",
                label: "Store answers a ping",
                status: if ok { "ok" } else { "ko" },
            };
            Json(json!({ "items": { "api": { "store": item } } })).into_response()
        }
        _ => match probe {
            Ok(()) => Json(json!({ "status": "ok" })).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("store unreachable: {err}") })),
            )
                .into_response(),
        },
    }
}
