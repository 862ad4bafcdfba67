//! HTTP surface for the reservation workflow
//!
//! Exposes the booking endpoints as JSON plus service metrics in Prometheus
//! text format at /metrics. Uses hyper for the HTTP server.

use crate::domain::error::ReservationError;
use crate::domain::types::{HolderId, ReservationId, SeatRequest, ShowId};
use crate::infra::metrics::{Metrics, MetricsSummary, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS};
use crate::io::catalog::{Show, ShowCatalog};
use crate::io::identity::InMemoryIdentityProvider;
use crate::services::engine::ReservationEngine;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Shared state handed to every request handler
pub struct HttpState {
    pub engine: Arc<ReservationEngine>,
    pub catalog: Arc<dyn ShowCatalog>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub metrics: Arc<Metrics>,
    pub service_id: String,
}

#[derive(Debug, Deserialize)]
struct ReserveRequest {
    show_id: ShowId,
    holder_id: HolderId,
    seats: Vec<SeatRequest>,
}

#[derive(Debug, Serialize)]
struct ShowSummary {
    id: ShowId,
    movie: String,
    screen: String,
    show_time: chrono::DateTime<chrono::Utc>,
    is_active: bool,
    total_seats: usize,
    available: usize,
}

impl ShowSummary {
    fn from_show(show: &Show, available: usize) -> Self {
        Self {
            id: show.id,
            movie: show.movie.clone(),
            screen: show.screen.clone(),
            show_time: show.show_time,
            is_active: show.is_active,
            total_seats: show.seat_map.total_seats(),
            available,
        }
    }
}

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

/// Write a simple metric (counter or gauge) with service label
fn write_metric(
    output: &mut String,
    name: &str,
    help: &str,
    typ: MetricType,
    service: &str,
    val: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name}{{service=\"{service}\"}} {val}");
}

/// Write a histogram metric with buckets, sum, and count
fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    service: &str,
    buckets: &[u64; METRICS_NUM_BUCKETS],
    avg: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in METRICS_BUCKET_BOUNDS.iter().enumerate() {
        cumulative += buckets[i];
        let _ = writeln!(output, "{name}_bucket{{service=\"{service}\",le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{service=\"{service}\",le=\"+Inf\"}} {cumulative}");

    let count: u64 = buckets.iter().sum();
    let sum = avg * count;
    let _ = writeln!(output, "{name}_sum{{service=\"{service}\"}} {sum}");
    let _ = writeln!(output, "{name}_count{{service=\"{service}\"}} {count}");
}

/// Format metrics in Prometheus text exposition format
fn format_prometheus_metrics(summary: &MetricsSummary, service: &str) -> String {
    let mut output = String::with_capacity(4096);

    write_metric(
        &mut output,
        "boxoffice_reservations_created_total",
        "Pending reservations created",
        MetricType::Counter,
        service,
        summary.reservations_created,
    );
    write_metric(
        &mut output,
        "boxoffice_reservations_confirmed_total",
        "Reservations confirmed",
        MetricType::Counter,
        service,
        summary.reservations_confirmed,
    );
    write_metric(
        &mut output,
        "boxoffice_reservations_cancelled_total",
        "Reservations cancelled",
        MetricType::Counter,
        service,
        summary.reservations_cancelled,
    );
    write_metric(
        &mut output,
        "boxoffice_reservations_expired_total",
        "Pending reservations reclaimed on deadline",
        MetricType::Counter,
        service,
        summary.reservations_expired,
    );
    write_metric(
        &mut output,
        "boxoffice_claim_conflicts_total",
        "Reserve attempts rejected with a seat conflict",
        MetricType::Counter,
        service,
        summary.claim_conflicts,
    );
    write_metric(
        &mut output,
        "boxoffice_rejected_requests_total",
        "Reserve attempts rejected before the claim",
        MetricType::Counter,
        service,
        summary.rejected_requests,
    );
    write_metric(
        &mut output,
        "boxoffice_expiry_sweeps_total",
        "Expiry sweeps completed",
        MetricType::Counter,
        service,
        summary.sweeps_completed,
    );
    write_metric(
        &mut output,
        "boxoffice_uptime_secs",
        "Seconds since service start",
        MetricType::Gauge,
        service,
        summary.uptime_secs,
    );

    write_histogram(
        &mut output,
        "boxoffice_reserve_latency_us",
        "Reserve path latency in microseconds",
        service,
        &summary.reserve_latency_buckets,
        summary.reserve_latency_avg_us,
    );
    write_metric(
        &mut output,
        "boxoffice_reserve_latency_p50_us",
        "50th percentile reserve latency",
        MetricType::Gauge,
        service,
        summary.reserve_latency_p50_us,
    );
    write_metric(
        &mut output,
        "boxoffice_reserve_latency_p95_us",
        "95th percentile reserve latency",
        MetricType::Gauge,
        service,
        summary.reserve_latency_p95_us,
    );
    write_metric(
        &mut output,
        "boxoffice_reserve_latency_p99_us",
        "99th percentile reserve latency",
        MetricType::Gauge,
        service,
        summary.reserve_latency_p99_us,
    );

    output
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(bytes)))
            .expect("static response should not fail"),
        Err(e) => {
            error!(error = %e, "response_encode_error");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from(r#"{"reason":"encode_error"}"#)))
                .expect("static response should not fail")
        }
    }
}

fn bad_request(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::BAD_REQUEST,
        &serde_json::json!({ "reason": "invalid_request", "message": message }),
    )
}

/// Map a rejection to its HTTP status; the body is the serialized error
fn error_response(err: &ReservationError) -> Response<Full<Bytes>> {
    let status = match err {
        ReservationError::ShowNotFound { .. }
        | ReservationError::SeatNotFound { .. }
        | ReservationError::ReservationNotFound { .. } => StatusCode::NOT_FOUND,
        ReservationError::SeatsAlreadyClaimed { .. }
        | ReservationError::InvalidTransition { .. } => StatusCode::CONFLICT,
        ReservationError::UnknownHolder { .. } => StatusCode::FORBIDDEN,
        ReservationError::EmptySeatRequest
        | ReservationError::DuplicateSeatRequest { .. }
        | ReservationError::ShowNotBookable { .. }
        | ReservationError::SeatClassMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    json_response(status, err)
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<HttpState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["health"]) => Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("ok")))
            .expect("static response should not fail"),

        (&Method::GET, ["metrics"]) => {
            let body = format_prometheus_metrics(&state.metrics.report(), &state.service_id);
            Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
                .body(Full::new(Bytes::from(body)))
                .expect("static response should not fail")
        }

        (&Method::GET, ["shows"]) => {
            let summaries: Vec<ShowSummary> = state
                .catalog
                .list_shows()
                .iter()
                .map(|show| {
                    let available = state
                        .engine
                        .get_availability(show.id)
                        .map(|a| a.available)
                        .unwrap_or(show.seat_map.total_seats());
                    ShowSummary::from_show(show, available)
                })
                .collect();
            json_response(StatusCode::OK, &summaries)
        }

        (&Method::GET, ["shows", id]) => match id.parse::<ShowId>() {
            Ok(show_id) => match state.catalog.get_show(show_id) {
                Some(show) => json_response(StatusCode::OK, show.as_ref()),
                None => error_response(&ReservationError::ShowNotFound { show_id }),
            },
            Err(_) => bad_request("malformed show id"),
        },

        (&Method::GET, ["shows", id, "availability"]) => match id.parse::<ShowId>() {
            Ok(show_id) => match state.engine.get_availability(show_id) {
                Ok(availability) => json_response(StatusCode::OK, &availability),
                Err(e) => error_response(&e),
            },
            Err(_) => bad_request("malformed show id"),
        },

        (&Method::POST, ["holders"]) => {
            let holder_id = state.identity.register();
            info!(holder_id = %holder_id, "holder_registered");
            json_response(StatusCode::CREATED, &serde_json::json!({ "holder_id": holder_id }))
        }

        (&Method::POST, ["reservations"]) => match req.into_body().collect().await {
            Ok(collected) => {
                match serde_json::from_slice::<ReserveRequest>(&collected.to_bytes()) {
                    Ok(body) => {
                        match state.engine.reserve(body.show_id, &body.seats, body.holder_id) {
                            Ok(reservation) => json_response(StatusCode::CREATED, &reservation),
                            Err(e) => error_response(&e),
                        }
                    }
                    Err(e) => bad_request(&e.to_string()),
                }
            }
            Err(e) => bad_request(&e.to_string()),
        },

        (&Method::GET, ["reservations", id]) => match id.parse::<ReservationId>() {
            Ok(reservation_id) => match state.engine.get_reservation(reservation_id) {
                Ok(reservation) => json_response(StatusCode::OK, &reservation),
                Err(e) => error_response(&e),
            },
            Err(_) => bad_request("malformed reservation id"),
        },

        (&Method::POST, ["reservations", id, "finalize"]) => match id.parse::<ReservationId>() {
            Ok(reservation_id) => match state.engine.finalize(reservation_id) {
                Ok(reservation) => json_response(StatusCode::OK, &reservation),
                Err(e) => error_response(&e),
            },
            Err(_) => bad_request("malformed reservation id"),
        },

        (&Method::POST, ["reservations", id, "cancel"]) => match id.parse::<ReservationId>() {
            Ok(reservation_id) => match state.engine.cancel(reservation_id) {
                Ok(reservation) => json_response(StatusCode::OK, &reservation),
                Err(e) => error_response(&e),
            },
            Err(_) => bad_request("malformed reservation id"),
        },

        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .expect("static response should not fail"),
    };

    Ok(response)
}

/// Start the HTTP server
pub async fn start_http_server(
    port: u16,
    state: Arc<HttpState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = %port, service = %state.service_id, "http_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let state = state.clone();
                                async move { handle_request(req, state).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "http_connection_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "http_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("http_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
