use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::engine::{Engine, EngineError};
use crate::model::*;

type App = Arc<Engine>;

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// The whole HTTP surface. `/bookings` is the legacy alias surface: reads
/// and deletes route straight to the reservation handlers, writes go
/// through the compatibility adapter.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/availability", get(availability))
        .route(
            "/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route(
            "/reservations/{id}",
            get(get_reservation)
                .put(update_reservation)
                .delete(delete_reservation),
        )
        .route("/checkin/{id}", post(check_in))
        .route("/checkout/{id}", post(check_out))
        .route("/profiles", get(list_profiles).post(create_profile))
        .route(
            "/profiles/{id}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/bookings", get(list_reservations).post(create_booking))
        .route(
            "/bookings/{id}",
            get(get_reservation)
                .put(update_booking)
                .delete(delete_reservation),
        )
        .layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let start = Instant::now();
    let response = next.run(req).await;
    metrics::histogram!(
        crate::observability::REQUEST_DURATION_SECONDS,
        "method" => method.clone(),
        "path" => path.clone()
    )
    .record(start.elapsed().as_secs_f64());
    metrics::counter!(
        crate::observability::REQUESTS_TOTAL,
        "method" => method,
        "path" => path,
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    response
}

// ── Availability ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AvailabilityParams {
    check_in: Option<String>,
    check_out: Option<String>,
    #[serde(default)]
    include_tentatives: bool,
}

async fn availability(
    State(engine): State<App>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Value>, EngineError> {
    let rooms = engine
        .availability(
            params.check_in.as_deref(),
            params.check_out.as_deref(),
            params.include_tentatives,
        )
        .await?;
    Ok(Json(json!({ "rooms_available": rooms })))
}

// ── Reservations ─────────────────────────────────────────

async fn list_reservations(State(engine): State<App>) -> Json<Vec<ReservationView>> {
    Json(engine.list_reservations().await)
}

async fn get_reservation(
    State(engine): State<App>,
    Path(id): Path<String>,
) -> Result<Json<ReservationView>, EngineError> {
    Ok(Json(engine.get_reservation(&id).await?))
}

async fn create_reservation(
    State(engine): State<App>,
    Json(draft): Json<ReservationDraft>,
) -> Result<(StatusCode, Json<ReservationView>), EngineError> {
    let view = engine.create_reservation(draft).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_reservation(
    State(engine): State<App>,
    Path(id): Path<String>,
    Json(draft): Json<ReservationDraft>,
) -> Result<Json<ReservationView>, EngineError> {
    Ok(Json(engine.update_reservation(&id, draft).await?))
}

async fn delete_reservation(
    State(engine): State<App>,
    Path(id): Path<String>,
) -> Result<Json<DeletionAck>, EngineError> {
    Ok(Json(engine.delete_reservation(&id).await?))
}

async fn check_in(
    State(engine): State<App>,
    Path(id): Path<String>,
) -> Result<Json<TransitionReceipt>, EngineError> {
    Ok(Json(engine.check_in(&id).await?))
}

async fn check_out(
    State(engine): State<App>,
    Path(id): Path<String>,
) -> Result<Json<TransitionReceipt>, EngineError> {
    Ok(Json(engine.check_out(&id).await?))
}

// ── Profiles ─────────────────────────────────────────────

async fn list_profiles(State(engine): State<App>) -> Json<Vec<ProfileView>> {
    Json(engine.list_profiles().await)
}

async fn get_profile(
    State(engine): State<App>,
    Path(id): Path<String>,
) -> Result<Json<ProfileView>, EngineError> {
    Ok(Json(engine.get_profile(&id).await?))
}

async fn create_profile(
    State(engine): State<App>,
    Json(draft): Json<ProfileDraft>,
) -> Result<(StatusCode, Json<ProfileView>), EngineError> {
    let view = engine.create_profile(draft).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_profile(
    State(engine): State<App>,
    Path(id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<ProfileView>, EngineError> {
    Ok(Json(engine.update_profile(&id, patch).await?))
}

async fn delete_profile(
    State(engine): State<App>,
    Path(id): Path<String>,
) -> Result<Json<DeletionAck>, EngineError> {
    Ok(Json(engine.delete_profile(&id).await?))
}

// ── Legacy bookings ──────────────────────────────────────

async fn create_booking(
    State(engine): State<App>,
    Json(legacy): Json<LegacyBookingDraft>,
) -> Result<(StatusCode, Json<ReservationView>), EngineError> {
    let view = engine.create_booking(legacy).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_booking(
    State(engine): State<App>,
    Path(id): Path<String>,
    Json(legacy): Json<LegacyBookingDraft>,
) -> Result<Json<ReservationView>, EngineError> {
    Ok(Json(engine.update_booking(&id, legacy).await?))
}
