use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::model::ReservationId;
use crate::schema::{Message, Pagination, Reservation, ReservationCreate};

use super::{ApiError, ApiResult, AppState};

/// GET /reservations?skip=&limit=
pub async fn list(
    State(engine): State<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<Json<Vec<Reservation>>> {
    let Query(page) = page?;
    Ok(Json(engine.list_reservations(page).await))
}

/// POST /reservations. 400 when the slot overlaps an existing booking on the table.
pub async fn create(
    State(engine): State<AppState>,
    payload: Result<Json<ReservationCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Reservation>)> {
    let Json(payload) = payload?;
    let reservation = engine.create_reservation(payload).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// DELETE /reservations/{id}
pub async fn delete(
    State(engine): State<AppState>,
    id: Result<Path<ReservationId>, PathRejection>,
) -> ApiResult<Json<Message>> {
    let Path(id) = id?;
    match engine.delete_reservation(id).await? {
        Some(_) => Ok(Json(Message::new("Reservation cancelled"))),
        None => Err(ApiError::not_found(format!("Reservation {id} not found"))),
    }
}
