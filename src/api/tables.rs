use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::model::TableId;
use crate::schema::{Message, Pagination, Table, TableCreate};

use super::{ApiError, ApiResult, AppState};

/// GET /tables?skip=&limit=
pub async fn list(
    State(engine): State<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<Json<Vec<Table>>> {
    let Query(page) = page?;
    Ok(Json(engine.list_tables(page).await))
}

/// POST /tables
pub async fn create(
    State(engine): State<AppState>,
    payload: Result<Json<TableCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Table>)> {
    let Json(payload) = payload?;
    let table = engine.create_table(payload).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

/// DELETE /tables/{id}. Also removes the table's reservations.
pub async fn delete(
    State(engine): State<AppState>,
    id: Result<Path<TableId>, PathRejection>,
) -> ApiResult<Json<Message>> {
    let Path(id) = id?;
    match engine.delete_table(id).await? {
        Some(_) => Ok(Json(Message::new("Table deleted"))),
        None => Err(ApiError::not_found(format!("Table {id} not found"))),
    }
}
