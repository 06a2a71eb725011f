//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{ErrorKind, JoinCode, Room, RoomId, UserId},
    infrastructure::dto::http::{
        CreateRoomRequestDto, CreateRoomResponseDto, ErrorResponseDto, RoomDetailDto,
        RoomSummaryDto,
    },
    ui::state::AppState,
    usecase::GetRoomDetailError,
};

type ApiError = (StatusCode, Json<ErrorResponseDto>);

fn api_error(status: StatusCode, kind: ErrorKind, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponseDto {
            code: kind.as_code().to_string(),
            message: message.to_string(),
        }),
    )
}

fn internal_error(message: impl ToString) -> ApiError {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::TransportFailure,
        message,
    )
}

fn detail_error(error: GetRoomDetailError) -> ApiError {
    match error {
        GetRoomDetailError::RoomNotFound => {
            api_error(StatusCode::NOT_FOUND, ErrorKind::NotFound, error)
        }
        GetRoomDetailError::Repository(e) => internal_error(e),
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create a room; the requester becomes its host
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequestDto>,
) -> Result<(StatusCode, Json<CreateRoomResponseDto>), ApiError> {
    let host = UserId::try_from(request.host_user_id)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, ErrorKind::InvalidInput, e))?;

    let room = state
        .create_room_usecase
        .execute(host, request.max_participants, request.with_join_code)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidInput => api_error(StatusCode::BAD_REQUEST, e.kind(), e),
            _ => internal_error(e),
        })?;

    // Domain Model から DTO への変換
    let response = CreateRoomResponseDto {
        id: room.id.as_str().to_string(),
        join_code: room.join_code.as_ref().map(|c| c.as_str().to_string()),
        host_user_id: room.host.as_str().to_string(),
        max_participants: room.max_participants,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get list of rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, ApiError> {
    let rooms = state
        .get_rooms_usecase
        .execute()
        .await
        .map_err(internal_error)?;

    Ok(Json(rooms.iter().map(RoomSummaryDto::from).collect()))
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let room_id = RoomId::try_from(room_id)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, ErrorKind::InvalidInput, e))?;
    let room = state
        .get_room_detail_usecase
        .execute(&room_id)
        .await
        .map_err(detail_error)?;

    Ok(Json(RoomDetailDto::from(&room)))
}

/// Resolve a join code to the room it opens
pub async fn get_room_by_join_code(
    State(state): State<Arc<AppState>>,
    Path(join_code): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let code = JoinCode::try_from(join_code)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, ErrorKind::InvalidInput, e))?;
    let room = state
        .get_room_detail_usecase
        .find_by_join_code(&code)
        .await
        .map_err(detail_error)?;

    Ok(Json(RoomDetailDto::from(&room)))
}

/// Debug endpoint to dump the stored room as-is (for testing purposes)
pub async fn debug_room_state(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    let room_id = RoomId::try_from(room_id)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, ErrorKind::InvalidInput, e))?;
    let room = state
        .get_room_detail_usecase
        .execute(&room_id)
        .await
        .map_err(detail_error)?;

    Ok(Json(room))
}
