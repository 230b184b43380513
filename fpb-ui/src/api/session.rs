//! Browse session API: create, configure, filter, and navigate
//!
//! Sessions are held in memory and keyed by UUID. Each request runs one
//! synchronous pass over the session's state and returns the new cursor
//! position, so clients re-render from the response.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fpb_common::filter::{FilterMode, FilterNotice};
use fpb_common::session::BrowseSession;
use fpb_common::table::MediaKind;
use fpb_common::{Error, QueryError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

/// POST /api/session request
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Selection id: an individual source id or a global query id
    pub selection: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub selection: String,
    pub name: String,
    /// Rows in the unified base table, before filtering
    pub total_rows: usize,
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: FilterMode,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub criterion: String,
    #[serde(default)]
    pub year: String,
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub total: usize,
    pub index: usize,
    pub notices: Vec<FilterNotice>,
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    /// +1 for next, -1 for previous
    pub direction: i64,
}

#[derive(Debug, Serialize)]
pub struct CursorResponse {
    pub index: usize,
    pub total: usize,
}

/// Current photo with its resolved location and display metadata
#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    /// Zero-based cursor position
    pub index: usize,
    /// One-based position for "Photo i of N" display
    pub position: usize,
    pub total: usize,
    pub folder: String,
    pub filename: String,
    pub url: String,
    pub media_kind: MediaKind,
    pub description: String,
    pub year: String,
    pub display_year: String,
    /// Non-empty character names in column order
    pub characters: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub index: usize,
    pub folder: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub total: usize,
    pub index: usize,
    pub rows: Vec<ResultRow>,
}

/// Session API errors
#[derive(Debug)]
pub enum ApiError {
    UnknownSession(Uuid),
    UnknownSelection(String),
    EmptyCriterion,
    NoSourcesLoaded,
    NoCurrentPhoto,
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Query(QueryError::UnknownSelection(id)) => ApiError::UnknownSelection(id),
            Error::Query(QueryError::NoSourcesLoaded) => ApiError::NoSourcesLoaded,
            Error::Query(QueryError::EmptyCriterion) => ApiError::EmptyCriterion,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::UnknownSession(id) => {
                (StatusCode::NOT_FOUND, format!("Unknown session: {}", id))
            }
            ApiError::UnknownSelection(id) => {
                (StatusCode::NOT_FOUND, format!("Unknown selection: {}", id))
            }
            ApiError::EmptyCriterion => (
                StatusCode::UNPROCESSABLE_ENTITY,
                QueryError::EmptyCriterion.to_string(),
            ),
            ApiError::NoSourcesLoaded => (
                StatusCode::BAD_GATEWAY,
                QueryError::NoSourcesLoaded.to_string(),
            ),
            ApiError::NoCurrentPhoto => (
                StatusCode::NOT_FOUND,
                "No photo to show: the result set is empty".to_string(),
            ),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// POST /api/session
///
/// Opens a browse session: resolves the selection, loads its sources,
/// and unifies them into the session's base table.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let session = BrowseSession::open(&state.config, &state.loader, &request.selection).await?;

    let response = CreateSessionResponse {
        session_id: Uuid::new_v4(),
        selection: session.selection_id().to_string(),
        name: session.selection_name().to_string(),
        total_rows: session.base_rows(),
    };

    state
        .sessions
        .write()
        .await
        .insert(response.session_id, session);

    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /api/session/:id
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or(ApiError::UnknownSession(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/session/:id/mode
pub async fn set_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetModeRequest>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(ApiError::UnknownSession(id))?;
    session.set_mode(request.mode);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/session/:id/filter
///
/// Runs the filter engine and installs the new result set; the cursor
/// resets to the first photo.
pub async fn run_filter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<FilterResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(ApiError::UnknownSession(id))?;

    session
        .run_filter(&request.criterion, &request.year)
        .map_err(|e| ApiError::from(Error::Query(e)))?;

    Ok(Json(FilterResponse {
        total: session.total(),
        index: session.current_index(),
        notices: session.notices().to_vec(),
    }))
}

/// POST /api/session/:id/step
pub async fn step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StepRequest>,
) -> Result<Json<CursorResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(ApiError::UnknownSession(id))?;

    let index = session.step(request.direction);
    Ok(Json(CursorResponse {
        index,
        total: session.total(),
    }))
}

/// POST /api/session/:id/reset
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CursorResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(ApiError::UnknownSession(id))?;

    let index = session.reset();
    Ok(Json(CursorResponse {
        index,
        total: session.total(),
    }))
}

/// GET /api/session/:id/photo
///
/// The current photo: resolved (folder, filename) pair, public URL, and
/// display metadata.
pub async fn current_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhotoResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(ApiError::UnknownSession(id))?;
    let record = session.current_record().ok_or(ApiError::NoCurrentPhoto)?;

    Ok(Json(PhotoResponse {
        index: session.current_index(),
        position: session.current_index() + 1,
        total: session.total(),
        folder: record.folder.clone(),
        filename: record.filename.clone(),
        url: state.config.photo_url(&record.folder, &record.filename),
        media_kind: record.media_kind(),
        description: record.description.trim().to_string(),
        year: record.year.clone(),
        display_year: record.display_year(),
        characters: record
            .character_roster()
            .into_iter()
            .map(str::to_string)
            .collect(),
    }))
}

/// GET /api/session/:id/results
///
/// The full result set of the session's last filter run.
pub async fn list_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(ApiError::UnknownSession(id))?;

    let rows = session
        .result_set()
        .iter()
        .enumerate()
        .map(|(index, record)| ResultRow {
            index,
            folder: record.folder.clone(),
            filename: record.filename.clone(),
        })
        .collect();

    Ok(Json(ResultsResponse {
        total: session.total(),
        index: session.current_index(),
        rows,
    }))
}
