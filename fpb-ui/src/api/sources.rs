//! Source registry listing

use axum::{extract::State, Json};
use fpb_common::loader::TableStatus;
use serde::Serialize;

use crate::AppState;

/// One individual source as offered to the client
#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub photo_folder: String,
}

/// One global (multi-source) query as offered to the client
#[derive(Debug, Serialize)]
pub struct GlobalQueryInfo {
    pub id: String,
    pub name: String,
    pub load_order: Vec<String>,
}

/// GET /api/sources response
#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceInfo>,
    pub global_queries: Vec<GlobalQueryInfo>,
    /// Cache status of tables loaded so far
    pub loaded_tables: Vec<TableStatus>,
}

/// GET /api/sources
///
/// Lists the configured sources and global queries a session can select.
pub async fn list_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    let sources = state
        .config
        .sources
        .iter()
        .map(|s| SourceInfo {
            id: s.id.clone(),
            name: s.name.clone(),
            photo_folder: s.photo_folder.clone(),
        })
        .collect();

    let global_queries = state
        .config
        .global_queries
        .iter()
        .map(|q| GlobalQueryInfo {
            id: q.id.clone(),
            name: q.name.clone(),
            load_order: q.load_order.clone(),
        })
        .collect();

    Json(SourcesResponse {
        sources,
        global_queries,
        loaded_tables: state.loader.status().await,
    })
}
