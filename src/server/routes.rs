//! HTTP route handlers for the chunk database API.

use crate::document::{ChunkId, ChunkUpdate, Document, DocumentId};
use crate::error::ChunkDbError;
use crate::indexed_chunk::IndexedChunk;
use crate::library::{Library, LibraryId};
use crate::metadata::{ChunkFilter, CustomFields, DocumentMetadataUpdate, LibraryMetadataUpdate};
use crate::server::AppState;
use crate::service::ChunkInput;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// --- Request/Response types ---

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub author: Option<String>,
    #[serde(default)]
    pub custom_fields: CustomFields,
    #[serde(default)]
    pub chunks: Vec<ChunkInput>,
}

#[derive(Deserialize)]
pub struct CreateLibraryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub custom_fields: CustomFields,
    #[serde(default)]
    pub document_ids: Vec<DocumentId>,
}

#[derive(Deserialize)]
pub struct AddDocumentRequest {
    pub document_id: DocumentId,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub embedding: Vec<f32>,
    pub k: Option<usize>,
    pub filter: Option<ChunkFilter>,
    pub min_similarity: Option<f32>,
}

#[derive(Serialize)]
pub struct LibraryResponse {
    pub id: LibraryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub custom_fields: CustomFields,
    pub document_ids: Vec<DocumentId>,
    pub is_indexed: bool,
}

impl From<&Library> for LibraryResponse {
    fn from(library: &Library) -> Self {
        Self {
            id: library.id,
            name: library.metadata.name.clone(),
            description: library.metadata.description.clone(),
            created_at: library.metadata.created_at,
            updated_at: library.metadata.updated_at,
            custom_fields: library.metadata.custom_fields.clone(),
            document_ids: library.documents().to_vec(),
            is_indexed: library.is_indexed(),
        }
    }
}

#[derive(Serialize)]
pub struct SimilarChunkResponse {
    #[serde(flatten)]
    pub chunk: IndexedChunk,
    pub similarity: f32,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub library_count: usize,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: ChunkDbError) -> ApiError {
    let status = match &err {
        ChunkDbError::NotFound { .. } => StatusCode::NOT_FOUND,
        ChunkDbError::IndexNotBuilt => StatusCode::CONFLICT,
        ChunkDbError::InvalidEntity { .. } | ChunkDbError::DimensionMismatch { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn parse_document_id(s: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(s).map_err(error_response)
}

fn parse_chunk_id(s: &str) -> Result<ChunkId, ApiError> {
    ChunkId::parse(s).map_err(error_response)
}

fn parse_library_id(s: &str) -> Result<LibraryId, ApiError> {
    LibraryId::parse(s).map_err(error_response)
}

// --- Router ---

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/documents", post(create_document))
        .route("/documents/:id", get(get_document))
        .route("/documents/:id", patch(update_document))
        .route("/documents/:id", delete(delete_document))
        .route("/documents/:id/chunks", post(add_chunk))
        .route("/documents/:id/chunks/:chunk_id", get(get_chunk))
        .route("/documents/:id/chunks/:chunk_id", patch(update_chunk))
        .route("/documents/:id/chunks/:chunk_id", delete(delete_chunk))
        .route("/libraries", post(create_library))
        .route("/libraries", get(list_libraries))
        .route("/libraries/:id", get(get_library))
        .route("/libraries/:id", patch(update_library))
        .route("/libraries/:id", delete(delete_library))
        .route("/libraries/:id/documents", post(add_document_to_library))
        .route(
            "/libraries/:id/documents/:document_id",
            delete(remove_document_from_library),
        )
        .route("/libraries/:id/index", post(index_library))
        .route("/libraries/:id/search", post(search_library))
        .route("/health", get(health))
        .with_state(state)
}

// --- Document handlers ---

async fn create_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let document = state
        .db
        .create_document(&req.title, req.author, req.custom_fields, req.chunks)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let id = parse_document_id(&id)?;
    let document = state.db.get_document(&id).map_err(error_response)?;
    Ok(Json(document))
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<DocumentMetadataUpdate>,
) -> Result<Json<Document>, ApiError> {
    let id = parse_document_id(&id)?;
    let document = state
        .db
        .update_document(&id, &update)
        .map_err(error_response)?;
    Ok(Json(document))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_document_id(&id)?;
    state.db.delete_document(&id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Chunk handlers ---

async fn add_chunk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ChunkInput>,
) -> Result<(StatusCode, Json<crate::document::Chunk>), ApiError> {
    let id = parse_document_id(&id)?;
    let chunk = state.db.add_chunk(&id, input).map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(chunk)))
}

async fn get_chunk(
    State(state): State<Arc<AppState>>,
    Path((id, chunk_id)): Path<(String, String)>,
) -> Result<Json<crate::document::Chunk>, ApiError> {
    let id = parse_document_id(&id)?;
    let chunk_id = parse_chunk_id(&chunk_id)?;
    let chunk = state
        .db
        .get_chunk(&id, &chunk_id)
        .map_err(error_response)?;
    Ok(Json(chunk))
}

async fn update_chunk(
    State(state): State<Arc<AppState>>,
    Path((id, chunk_id)): Path<(String, String)>,
    Json(update): Json<ChunkUpdate>,
) -> Result<Json<crate::document::Chunk>, ApiError> {
    let id = parse_document_id(&id)?;
    let chunk_id = parse_chunk_id(&chunk_id)?;
    let chunk = state
        .db
        .update_chunk(&id, &chunk_id, update)
        .map_err(error_response)?;
    Ok(Json(chunk))
}

async fn delete_chunk(
    State(state): State<Arc<AppState>>,
    Path((id, chunk_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = parse_document_id(&id)?;
    let chunk_id = parse_chunk_id(&chunk_id)?;
    state
        .db
        .delete_chunk(&id, &chunk_id)
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Library handlers ---

async fn create_library(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLibraryRequest>,
) -> Result<(StatusCode, Json<LibraryResponse>), ApiError> {
    let library = state
        .db
        .create_library(&req.name, &req.description, req.custom_fields, req.document_ids)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(LibraryResponse::from(&library))))
}

async fn list_libraries(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<LibraryResponse>> {
    let libraries = state.db.list_libraries();
    Json(libraries.iter().map(LibraryResponse::from).collect())
}

async fn get_library(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LibraryResponse>, ApiError> {
    let id = parse_library_id(&id)?;
    let library = state.db.get_library(&id).map_err(error_response)?;
    Ok(Json(LibraryResponse::from(&library)))
}

async fn update_library(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<LibraryMetadataUpdate>,
) -> Result<Json<LibraryResponse>, ApiError> {
    let id = parse_library_id(&id)?;
    let library = state
        .db
        .update_library(&id, &update)
        .map_err(error_response)?;
    Ok(Json(LibraryResponse::from(&library)))
}

async fn delete_library(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_library_id(&id)?;
    state.db.delete_library(&id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_document_to_library(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddDocumentRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_library_id(&id)?;
    state
        .db
        .add_document_to_library(&id, req.document_id)
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_document_from_library(
    State(state): State<Arc<AppState>>,
    Path((id, document_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = parse_library_id(&id)?;
    let document_id = parse_document_id(&document_id)?;
    state
        .db
        .remove_document_from_library(&id, &document_id)
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn index_library(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_library_id(&id)?;
    state.db.index_library(&id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn search_library(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<SimilarChunkResponse>>, ApiError> {
    let id = parse_library_id(&id)?;
    let results = state
        .db
        .find_similar_chunks(
            &id,
            req.embedding,
            req.k.unwrap_or(5),
            req.filter.as_ref(),
            req.min_similarity.unwrap_or(0.0),
        )
        .map_err(error_response)?;

    Ok(Json(
        results
            .into_iter()
            .map(|(chunk, similarity)| SimilarChunkResponse { chunk, similarity })
            .collect(),
    ))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        library_count: state.db.list_libraries().len(),
    })
}
