//! Axum route handlers for the prospect import API.

use std::convert::Infallible;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::import::batch::ImportOutcome;
use crate::import::csv_parser::{parse_csv, CsvRow};
use crate::import::dedup::check_duplicates;
use crate::import::mapper::{auto_map, FieldMapping};
use crate::import::pipeline::{
    prepare_records, run_import, ImportContext, ImportRequest, ImportResponse, MappedUpload,
};
use crate::import::registry::FieldRegistry;
use crate::models::prospect::ProspectRecord;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
    pub row_count: usize,
    pub suggested_mapping: FieldMapping,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub records: Vec<ProspectRecord>,
    pub total: usize,
    pub mapped_fields: usize,
    pub duplicate_indices: Vec<usize>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/prospects/import/upload
///
/// Accepts a multipart `file` part, parses it and proposes a column mapping.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(AppError::Validation("Please upload a .csv file".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Validation("File is not valid UTF-8 text".to_string()))?;

        let parsed = parse_csv(&text);
        if parsed.is_empty() {
            return Err(AppError::Validation("Empty file".to_string()));
        }

        let suggested_mapping = auto_map(&parsed.headers, &state.field_registry);
        info!(
            "Parsed upload '{file_name}': {} columns, {} rows, {} auto-mapped",
            parsed.headers.len(),
            parsed.rows.len(),
            suggested_mapping.mapped_count()
        );

        return Ok(Json(UploadResponse {
            file_name,
            row_count: parsed.rows.len(),
            headers: parsed.headers,
            rows: parsed.rows,
            suggested_mapping,
        }));
    }

    Err(AppError::Validation("Missing 'file' part".to_string()))
}

/// POST /api/v1/prospects/import/preview
///
/// Applies the mapping and flags rows that already exist. Nothing is written.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(upload): Json<MappedUpload>,
) -> Result<Json<PreviewResponse>, AppError> {
    let records = prepare_records(&upload, &state.field_registry)?;
    if records.is_empty() {
        return Err(AppError::Validation("Empty file".to_string()));
    }

    let duplicates = check_duplicates(state.prospect_store.as_ref(), &records).await?;

    Ok(Json(PreviewResponse {
        total: records.len(),
        mapped_fields: upload.mapping.mapped_count(),
        duplicate_indices: duplicates.into_iter().collect(),
        records,
    }))
}

/// POST /api/v1/prospects/import
///
/// Runs the import. Partial failures return 200; check `outcome`.
/// When every attempted batch failed the same body comes back as 502.
pub async fn handle_import(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let ctx = ImportContext {
        store: state.prospect_store.as_ref(),
        registry: &state.field_registry,
        events: &state.import_events,
        running: &state.running_imports,
        batch_size: state.config.import_batch_size,
    };

    let response = run_import(ctx, request).await?;
    let status = match response.outcome {
        ImportOutcome::Failed => {
            warn!(
                "Import {}: all {} attempted rows failed",
                response.import_id, response.result.failed
            );
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::OK,
    };

    Ok((status, Json(response)))
}

/// POST /api/v1/prospects/import/:import_id/cancel
pub async fn handle_cancel_import(
    State(state): State<AppState>,
    Path(import_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.running_imports.cancel(import_id) {
        info!("Cancellation requested for import {import_id}");
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(AppError::NotFound(format!("Import {import_id} is not running")))
    }
}

/// GET /api/v1/prospects/import/fields
pub async fn handle_import_fields(State(state): State<AppState>) -> Json<FieldRegistry> {
    Json(state.field_registry.as_ref().clone())
}

/// GET /api/v1/prospects/events
///
/// Server-sent events: `import_progress` while imports run and
/// `collection_changed` once per import that inserted rows.
pub async fn handle_prospect_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.import_events.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().event(event.name()).json_data(&event) {
                    Ok(sse) => return Some((Ok::<_, Infallible>(sse), rx)),
                    Err(e) => warn!("Failed to encode {} event: {e}", event.name()),
                },
                Err(RecvError::Lagged(missed)) => {
                    warn!("Event listener lagged, {missed} events dropped")
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
