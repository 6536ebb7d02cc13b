//! HTTP route handlers for the editor API.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use cardflow::core::catalog::Catalog;
use cardflow::core::document::PipelineDocument;
use cardflow::core::error::EngineError;
use cardflow::core::filters::Filter;
use cardflow::core::types::{CardId, ColumnDescriptor};
use cardflow::edit::{CardTypeRef, EditCommand, apply};
use cardflow::io::pipeline_store::document_from_value;
use cardflow::submit::{SubmitOutcome, submit_session};
use cardflow::view::{PipelineView, pipeline_view};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::state::{AppState, ChangeEvent};

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(get_catalog))
        .route("/columns", get(get_columns))
        .route("/pipeline", get(get_pipeline))
        .route("/cards", post(add_card))
        .route("/cards/{id}", delete(remove_card))
        .route("/cards/{id}/fields/{key}", put(set_field))
        .route("/cards/{id}/columns", get(get_card_columns))
        .route("/export", get(export_pipeline))
        .route("/import", post(import_pipeline))
        .route("/save", post(save_pipeline))
        .route("/submit", post(submit))
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/catalog - card types in display order.
async fn get_catalog(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.session.read().await.catalog().clone())
}

#[derive(Debug, Serialize)]
struct ColumnsResponse {
    columns: Vec<ColumnDescriptor>,
    filters: Vec<Filter>,
}

/// GET /api/columns - base columns and active filters.
async fn get_columns(State(state): State<AppState>) -> Json<ColumnsResponse> {
    let session = state.session.read().await;
    Json(ColumnsResponse {
        columns: session.pipeline().base_columns().to_vec(),
        filters: session.filters().to_filters(),
    })
}

/// GET /api/pipeline - derived views of every card.
async fn get_pipeline(State(state): State<AppState>) -> Json<PipelineView> {
    Json(pipeline_view(state.session.read().await.pipeline()))
}

#[derive(Debug, Deserialize)]
struct AddCardBody {
    #[serde(flatten)]
    card_type: CardTypeRef,
    #[serde(default)]
    after: Option<CardId>,
}

#[derive(Debug, Serialize)]
struct EditResponse {
    card: CardId,
    pipeline: PipelineView,
}

/// POST /api/cards - insert a card by `type` or `label`, after `after`.
async fn add_card(
    State(state): State<AppState>,
    Json(body): Json<AddCardBody>,
) -> Result<Json<EditResponse>, StatusCode> {
    edit(
        &state,
        EditCommand::Add {
            card_type: body.card_type,
            after: body.after,
        },
    )
    .await
}

/// DELETE /api/cards/{id}
async fn remove_card(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<EditResponse>, StatusCode> {
    edit(&state, EditCommand::Remove { id: CardId(id) }).await
}

#[derive(Debug, Deserialize)]
struct SetFieldBody {
    value: Value,
}

/// PUT /api/cards/{id}/fields/{key} - raw widget input as `{"value": ...}`.
async fn set_field(
    State(state): State<AppState>,
    Path((id, key)): Path<(u64, String)>,
    Json(body): Json<SetFieldBody>,
) -> Result<Json<EditResponse>, StatusCode> {
    edit(
        &state,
        EditCommand::Set {
            id: CardId(id),
            key,
            raw: body.value,
        },
    )
    .await
}

async fn edit(state: &AppState, command: EditCommand) -> Result<Json<EditResponse>, StatusCode> {
    let mut session = state.session.write().await;
    let outcome = apply(session.pipeline(), &command).map_err(|err| {
        warn!(error = %err, "edit rejected");
        engine_status(&err)
    })?;
    session.replace_pipeline(outcome.pipeline);
    let pipeline = pipeline_view(session.pipeline());
    drop(session);

    state.notify(ChangeEvent::PipelineChanged);
    Ok(Json(EditResponse {
        card: outcome.card,
        pipeline,
    }))
}

/// GET /api/cards/{id}/columns - columns available to one card.
async fn get_card_columns(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<ColumnDescriptor>>, StatusCode> {
    let session = state.session.read().await;
    let id = CardId(id);
    if session.pipeline().card(id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(session.pipeline().available_columns(id)))
}

/// GET /api/export - the persisted document for the current pipeline.
async fn export_pipeline(State(state): State<AppState>) -> Json<PipelineDocument> {
    Json(state.session.read().await.export())
}

/// POST /api/import - replace the pipeline with an exported document.
async fn import_pipeline(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<PipelineView>, StatusCode> {
    let document = document_from_value(body).map_err(|err| {
        warn!(error = %format!("{err:#}"), "import rejected");
        StatusCode::BAD_REQUEST
    })?;
    let mut session = state.session.write().await;
    session.import(document).map_err(|err| {
        warn!(error = %format!("{err:#}"), "import rejected");
        err.downcast_ref::<EngineError>()
            .map_or(StatusCode::BAD_REQUEST, engine_status)
    })?;
    let view = pipeline_view(session.pipeline());
    drop(session);

    state.notify(ChangeEvent::PipelineChanged);
    Ok(Json(view))
}

/// POST /api/save - write the pipeline to `pipeline.json`.
async fn save_pipeline(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    state.session.read().await.save().map_err(|err| {
        warn!(error = %format!("{err:#}"), "save failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    state.notify(ChangeEvent::PipelineSaved);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/submit - write the evaluation request, or 422 with what is missing.
async fn submit(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let outcome = submit_session(&*state.session.read().await, None).map_err(|err| {
        warn!(error = %format!("{err:#}"), "submit failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    match outcome {
        SubmitOutcome::Written { path, request } => {
            info!(path = %path.display(), "request written");
            state.notify(ChangeEvent::RequestWritten { path: path.clone() });
            Ok((
                StatusCode::OK,
                Json(json!({"path": path, "request": request})),
            ))
        }
        SubmitOutcome::NotReady(not_ready) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "message": not_ready.to_string(),
                "incomplete": not_ready.incomplete,
            })),
        )),
    }
}

fn engine_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::UnknownCardType(_)
        | EngineError::UnknownCardLabel(_)
        | EngineError::UnknownCard(_) => StatusCode::NOT_FOUND,
        EngineError::UnknownField { .. } | EngineError::DuplicateCard(_) => {
            StatusCode::BAD_REQUEST
        }
    }
}
