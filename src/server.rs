//! Actix Web server exposing the sync endpoint and the modal/list hooks.
//!
//! Handlers never hold a lock across an await. When both are needed the
//! lifecycle controller is locked before the store.

use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, ResponseError, web};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::constants::http;
use crate::lifecycle::{LifecycleController, ModalView, Transition, UiEvent};
use crate::persistence::{ButtonFile, PersistenceError};
use crate::projection::ListProjection;
use crate::store::{EntityStore, SharedStore, StoreError, lock_store};
use crate::sync::{self, SyncError};
use crate::types::{Button, ButtonId};

/// Shared state backing HTTP handlers
pub struct AppState {
    pub store: SharedStore,
    pub controller: Mutex<LifecycleController>,
    pub file: Arc<ButtonFile>,
}

impl AppState {
    pub fn new(store: EntityStore, file: ButtonFile) -> Self {
        Self {
            store: store.into_shared(),
            controller: Mutex::new(LifecycleController::new()),
            file: Arc::new(file),
        }
    }
}

/// Failures of the non-sync endpoints
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid event: {0}")]
    BadEvent(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadEvent(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

impl ResponseError for SyncError {
    fn status_code(&self) -> StatusCode {
        match self {
            SyncError::NoData | SyncError::InvalidEntries(_) => StatusCode::BAD_REQUEST,
            SyncError::Fault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
        });
        if let SyncError::InvalidEntries(entries) = self {
            let errors: Map<String, Value> = entries
                .iter()
                .map(|e| (e.key.clone(), Value::String(e.reason.clone())))
                .collect();
            body["errors"] = Value::Object(errors);
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[derive(Serialize)]
struct ButtonEntry {
    id: ButtonId,
    #[serde(flatten)]
    button: Button,
}

#[derive(Serialize)]
struct EventResponse {
    transition: Transition,
    modal: ModalView,
}

/// Register every route; shared by the real server and the tests
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(http::MAX_BODY_SIZE))
        .route("/update_button_positions", web::post().to(update_button_positions))
        .route("/buttons", web::get().to(list_buttons))
        .route("/list", web::get().to(list_view))
        .route("/events", web::post().to(ui_event))
        .route("/save", web::post().to(save_positions))
        .route("/health", web::get().to(health));
}

/// Bind and serve until the server is stopped (Ctrl-C / SIGTERM)
pub async fn run(config: &ServerConfig, state: web::Data<AppState>) -> Result<()> {
    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind((config.bind.as_str(), config.port))
        .with_context(|| format!("Failed to bind {}:{}", config.bind, config.port))?;

    info!(bind = %config.bind, port = config.port, "HTTP server listening");
    server.run().await.context("HTTP server error")
}

/// Apply a batch of drag/resize updates from the client
async fn update_button_positions(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, SyncError> {
    let applied = sync::sync_positions(&state.store, &body).inspect_err(|e| {
        if let SyncError::Fault(msg) = e {
            error!(error = %msg, "Error handling /update_button_positions");
        }
    })?;
    debug!(applied, "Applied sync batch");
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Every button in insertion order
async fn list_buttons(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let entries: Vec<ButtonEntry> = lock_store(&state.store)?
        .all()
        .into_iter()
        .map(|(id, button)| ButtonEntry { id, button })
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

/// `"{text} - {additionalText}"` lines for the list tab
async fn list_view(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let store = lock_store(&state.store)?;
    Ok(HttpResponse::Ok().json(ListProjection::build(&store)))
}

/// Dispatch one UI event to the lifecycle controller
async fn ui_event(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let event: UiEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Rejected UI event");
        ApiError::BadEvent(e.to_string())
    })?;

    let mut controller = state.controller.lock().map_err(|_| StoreError::Poisoned)?;
    let mut store = lock_store(&state.store)?;
    let transition = controller.dispatch(event, &mut store);
    Ok(HttpResponse::Ok().json(EventResponse {
        transition,
        modal: controller.view(),
    }))
}

/// "Save Positions": write the whole store to disk
async fn save_positions(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let store = state.store.clone();
    let file = state.file.clone();
    let saved = tokio::task::spawn_blocking(move || file.save_store(&store))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .inspect_err(|e| error!(error = %e, "Failed to save buttons"))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "saved": saved })))
}

async fn health(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let store = lock_store(&state.store)?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "buttons": store.len(),
        "dirty": store.is_dirty(),
    })))
}
