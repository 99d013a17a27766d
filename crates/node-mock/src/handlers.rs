use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::state::MockState;

#[derive(Deserialize)]
pub struct DownloadRequest {
    master_hash: String,
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

fn failing(state: &MockState) -> Option<Response> {
    state.knobs.lock().failing.then(|| {
        detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{} is misbehaving", state.id),
        )
    })
}

pub async fn status(State(state): State<Arc<MockState>>) -> Response {
    let delay = {
        state.counters.lock().status += 1;
        state.knobs.lock().status_delay
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if let Some(response) = failing(&state) {
        return response;
    }

    let peers = state.knobs.lock().peers.clone();
    let storage_usage = state.files.lock().len();

    Json(json!({
        "server": state.id.as_str(),
        "status": "online",
        "storage_usage": storage_usage,
        "peers": peers,
    }))
    .into_response()
}

pub async fn hashes(State(state): State<Arc<MockState>>) -> Response {
    if let Some(response) = failing(&state) {
        return response;
    }

    let inventory: BTreeMap<String, Vec<String>> = state
        .files
        .lock()
        .iter()
        .map(|(hash, file)| (hash.clone(), file.chunks.clone()))
        .collect();

    Json(inventory).into_response()
}

pub async fn upload(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    let delay = state.knobs.lock().upload_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if let Some(response) = failing(&state) {
        return response;
    }

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return detail(StatusCode::BAD_REQUEST, e.to_string()),
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content = match field.bytes().await {
            Ok(content) => content,
            Err(e) => return detail(StatusCode::BAD_REQUEST, e.to_string()),
        };

        let file = state.store(&filename, &content);
        info!(
            "[{}] Uploaded {}. Master Hash: {}, Chunks: {}",
            state.id,
            filename,
            file.master_hash,
            file.chunks.len()
        );

        return Json(json!({
            "filename": file.filename,
            "size": content.len(),
            "chunk_count": file.chunks.len(),
            "master_hash": file.master_hash,
            "integrity_hash": file.integrity_hash,
        }))
        .into_response();
    }

    detail(StatusCode::UNPROCESSABLE_ENTITY, "field 'file' is required")
}

pub async fn download(
    State(state): State<Arc<MockState>>,
    Json(request): Json<DownloadRequest>,
) -> Response {
    if let Some(response) = failing(&state) {
        return response;
    }

    if state.knobs.lock().download_pending {
        return detail(
            StatusCode::NOT_FOUND,
            "File chunks not found or still syncing",
        );
    }

    let Some(file) = state.files.lock().get(&request.master_hash).cloned() else {
        return detail(
            StatusCode::NOT_FOUND,
            "File metadata not found in system registry",
        );
    };

    debug!("[{}] Serving {}", state.id, request.master_hash);
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"downloaded_file\"".to_string(),
            ),
        ],
        file.content,
    )
        .into_response()
}

pub async fn attack(State(state): State<Arc<MockState>>) -> Response {
    state.counters.lock().attack += 1;

    if let Some(response) = failing(&state) {
        return response;
    }

    state.files.lock().clear();
    info!("[{}] ATTACK SIMULATED: Storage wiped!", state.id);

    Json(json!({
        "status": "success",
        "message": format!("Storage wiped on {}", state.id),
    }))
    .into_response()
}
