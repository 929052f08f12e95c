//! Generation endpoint: validation, fan-out, and the SSE multiplexer.
//!
//! One admitted request fans out into a detached usage-tracking task, a
//! detached generation task, and a relay task that owns the client-facing
//! event stream. Once streaming starts, all failure reporting happens inside
//! the stream; the HTTP status line is already committed.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use readmegen_core::event::StreamEvent;
use readmegen_core::prompt::{build_user_prompt, SYSTEM_INSTRUCTION};
use readmegen_core::request::GenerateRequest;
use readmegen_core::template::raw_content_url;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::prelude::*;
use crate::serve::AppState;
use crate::{gemini, store};

/// Buffered events between the relay and the response body writer.
const STREAM_BUFFER: usize = 8;

pub async fn generate_readme(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            log::warn!("Json bind error: {rejection}");
            return bad_request("Invalid request body");
        }
    };

    if let Err(err) = request.validate() {
        log::warn!(
            "Bad request: {err} (projectType={:?} files={} fullCodeLen={})",
            request.project_type,
            request.project_files.len(),
            request.full_code.len()
        );
        return bad_request("Missing required fields");
    }

    let template = match request.format_source() {
        Some(source) => fetch_template(&state.http, source).await,
        None => None,
    };

    if !request.user_info.email.is_empty() {
        tokio::spawn(store::record_usage(
            state.http.clone(),
            Arc::clone(&state.config),
            request.user_info.email.clone(),
            request.display_username(),
            request.os_descriptor(),
        ));
    }

    let user_prompt = build_user_prompt(&request, template.as_deref());
    let (chunks, errors) = gemini::spawn_generation(
        state.config.gemini_api_key.clone(),
        state.config.model.clone(),
        SYSTEM_INSTRUCTION.to_string(),
        user_prompt,
    );

    let cancel = CancellationToken::new();
    let (event_tx, event_rx) = mpsc::channel::<StreamEvent>(STREAM_BUFFER);
    tokio::spawn(relay_events(chunks, errors, cancel.clone(), event_tx));

    // Dropping the response body (client disconnect) drops the guard, which
    // cancels the relay without waiting on the backend call.
    let guard = cancel.drop_guard();
    let stream = ReceiverStream::new(event_rx).map(move |event| {
        let _ = &guard;
        Ok::<Event, Infallible>(Event::default().data(event.to_frame_data()))
    });

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(stream),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Resolve the format template. Every failure degrades to the default prompt
/// branch; this never fails the request.
async fn fetch_template(http: &reqwest::Client, source: &str) -> Option<String> {
    let url = raw_content_url(source);

    match http.get(&url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => Some(body),
            Err(err) => {
                log::warn!("Failed to read template body from {url}: {err}");
                None
            }
        },
        Ok(response) => {
            log::warn!("Failed to fetch template from {url}: {}", response.status());
            None
        }
        Err(err) => {
            log::warn!("Failed to fetch template from {url}: {err}");
            None
        }
    }
}

/// Drive the client-facing stream to exactly one terminal transition.
///
/// Chunks are forwarded in order; the first error is forwarded and ends the
/// stream; chunk-channel closure with no pending error ends the stream
/// successfully. Cancellation always wins, and a failed downstream send
/// (client gone) stops the relay without draining the backend.
async fn relay_events(
    mut chunks: mpsc::Receiver<String>,
    mut errors: mpsc::Receiver<Report>,
    cancel: CancellationToken,
    out: mpsc::Sender<StreamEvent>,
) {
    let mut errors_open = true;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => return,

            error = errors.recv(), if errors_open => match error {
                Some(error) => {
                    let _ = out.send(StreamEvent::Error(error.to_string())).await;
                    return;
                }
                // Closed without an error: keep draining buffered chunks.
                None => errors_open = false,
            },

            chunk = chunks.recv() => match chunk {
                Some(text) => {
                    if out.send(StreamEvent::Chunk(text)).await.is_err() {
                        return;
                    }
                }
                None => {
                    if errors_open {
                        if let Ok(error) = errors.try_recv() {
                            let _ = out.send(StreamEvent::Error(error.to_string())).await;
                        }
                    }
                    return;
                }
            },
        }
    }
}
