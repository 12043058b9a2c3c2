use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{
        header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
        HeaderName, HeaderValue,
    },
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt};
use std::convert::Infallible;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;
use webground::models::search::CITATION_HEADER;
use webground::orchestrator::{parse_request, RelayResponse};

/// Event-stream response that carries the citation header and cancels the
/// request's work once the client stops reading.
pub struct SseResponse {
    citations: String,
    stream: BoxStream<'static, Bytes>,
    guard: DropGuard,
}

impl SseResponse {
    fn new(response: RelayResponse, guard: DropGuard) -> Self {
        Self {
            citations: response.citation_header(),
            stream: response.stream,
            guard,
        }
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let guard = self.guard;
        let stream = self.stream.map(move |chunk| {
            // Dropped together with the body
            let _guard = &guard;
            Ok::<_, Infallible>(chunk)
        });

        let citations = HeaderValue::from_str(&self.citations)
            .unwrap_or_else(|_| HeaderValue::from_static("[]"));

        let mut response = Response::new(Body::from_stream(stream));
        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream; charset=utf-8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(HeaderName::from_static(CITATION_HEADER), citations);
        response
    }
}

async fn handler(State(state): State<AppState>, body: Bytes) -> Result<SseResponse, ApiError> {
    let request = parse_request(&body)?;

    // Cancelled when this future or the response body is dropped
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let response = state.orchestrator.respond(request, cancel).await?;
    debug!(sources = response.sources.len(), "streaming completion");
    Ok(SseResponse::new(response, guard))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(handler))
        .with_state(state)
}
