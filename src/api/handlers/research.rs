//! Research endpoints.
//!
//! `POST /agent/research` streams staged progress events over SSE,
//! terminated by a `[DONE]` marker. `POST /agent/research/sync` runs the
//! whole workflow under the configured deadline and returns one JSON body.

use crate::{
    AppState,
    types::{AppError, ResearchOutcome, ResearchRequest, Result},
    utils::validators::sanitize_query,
};
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;

/// Stream a research run as server-sent events.
pub async fn research_stream(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    // Reject unusable queries before opening the stream.
    let query = sanitize_query(&payload.query)?;

    let events = state
        .coordinator
        .clone()
        .research_stream(query, payload.use_cache)
        .map(|step| {
            let data = serde_json::to_string(&step).unwrap_or_else(|_| "{}".to_string());
            Ok(Event::default().data(data))
        })
        .chain(futures::stream::once(async {
            Ok(Event::default().data("[DONE]"))
        }));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Run a research query synchronously under the whole-request deadline.
pub async fn research_sync(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchOutcome>> {
    let deadline = Duration::from_secs(state.config.server.request_timeout_secs);

    let outcome = tokio::time::timeout(
        deadline,
        state
            .coordinator
            .research(&payload.query, payload.use_cache, payload.generate_pdf),
    )
    .await
    .map_err(|_| {
        AppError::Timeout(
            "Research request timed out. The query is too complex or the system is overloaded."
                .to_string(),
        )
    })??;

    Ok(Json(outcome))
}
