//! Map image handlers.
//!
//! - `GET /map.png`: render the viewport described by the query
//! - `GET /parcels/:x/:y/map.png`: render around one parcel, selecting it

use std::io;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::channel::mpsc;
use futures::executor::block_on;
use futures::SinkExt;
use tracing::{debug, instrument};

use parcel_common::MapError;
use renderer::PngStream;

use crate::state::AppState;
use crate::validation::RawParams;

/// GET /map.png
#[instrument(skip(state))]
pub async fn map_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<RawParams>,
) -> Response {
    match state.tiles.render_map(&params).await {
        Ok(stream) => png_response(stream),
        Err(e) => error_response(&e),
    }
}

/// GET /parcels/:x/:y/map.png
///
/// Path segments are validated like the `x`/`y` query parameters, which they
/// replace.
#[instrument(skip(state))]
pub async fn parcel_map_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((x, y)): Path<(String, String)>,
    Query(params): Query<RawParams>,
) -> Response {
    let params = RawParams {
        x: Some(x),
        y: Some(y),
        ..params
    };

    match state.tiles.render_parcel(&params).await {
        Ok(stream) => png_response(stream),
        Err(e) => error_response(&e),
    }
}

/// Capacity of the chunk channel between the encoder and the response body.
const CHUNK_BUFFER: usize = 1;

/// Stream PNG chunks to the client as the encoder produces them.
///
/// Compression runs on the blocking pool. The bounded channel means the next
/// row batch is only compressed once the body has taken the previous one, and
/// encoding stops when the client goes away.
pub fn png_response(stream: PngStream) -> Response {
    let (mut tx, rx) = mpsc::channel::<io::Result<Bytes>>(CHUNK_BUFFER);

    tokio::task::spawn_blocking(move || {
        for chunk in stream {
            let failed = chunk.is_err();
            if block_on(tx.send(chunk.map(Bytes::from))).is_err() {
                debug!("Client dropped map response, stopping encoder");
                return;
            }
            if failed {
                return;
            }
        }
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        Body::from_stream(rx),
    )
        .into_response()
}

/// Plain-text error body with the status for the error kind.
pub fn error_response(err: &MapError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        err.to_string(),
    )
        .into_response()
}
