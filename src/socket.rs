use axum::extract::ws::{Message, WebSocket};
use axum::extract::WebSocketUpgrade;
use axum::response::IntoResponse;
use tracing::Instrument;

use crate::webhook::query::QueryPairs;

/// WebSocket upgrade handler for GET /socket.
///
/// Accepts every connection. Audio processing belongs to the external
/// processor; this endpoint only logs what the Voice API sends.
pub async fn handle_socket_upgrade(
    ws: WebSocketUpgrade,
    query: QueryPairs,
) -> impl IntoResponse {
    let peer_uuid = query.first("peer_uuid").unwrap_or_else(|| "-".to_string());
    let span = tracing::info_span!("socket", peer_uuid = %peer_uuid);
    ws.on_upgrade(move |socket| handle_socket(socket).instrument(span))
}

async fn handle_socket(mut socket: WebSocket) {
    tracing::info!("Vonage WebSocket connected");

    let mut audio_frames: u64 = 0;
    let mut audio_bytes: u64 = 0;

    // Keep reading after a close frame so the close handshake completes
    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Text(text)) => {
                tracing::info!(text = %text.as_str(), "Vonage WebSocket text message");
            }
            Ok(Message::Binary(data)) => {
                audio_frames += 1;
                audio_bytes += data.len() as u64;
            }
            Ok(Message::Close(frame)) => {
                tracing::debug!(code = ?frame.map(|f| f.code), "Close frame received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("WebSocket error: {e}");
                break;
            }
        }
    }

    tracing::info!(audio_frames, audio_bytes, "Vonage WebSocket closed");
}
