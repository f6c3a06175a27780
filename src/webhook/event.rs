use axum::body::Bytes;

/// Handle POST /event_1, /event_connect_1 and /ws_event.
///
/// The Voice API only needs a 2xx so its webhook delivery succeeds; the
/// payload is not inspected.
pub async fn handle_event() -> &'static str {
    "Ok"
}

/// Handle POST /results: out-of-band results from the audio processor.
///
/// The body is logged as received, whatever its content type.
pub async fn handle_results(body: Bytes) -> &'static str {
    tracing::info!(results = %String::from_utf8_lossy(&body), "Processor results");
    "Ok"
}
