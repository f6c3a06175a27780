use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;

use crate::config::CallConfig;
use crate::vonage::ncco::{Action, Endpoint};
use crate::webhook::host::{urlencoded, RequestHost};
use crate::webhook::query::QueryPairs;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TransferParams {
    pub uuid_to_transfer: Option<String>,
}

/// GET /transfer?uuid_to_transfer=..: browser trigger.
pub async fn handle_transfer_get(
    State(state): State<AppState>,
    host: RequestHost,
    query: QueryPairs,
) -> &'static str {
    start_transfer(&state, &host, query.first("uuid_to_transfer"));
    "Ok"
}

/// POST /transfer with `{"uuid_to_transfer": ".."}`: GUI trigger.
///
/// The body is parsed leniently so a malformed request still gets `Ok`.
pub async fn handle_transfer_post(
    State(state): State<AppState>,
    host: RequestHost,
    body: Bytes,
) -> &'static str {
    let params = serde_json::from_slice::<TransferParams>(&body).unwrap_or_else(|e| {
        tracing::warn!("Transfer body is not valid JSON: {e}");
        TransferParams::default()
    });
    start_transfer(&state, &host, params.uuid_to_transfer);
    "Ok"
}

/// Move call leg `uuid` onto a WebSocket to the audio processor. Fire-and-forget.
fn start_transfer(state: &AppState, host: &RequestHost, uuid: Option<String>) {
    let Some(uuid) = uuid.filter(|u| !u.is_empty()) else {
        tracing::warn!("Transfer requested without uuid_to_transfer, skipping");
        return;
    };

    let ws_uri = websocket_uri(state.config.call.processor_server.as_deref(), host, &uuid);
    tracing::info!(uuid = %uuid, ws_uri = %ws_uri, "Transferring call leg to WebSocket");

    let ncco = transfer_actions(&state.config.call, host, ws_uri);
    let vonage = state.vonage.clone();
    tokio::spawn(async move {
        match vonage.transfer_call(&uuid, &ncco).await {
            Ok(()) => tracing::info!(uuid = %uuid, "Connecting WebSocket with remote party"),
            Err(e) => tracing::error!(uuid = %uuid, "WebSocket transfer failed: {e}"),
        }
    });
}

/// `wss://<processor or own host>/socket?peer_uuid=..&webhook_url=https://<own host>/results`
pub fn websocket_uri(processor_server: Option<&str>, host: &RequestHost, uuid: &str) -> String {
    let connector_host = processor_server.unwrap_or(host.as_str());
    format!(
        "wss://{connector_host}/socket?peer_uuid={}&webhook_url={}",
        urlencoded(uuid),
        urlencoded(&host.https_url("/results"))
    )
}

pub fn transfer_actions(call: &CallConfig, host: &RequestHost, ws_uri: String) -> Vec<Action> {
    vec![Action::connect(
        host.https_url("/ws_event"),
        &call.service_phone_number,
        Endpoint::websocket(ws_uri),
    )]
}
