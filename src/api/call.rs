use axum::extract::State;

use crate::config::CallConfig;
use crate::vonage::client::CreateCall;
use crate::vonage::ncco::Endpoint;
use crate::webhook::host::{urlencoded, RequestHost};
use crate::webhook::query::QueryPairs;
use crate::AppState;

/// Body returned when either callee is absent. Still a 200: callers of this
/// demo endpoint read the body, not the status.
pub const MISSING_CALLEES: &str =
    "\"callee1\" or \"callee2\" number missing as query parameter - please check";

#[derive(Debug, Default)]
pub struct CallParams {
    pub callee1: Option<String>,
    pub callee2: Option<String>,
}

impl From<QueryPairs> for CallParams {
    fn from(query: QueryPairs) -> Self {
        Self {
            callee1: query.first("callee1"),
            callee2: query.first("callee2"),
        }
    }
}

/// GET /call?callee1=..&callee2=..: call callee1, then bridge them to callee2.
///
/// Replies before the Voice API does; the outcome of the origination is only
/// visible in the logs.
pub async fn handle_call(
    State(state): State<AppState>,
    host: RequestHost,
    query: QueryPairs,
) -> &'static str {
    let params = CallParams::from(query);
    let (Some(callee1), Some(callee2)) = (params.callee1, params.callee2) else {
        tracing::warn!("Call request missing callee1 or callee2");
        return MISSING_CALLEES;
    };

    tracing::info!(to = %callee1, callee2 = %callee2, host = %host.as_str(), "Outbound call requested");

    let call = origination_request(&state.config.call, &host, &callee1, &callee2);
    let vonage = state.vonage.clone();
    tokio::spawn(async move {
        match vonage.create_call(&call).await {
            Ok(status) => tracing::info!(
                to = %callee1,
                uuid = %status.uuid,
                status = %status.status,
                direction = %status.direction,
                conversation_uuid = %status.conversation_uuid,
                "Outgoing PSTN call initiated"
            ),
            Err(e) => tracing::error!(to = %callee1, "Outgoing PSTN call failed: {e}"),
        }
    });

    "Ok"
}

/// Call descriptor for callee1. Both callback URLs carry callee2 so the answer
/// webhook knows who to bridge to.
pub fn origination_request(
    call: &CallConfig,
    host: &RequestHost,
    callee1: &str,
    callee2: &str,
) -> CreateCall {
    let callee2 = urlencoded(callee2);
    CreateCall {
        to: vec![Endpoint::phone(callee1)],
        from: Endpoint::phone(&call.service_phone_number),
        length_timer: call.max_call_duration,
        answer_url: vec![host.https_url(&format!("/answer_1?callee2={callee2}"))],
        answer_method: "GET".to_string(),
        event_url: vec![host.https_url(&format!("/event_1?callee2={callee2}"))],
        event_method: "POST".to_string(),
    }
}
