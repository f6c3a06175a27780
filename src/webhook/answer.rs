use axum::extract::State;
use axum::Json;

use super::host::RequestHost;
use super::query::QueryPairs;
use crate::config::CallConfig;
use crate::vonage::ncco::{Action, Endpoint};
use crate::AppState;

#[derive(Debug, Default)]
pub struct AnswerParams {
    /// Call leg of the first callee, as assigned by the Voice API.
    pub uuid: Option<String>,
    /// Second callee, echoed back from the answer URL built at origination.
    pub callee2: Option<String>,
}

impl From<QueryPairs> for AnswerParams {
    fn from(query: QueryPairs) -> Self {
        Self {
            uuid: query.first("uuid"),
            callee2: query.first("callee2"),
        }
    }
}

/// Handle GET /answer_1: the first callee picked up.
///
/// Greets them, then bridges the call to the second callee.
pub async fn handle_answer(
    State(state): State<AppState>,
    host: RequestHost,
    query: QueryPairs,
) -> Json<Vec<Action>> {
    let params = AnswerParams::from(query);
    if params.callee2.is_none() || params.uuid.is_none() {
        tracing::warn!(
            uuid = ?params.uuid,
            callee2 = ?params.callee2,
            "Answer webhook missing parameters"
        );
    } else {
        tracing::info!(
            uuid = params.uuid.as_deref().unwrap_or_default(),
            callee2 = params.callee2.as_deref().unwrap_or_default(),
            "First callee answered, bridging"
        );
    }

    Json(answer_actions(
        &state.config.call,
        &host,
        params.callee2.as_deref().unwrap_or_default(),
    ))
}

/// Greeting followed by a connect to `callee2`. Always two actions.
pub fn answer_actions(call: &CallConfig, host: &RequestHost, callee2: &str) -> Vec<Action> {
    vec![
        Action::talk(&call.greeting, &call.language, call.style),
        Action::connect(
            host.https_url("/event_connect_1"),
            &call.service_phone_number,
            Endpoint::phone(callee2),
        ),
    ]
}
