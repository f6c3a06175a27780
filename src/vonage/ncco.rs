use serde::Serialize;

/// Content type the Voice API expects for raw audio over a WebSocket endpoint.
pub const WEBSOCKET_AUDIO_CONTENT_TYPE: &str = "audio/l16;rate=16000";

/// One instruction in a call-control action list (NCCO).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Talk {
        text: String,
        language: String,
        style: u32,
    },
    Connect {
        #[serde(rename = "eventUrl")]
        event_url: Vec<String>,
        from: String,
        endpoint: Vec<Endpoint>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Endpoint {
    Phone {
        number: String,
    },
    Websocket {
        uri: String,
        #[serde(rename = "content-type")]
        content_type: String,
        headers: serde_json::Map<String, serde_json::Value>,
    },
}

impl Action {
    pub fn talk(text: &str, language: &str, style: u32) -> Self {
        Action::Talk {
            text: text.to_string(),
            language: language.to_string(),
            style,
        }
    }

    pub fn connect(event_url: String, from: &str, endpoint: Endpoint) -> Self {
        Action::Connect {
            event_url: vec![event_url],
            from: from.to_string(),
            endpoint: vec![endpoint],
        }
    }
}

impl Endpoint {
    pub fn phone(number: &str) -> Self {
        Endpoint::Phone {
            number: number.to_string(),
        }
    }

    /// A raw-audio WebSocket endpoint with no extra headers.
    pub fn websocket(uri: String) -> Self {
        Endpoint::Websocket {
            uri,
            content_type: WEBSOCKET_AUDIO_CONTENT_TYPE.to_string(),
            headers: serde_json::Map::new(),
        }
    }
}
