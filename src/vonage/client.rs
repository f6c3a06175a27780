use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ncco::{Action, Endpoint};
use crate::config::VonageConfig;
use crate::webhook::host::urlencoded;

/// Lifetime of the application JWT attached to each request.
const TOKEN_TTL_SECS: i64 = 900;

/// Vonage Voice REST API client for originating and transferring calls.
pub struct VonageClient {
    client: reqwest::Client,
    base_url: String,
    application_id: String,
    signing_key: EncodingKey,
}

/// Body of `POST /v1/calls`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCall {
    pub to: Vec<Endpoint>,
    pub from: Endpoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_timer: Option<u32>,
    pub answer_url: Vec<String>,
    pub answer_method: String,
    pub event_url: Vec<String>,
    pub event_method: String,
}

/// What the Voice API returns for a newly created call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallStatus {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub conversation_uuid: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    application_id: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
}

impl VonageClient {
    /// Build a client from config, reading the application private key from disk.
    pub fn new(config: &VonageConfig) -> Result<Self, VonageError> {
        let pem = std::fs::read(&config.private_key_path)
            .map_err(|e| VonageError::Key(format!("{}: {e}", config.private_key_path)))?;
        Self::with_key(
            &format!("https://{}", config.api_region),
            &config.application_id,
            &pem,
        )
    }

    pub fn with_key(base_url: &str, application_id: &str, pem: &[u8]) -> Result<Self, VonageError> {
        let signing_key =
            EncodingKey::from_rsa_pem(pem).map_err(|e| VonageError::Key(e.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            application_id: application_id.to_string(),
            signing_key,
        })
    }

    /// Originate a call. The Voice API fetches `answer_url` once the callee picks up.
    pub async fn create_call(&self, call: &CreateCall) -> Result<CallStatus, VonageError> {
        let url = format!("{}/v1/calls", self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .json(call)
            .send()
            .await
            .map_err(|e| VonageError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(VonageError::Api(format!("{status}: {body}")));
        }

        resp.json()
            .await
            .map_err(|e| VonageError::Request(e.to_string()))
    }

    /// Replace the remaining call flow of call leg `uuid` with `ncco`.
    pub async fn transfer_call(&self, uuid: &str, ncco: &[Action]) -> Result<(), VonageError> {
        // Call leg ids are opaque; keep them a single path segment
        let url = format!("{}/v1/calls/{}", self.base_url, urlencoded(uuid));

        let body = json!({
            "action": "transfer",
            "destination": {
                "type": "ncco",
                "ncco": ncco,
            },
        });

        let resp = self
            .client
            .put(&url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| VonageError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(VonageError::Api(format!("{status}: {body}")));
        }

        Ok(())
    }

    fn token(&self) -> Result<String, VonageError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            application_id: &self.application_id,
            iat,
            exp: iat + TOKEN_TTL_SECS,
            jti: random_jti(),
        };
        Ok(encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.signing_key,
        )?)
    }
}

fn random_jti() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum VonageError {
    #[error("Invalid application private key: {0}")]
    Key(String),
    #[error("Failed to sign API token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("HTTP request failed: {0}")]
    Request(String),
    #[error("Vonage API error: {0}")]
    Api(String),
}
