use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;

/// Query string as raw key/value pairs. Never rejects: duplicate keys keep
/// their first value, and an unparsable query reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs(Vec<(String, String)>);

impl QueryPairs {
    /// First value given for `key`.
    pub fn first(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

impl<S> FromRequestParts<S> for QueryPairs
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
            Ok(Query(pairs)) => Ok(QueryPairs(pairs)),
            Err(e) => {
                tracing::warn!("Ignoring unparsable query string: {e}");
                Ok(QueryPairs::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(uri: &str) -> QueryPairs {
        let (mut parts, _) = Request::get(uri).body(()).unwrap().into_parts();
        QueryPairs::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn duplicate_key_keeps_first_value() {
        let query = extract("/answer_1?uuid=a&callee2=1&callee2=2").await;
        assert_eq!(query.first("callee2").as_deref(), Some("1"));
        assert_eq!(query.first("uuid").as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn decodes_percent_escapes() {
        let query = extract("/transfer?uuid_to_transfer=x%2Fy").await;
        assert_eq!(query.first("uuid_to_transfer").as_deref(), Some("x/y"));
    }

    #[tokio::test]
    async fn missing_query_is_empty() {
        let query = extract("/call").await;
        assert_eq!(query, QueryPairs::default());
        assert!(query.first("callee1").is_none());
    }

    #[tokio::test]
    async fn empty_value_is_present() {
        let query = extract("/call?callee1=&callee2=2").await;
        assert_eq!(query.first("callee1").as_deref(), Some(""));
    }
}
