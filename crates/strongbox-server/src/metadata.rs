//! Per-call metadata.

use crate::error::ServiceError;
use crate::ServiceResult;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::fmt;
use strongbox_core::wire::metadata::{AUTHORIZATION, SECRET_KEY, USER_ID};

/// Call metadata: lowercased key/value pairs taken from request headers.
#[derive(Clone, Default)]
pub struct Metadata {
    entries: HashMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect headers. Non-UTF-8 values are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let entries = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        Self { entries }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Token from `authorization`, with an optional `Bearer ` prefix removed.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.get(AUTHORIZATION)?.trim();
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .unwrap_or(value)
            .trim();
        (!token.is_empty()).then_some(token)
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if key == AUTHORIZATION || key == SECRET_KEY {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// What a handler sees of the call besides its parameters.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    metadata: Metadata,
}

impl CallContext {
    pub fn new(metadata: Metadata) -> Self {
        Self { metadata }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Authenticated user, set by the dispatcher after token validation.
    pub fn user_id(&self) -> ServiceResult<&str> {
        self.metadata
            .get(USER_ID)
            .filter(|id| !id.is_empty())
            .ok_or(ServiceError::Unauthenticated)
    }

    /// Envelope passphrase for this call.
    pub fn secret_key(&self) -> ServiceResult<&str> {
        self.metadata
            .get(SECRET_KEY)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ServiceError::invalid("secretkey metadata is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("SecretKey", HeaderValue::from_static("k1"));

        let md = Metadata::from_headers(&headers);
        assert_eq!(md.get("secretkey"), Some("k1"));
        assert_eq!(md.bearer_token(), Some("abc"));
    }

    #[test]
    fn test_bearer_token_forms() {
        let md = Metadata::new().with(AUTHORIZATION, "abc");
        assert_eq!(md.bearer_token(), Some("abc"));

        let md = Metadata::new().with(AUTHORIZATION, "Bearer ");
        assert_eq!(md.bearer_token(), None);

        assert_eq!(Metadata::new().bearer_token(), None);
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let md = Metadata::new()
            .with(AUTHORIZATION, "Bearer abc")
            .with(SECRET_KEY, "k1");
        let debug = format!("{:?}", md);
        assert!(!debug.contains("abc"));
        assert!(!debug.contains("k1"));
    }

    #[test]
    fn test_call_context_accessors() {
        let ctx = CallContext::new(Metadata::new());
        assert!(matches!(ctx.user_id(), Err(ServiceError::Unauthenticated)));
        assert!(matches!(
            ctx.secret_key(),
            Err(ServiceError::InvalidArgument(_))
        ));

        let ctx = CallContext::new(
            Metadata::new()
                .with(USER_ID, "alice")
                .with(SECRET_KEY, "k1"),
        );
        assert_eq!(ctx.user_id().unwrap(), "alice");
        assert_eq!(ctx.secret_key().unwrap(), "k1");
    }
}
