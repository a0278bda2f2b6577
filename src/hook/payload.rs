//! Webhook payload decoding
//!
//! Push notifications carry far more than pmg needs. Only
//! `repository.full_name` is read, and it is validated once here so the rest
//! of the crate can rely on a well-formed `<org>/<repo>`.

use serde::Deserialize;
use thiserror::Error;

/// Errors that make a webhook body unusable.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Body is not JSON, or not a JSON object
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No `repository` object in the payload
    #[error("missing repository information in payload")]
    MissingRepository,

    /// `repository.full_name` is absent or empty
    #[error("missing repository.full_name in payload")]
    MissingFullName,

    /// `repository.full_name` is not a relative `<org>/<repo>` path
    #[error("invalid repository.full_name '{0}'")]
    InvalidFullName(String),
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    repository: Option<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    full_name: Option<String>,
}

/// Decoded and validated push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookPayload {
    full_name: String,
}

impl WebhookPayload {
    /// Decode a webhook request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let raw: RawPayload = serde_json::from_slice(body)?;
        let full_name = raw
            .repository
            .ok_or(PayloadError::MissingRepository)?
            .full_name
            .filter(|name| !name.is_empty())
            .ok_or(PayloadError::MissingFullName)?;

        Self::new(full_name)
    }

    /// Build a payload for `full_name`, validating it the same way as a
    /// decoded body.
    pub fn new(full_name: impl Into<String>) -> Result<Self, PayloadError> {
        let full_name = full_name.into();
        if !is_valid_full_name(&full_name) {
            return Err(PayloadError::InvalidFullName(full_name));
        }
        Ok(Self { full_name })
    }

    /// `<org>/<repo>`
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

/// The name is joined onto the repository root, so every segment must be a
/// plain, non-empty path component.
fn is_valid_full_name(full_name: &str) -> bool {
    full_name.contains('/')
        && full_name
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_full_name() {
        let body = br#"{"ref":"refs/heads/master","repository":{"name":"apache","full_name":"acme/apache","private":true}}"#;
        let payload = WebhookPayload::from_slice(body).unwrap();
        assert_eq!(payload.full_name(), "acme/apache");
    }

    #[test]
    fn test_rejects_invalid_json() {
        assert!(matches!(
            WebhookPayload::from_slice(b"not json"),
            Err(PayloadError::InvalidJson(_))
        ));
        assert!(matches!(
            WebhookPayload::from_slice(b"[1, 2]"),
            Err(PayloadError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_rejects_missing_repository() {
        assert!(matches!(
            WebhookPayload::from_slice(br#"{"zen":"Keep it logically awesome."}"#),
            Err(PayloadError::MissingRepository)
        ));
        assert!(matches!(
            WebhookPayload::from_slice(br#"{"repository":null}"#),
            Err(PayloadError::MissingRepository)
        ));
    }

    #[test]
    fn test_rejects_missing_full_name() {
        assert!(matches!(
            WebhookPayload::from_slice(br#"{"repository":{"name":"apache"}}"#),
            Err(PayloadError::MissingFullName)
        ));
        assert!(matches!(
            WebhookPayload::from_slice(br#"{"repository":{"full_name":""}}"#),
            Err(PayloadError::MissingFullName)
        ));
    }

    #[test]
    fn test_rejects_wrongly_typed_full_name() {
        assert!(matches!(
            WebhookPayload::from_slice(br#"{"repository":{"full_name":7}}"#),
            Err(PayloadError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_rejects_unsafe_full_names() {
        for name in ["apache", "acme/", "/acme/apache", "acme/../etc", "acme/./x", "acme//x", "acme\\x/y"] {
            assert!(
                matches!(WebhookPayload::new(name), Err(PayloadError::InvalidFullName(_))),
                "accepted {name}"
            );
        }
    }

    #[test]
    fn test_accepts_nested_groups() {
        assert!(WebhookPayload::new("group/subgroup/apache").is_ok());
    }
}
