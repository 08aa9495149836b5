//! Inbound webhook signature handling.
//!
//! Neither GlitchTip nor Better Stack documents a signing scheme we can
//! verify against, so every request is accepted. The header is still read and
//! logged so that verification can be slotted in here without touching the
//! request handler.

use axum::http::HeaderMap;
use tracing::debug;

use crate::models::Provider;

/// Signature header value for `provider`, if the request carried one.
#[must_use]
pub fn signature_header(headers: &HeaderMap, provider: Provider) -> Option<String> {
    headers
        .get(provider.signature_header())
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Validate a webhook signature.
///
/// Always returns `true`.
// TODO: verify HMAC once GlitchTip or Better Stack publish a signing scheme.
#[must_use]
pub fn validate_webhook_signature(
    provider: Provider,
    _body: &[u8],
    signature: Option<&str>,
    secret: Option<&str>,
) -> bool {
    match (secret, signature) {
        (None, _) => debug!(provider = %provider, "No webhook secret configured, skipping validation"),
        (Some(_), None) => debug!(provider = %provider, "Webhook secret configured but request is unsigned"),
        (Some(_), Some(_)) => debug!(provider = %provider, "Signature present, verification not implemented"),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_signature_header_per_provider() {
        let mut headers = HeaderMap::new();
        headers.insert("x-betterstack-signature", HeaderValue::from_static("abc123"));

        assert_eq!(
            signature_header(&headers, Provider::BetterStack).as_deref(),
            Some("abc123")
        );
        assert!(signature_header(&headers, Provider::GlitchTip).is_none());
    }

    #[test]
    fn test_validation_is_permissive() {
        let body = br#"{"event":{}}"#;
        assert!(validate_webhook_signature(Provider::GlitchTip, body, None, None));
        assert!(validate_webhook_signature(Provider::GlitchTip, body, None, Some("secret")));
        assert!(validate_webhook_signature(
            Provider::BetterStack,
            body,
            Some("not-a-real-signature"),
            Some("secret")
        ));
    }
}
