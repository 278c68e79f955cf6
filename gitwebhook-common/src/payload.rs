use std::borrow::Cow;

use percent_encoding::percent_decode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::event::{InboundEvent, Provider};

const FORM_PAYLOAD_MARKER: &[u8] = b"payload=";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("could not read body data: {0}")]
    BodyRead(String),
    #[error("could not decode form payload: {0}")]
    FormPayload(String),
    #[error("could not unmarshal struct: {0}")]
    Unmarshal(#[from] serde_json::Error),
}

/// Webhooks configured with the `application/x-www-form-urlencoded` content type send the
/// JSON document in a single `payload` field.
#[derive(Deserialize)]
struct WebhookFormData {
    payload: String,
}

/// Decode a webhook body into the configured provider's payload.
pub fn parse_event(
    provider: Provider,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<InboundEvent, DecodeError> {
    match provider {
        Provider::Github => decode_payload(content_type, body).map(InboundEvent::Github),
        Provider::Gitea => decode_payload(content_type, body).map(InboundEvent::Gitea),
    }
}

pub fn decode_payload<T: DeserializeOwned>(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<T, DecodeError> {
    let json = extract_json(content_type, body)?;
    tracing::trace!("input data {}", String::from_utf8_lossy(&json));

    Ok(serde_json::from_slice(&json)?)
}

/// Find the JSON document in a webhook body.
///
/// The content type decides when it is known. Without one, a body containing `payload=` is
/// taken to be form encoded.
pub fn extract_json<'a>(
    content_type: Option<&str>,
    body: &'a [u8],
) -> Result<Cow<'a, [u8]>, DecodeError> {
    if body.is_empty() {
        return Err(DecodeError::BodyRead("empty body".to_owned()));
    }

    let base_content_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match base_content_type.as_str() {
        "application/x-www-form-urlencoded" => {
            let form: WebhookFormData = serde_urlencoded::from_bytes(body).map_err(|e| {
                tracing::debug!("failed to decode form data: {}", e);
                DecodeError::FormPayload(e.to_string())
            })?;
            Ok(Cow::Owned(form.payload.into_bytes()))
        }
        "application/json" => Ok(Cow::Borrowed(body)),
        _ if contains_form_marker(body) => decode_form_remainder(body).map(Cow::Owned),
        _ => Ok(Cow::Borrowed(body)),
    }
}

fn contains_form_marker(body: &[u8]) -> bool {
    body.windows(FORM_PAYLOAD_MARKER.len())
        .any(|window| window == FORM_PAYLOAD_MARKER)
}

/// Everything after the first `=` is the encoded document. Decoding the whole remainder keeps
/// any `=` inside the JSON intact.
fn decode_form_remainder(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let remainder = match body.iter().position(|b| *b == b'=') {
        Some(index) => &body[index + 1..],
        None => body,
    };

    // `+` is a space in form encoding, and must be replaced before `%2B` turns into one.
    let spaced: Vec<u8> = remainder
        .iter()
        .map(|b| if *b == b'+' { b' ' } else { *b })
        .collect();

    let decoded = percent_decode(&spaced).decode_utf8().map_err(|e| {
        tracing::debug!("failed to URL decode form data: {}", e);
        DecodeError::FormPayload(e.to_string())
    })?;

    Ok(decoded.into_owned().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RepositoryEvent;
    use crate::github::GithubEvent;

    const MERGED_JSON: &str = r#"{"action":"closed","pull_request":{"merged":true,"title":"a=b & c+d","merge_commit_sha":"abc123"},"repository":{"name":"svc","clone_url":"https://git.example.com/svc.git"}}"#;

    fn form_encode(json: &str) -> String {
        serde_urlencoded::to_string([("payload", json)]).unwrap()
    }

    #[test]
    fn test_json_body() {
        let event = parse_event(
            Provider::Github,
            Some("application/json"),
            MERGED_JSON.as_bytes(),
        )
        .unwrap();

        assert_eq!(event.action(), "closed");
        assert_eq!(event.pull_request().title, "a=b & c+d");
    }

    #[test]
    fn test_json_body_without_content_type() {
        let event = parse_event(Provider::Github, None, MERGED_JSON.as_bytes()).unwrap();

        assert!(event.is_merged());
    }

    #[test]
    fn test_form_body_with_content_type() {
        let body = form_encode(MERGED_JSON);

        let event = parse_event(
            Provider::Github,
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            body.as_bytes(),
        )
        .unwrap();

        assert_eq!(event.pull_request().title, "a=b & c+d");
        assert_eq!(event.pull_request().merge_commit_sha, "abc123");
    }

    #[test]
    fn test_form_body_detected_without_content_type() {
        let body = form_encode(MERGED_JSON);

        let event: GithubEvent = decode_payload(None, body.as_bytes()).unwrap();

        assert_eq!(event.pull_request.title, "a=b & c+d");
        assert_eq!(
            event.repository.clone_url,
            "https://git.example.com/svc.git"
        );
    }

    #[test]
    fn test_form_remainder_keeps_unencoded_equals() {
        // Senders that only escape the bare minimum still decode: the first `=` splits, the
        // rest belongs to the value.
        let body = r#"payload={"action":"opened","pull_request":{"title":"x=1+%2B+y"}}"#;

        let event: GithubEvent = decode_payload(Some("text/plain"), body.as_bytes()).unwrap();

        assert_eq!(event.action, "opened");
        assert_eq!(event.pull_request.title, "x=1 + y");
    }

    #[test]
    fn test_json_content_type_skips_form_heuristic() {
        let body = r#"{"action":"opened","pull_request":{"title":"payload=not a form"}}"#;

        let content_type = Some("application/json");
        let event: GithubEvent = decode_payload(content_type, body.as_bytes()).unwrap();

        assert_eq!(event.pull_request.title, "payload=not a form");
    }

    #[test]
    fn test_empty_body() {
        let err = decode_payload::<GithubEvent>(None, b"").unwrap_err();

        assert!(matches!(err, DecodeError::BodyRead(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = decode_payload::<GithubEvent>(None, b"{ bad json").unwrap_err();

        assert!(matches!(err, DecodeError::Unmarshal(_)));
        assert!(err.to_string().starts_with("could not unmarshal struct"));
    }

    #[test]
    fn test_form_without_payload_field() {
        let err = decode_payload::<GithubEvent>(
            Some("application/x-www-form-urlencoded"),
            b"data=%7B%7D",
        )
        .unwrap_err();

        assert!(matches!(err, DecodeError::FormPayload(_)));
    }

    #[test]
    fn test_form_with_invalid_utf8() {
        let err = decode_payload::<GithubEvent>(None, b"payload=%FF%FE").unwrap_err();

        assert!(matches!(err, DecodeError::FormPayload(_)));
    }

    #[test]
    fn test_gitea_provider() {
        let body = r#"{"secret":"s3cret","action":"published","release":{"prerelease":true}}"#;

        let event = parse_event(Provider::Gitea, None, body.as_bytes()).unwrap();

        assert_eq!(event.provider(), Provider::Gitea);
        assert_eq!(event.secret(), Some("s3cret"));
        assert!(event.is_prerelease());
    }
}
