//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};
use serde_json::Value;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body logged at the `debug` level. Password fields in JSON
/// request bodies are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    if headers.headers.get(CONTENT_TYPE).is_some_and(|content_type| {
        content_type
            .to_str()
            .is_ok_and(|content_type| content_type.starts_with("application/json"))
    }) {
        log_request(&headers, &redact_password(&body_text));
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

fn redact_password(body_text: &str) -> String {
    let Ok(mut body) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    if let Some(object) = body.as_object_mut() {
        for field in ["password", "currentPassword", "newPassword"] {
            if let Some(value) = object.get_mut(field) {
                *value = Value::String("********".to_owned());
            }
        }
    }

    body.to_string()
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Truncate `body` to at most [LOG_BODY_LENGTH_LIMIT] bytes, walking back
/// to a character boundary so that a multi-byte character straddling the
/// limit does not split.
fn truncate_body(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            truncate_body(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            truncate_body(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}


#[cfg(test)]
mod truncate_body_tests {
    use super::{LOG_BODY_LENGTH_LIMIT, truncate_body};

    #[test]
    fn cuts_at_the_length_limit() {
        let body = "a".repeat(100);

        assert_eq!(truncate_body(&body).len(), LOG_BODY_LENGTH_LIMIT);
    }

    #[test]
    fn backs_off_a_multi_byte_character_straddling_the_limit() {
        // 'é' is two bytes, occupying bytes 63..65.
        let body = format!("{}é{}", "a".repeat(63), "b".repeat(40));

        let truncated = truncate_body(&body);

        assert_eq!(truncated, "a".repeat(63));
    }

    #[test]
    fn keeps_short_bodies_whole() {
        assert_eq!(truncate_body("short"), "short");
    }
}
