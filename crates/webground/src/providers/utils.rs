use reqwest::StatusCode;
use serde_json::Value;

/// Human readable message of an error payload. Accepts `{"error": "..."}`,
/// `{"error": {"message": "..."}}` and a bare `{"message": "..."}`.
pub fn error_message(payload: &Value) -> Option<String> {
    let error = payload.get("error").unwrap_or(payload);

    match error {
        Value::String(message) if !message.is_empty() => Some(message.clone()),
        Value::Object(_) => error
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Message for a provider response that did not produce an event stream
pub fn describe_provider_failure(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| error_message(&payload))
        .unwrap_or_else(|| format!("Provider request failed: {}", status))
}
