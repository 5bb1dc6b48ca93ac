use thiserror::Error;

/// Fallback when the service gives no usable message.
pub(crate) const GENERIC_SERVICE_ERROR: &str = "não foi possível completar a operação";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// 401 from any authenticated call; the session store has already been
    /// cleared by the time this surfaces.
    #[error("sessão expirada")]
    Unauthorized,
    #[error("{message}")]
    Service { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Pulls a human-readable message out of a service error body.
/// The service sends `{"message": "..."}"` or `{"message": ["...", "..."]}`;
/// array values are joined with `", "`.
pub(crate) fn service_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_string_message() {
        let body = r#"{"message": "valor inválido"}"#;
        assert_eq!(service_message(body).as_deref(), Some("valor inválido"));
    }

    #[test]
    fn joins_array_messages_with_comma() {
        let body = r#"{"message": ["descrição obrigatória", "valor deve ser positivo"]}"#;
        assert_eq!(
            service_message(body).as_deref(),
            Some("descrição obrigatória, valor deve ser positivo")
        );
    }

    #[test]
    fn no_message_field_yields_none() {
        assert_eq!(service_message(r#"{"error": "boom"}"#), None);
        assert_eq!(service_message("not json at all"), None);
        assert_eq!(service_message(r#"{"message": ""}"#), None);
        assert_eq!(service_message(r#"{"message": []}"#), None);
    }

    #[test]
    fn service_error_displays_its_message() {
        let err = ApiError::Service { status: 422, message: "valor inválido".to_string() };
        assert_eq!(err.to_string(), "valor inválido");
    }
}
