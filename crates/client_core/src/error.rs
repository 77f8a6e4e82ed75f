use shared::error::FieldErrors;
use thiserror::Error;

use crate::transport::TransportError;

// Transport errors never carry a status; everything else came back
// over HTTP.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("malformed payload: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation(fields) => Some(fields),
            _ => None,
        }
    }

    // Validation picks the first field's first message.
    pub fn toast_text(&self) -> String {
        match self {
            ApiError::Validation(fields) => fields
                .first_message()
                .unwrap_or("Validation failed")
                .to_string(),
            ApiError::Transport(err) => err.to_string(),
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Decode(_) => "Unexpected response from server".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn validation_toast_uses_first_field_message() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "email_id".to_string(),
            vec!["Invalid email format".to_string()],
        );
        fields.insert("name".to_string(), vec!["Required".to_string()]);
        let err = ApiError::Validation(FieldErrors::from(fields));
        assert_eq!(err.toast_text(), "Invalid email format");
        assert!(err.field_errors().is_some());
    }

    #[test]
    fn server_toast_passes_the_message_through() {
        let err = ApiError::Server {
            status: 500,
            message: "maintenance window".to_string(),
        };
        assert_eq!(err.toast_text(), "maintenance window");
        assert!(err.field_errors().is_none());
    }
}
