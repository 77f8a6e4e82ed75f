use std::collections::BTreeMap;

use serde::Deserialize;

// The map form must be listed last so a `{"error": "..."}` object
// resolves untagged as a message, not a field map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    Message(MessageBody),
    Fields(BTreeMap<String, Messages>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageBody {
    #[serde(alias = "error", alias = "detail", alias = "message")]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Messages {
    One(String),
    Many(Vec<String>),
}

impl Messages {
    fn into_vec(self) -> Vec<String> {
        match self {
            Messages::One(message) => vec![message],
            Messages::Many(messages) => messages,
        }
    }
}

// The map is ordered so the "first" field is deterministic regardless
// of the serialization order the server used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_message(&self) -> Option<&str> {
        self.fields
            .values()
            .flat_map(|messages| messages.iter())
            .next()
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

impl From<BTreeMap<String, Messages>> for FieldErrors {
    fn from(raw: BTreeMap<String, Messages>) -> Self {
        let fields = raw
            .into_iter()
            .map(|(field, messages)| (field, messages.into_vec()))
            .collect();
        Self { fields }
    }
}

impl From<BTreeMap<String, Vec<String>>> for FieldErrors {
    fn from(fields: BTreeMap<String, Vec<String>>) -> Self {
        Self { fields }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_field_map_with_message_lists() {
        let raw = r#"{"email_id": ["Invalid email format"], "name": ["Required"]}"#;
        let payload: ErrorPayload = serde_json::from_str(raw).expect("field map");
        let ErrorPayload::Fields(fields) = payload else {
            panic!("expected field map");
        };
        let errors = FieldErrors::from(fields);
        assert_eq!(errors.messages("email_id"), ["Invalid email format"]);
        assert_eq!(errors.first_message(), Some("Invalid email format"));
    }

    #[test]
    fn decodes_single_message_values() {
        let raw = r#"{"phone": "Too short"}"#;
        let payload: ErrorPayload = serde_json::from_str(raw).expect("field map");
        let ErrorPayload::Fields(fields) = payload else {
            panic!("expected field map");
        };
        let errors = FieldErrors::from(fields);
        assert_eq!(errors.messages("phone"), ["Too short"]);
    }

    #[test]
    fn decodes_detail_message_body() {
        let raw = r#"{"detail": "Not found"}"#;
        let payload: ErrorPayload = serde_json::from_str(raw).expect("message body");
        let ErrorPayload::Message(body) = payload else {
            panic!("expected message body");
        };
        assert_eq!(body.text, "Not found");
    }

    #[test]
    fn first_message_orders_fields_lexicographically() {
        let mut fields = BTreeMap::new();
        fields.insert("zip".to_string(), vec!["Bad zip".to_string()]);
        fields.insert("city".to_string(), vec!["Bad city".to_string()]);
        let errors = FieldErrors::from(fields);
        assert_eq!(errors.first_message(), Some("Bad city"));
    }
}
