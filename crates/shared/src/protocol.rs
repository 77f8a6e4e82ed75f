use serde::{Deserialize, Serialize};

pub const TOTAL_PAGES_HEADER: &str = "total-pages";
pub const CURRENT_PAGE_HEADER: &str = "current-page";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

// The envelope variant must come first so untagged resolution does not
// swallow objects as failed arrays.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Envelope(ResultsEnvelope<T>),
    Bare(Vec<T>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsEnvelope<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: Option<usize>,
    #[serde(default)]
    pub current_page: Option<usize>,
}

impl<T> ListPayload<T> {
    pub fn into_parts(self) -> (Vec<T>, Option<usize>, Option<usize>) {
        match self {
            ListPayload::Envelope(envelope) => (
                envelope.results,
                envelope.total_pages,
                envelope.current_page,
            ),
            ListPayload::Bare(items) => (items, None, None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub total_pages: usize,
    pub current_page: usize,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            total_pages: 1,
            current_page: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_array_payload() {
        let payload: ListPayload<i64> = serde_json::from_str("[1, 2, 3]").expect("bare array");
        let (items, total, current) = payload.into_parts();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(total, None);
        assert_eq!(current, None);
    }

    #[test]
    fn decodes_results_envelope_payload() {
        let raw = r#"{"results": [10, 20], "total_pages": 4, "current_page": 2}"#;
        let payload: ListPayload<i64> = serde_json::from_str(raw).expect("envelope");
        let (items, total, current) = payload.into_parts();
        assert_eq!(items, vec![10, 20]);
        assert_eq!(total, Some(4));
        assert_eq!(current, Some(2));
    }

    #[test]
    fn envelope_counts_are_optional() {
        let raw = r#"{"results": []}"#;
        let payload: ListPayload<i64> = serde_json::from_str(raw).expect("envelope");
        let (items, total, current) = payload.into_parts();
        assert!(items.is_empty());
        assert_eq!(total, None);
        assert_eq!(current, None);
    }
}
