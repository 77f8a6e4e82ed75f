use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use shared::{
    error::{ErrorPayload, FieldErrors},
    protocol::{
        ListPayload, LoginRequest, LoginResponse, PageMeta, CURRENT_PAGE_HEADER,
        TOTAL_PAGES_HEADER,
    },
};

use crate::{
    error::ApiError,
    transport::{Method, MultipartField, RawResponse, RequestBody, Transport, TransportRequest},
};

// `meta` is always normalized: `total_pages >= 1` and `current_page`
// within `[1, total_pages]`.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: RwLock::new(None),
        }
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn login(&self, email_id: &str, password: &str) -> Result<String, ApiError> {
        let body = encode_body(&LoginRequest {
            email_id: email_id.to_string(),
            password: password.to_string(),
        })?;
        let response = self
            .send(Method::Post, "/login", Vec::new(), RequestBody::Json(body))
            .await?;
        if !response.is_success() {
            return Err(classify_failure(&response));
        }
        let body: LoginResponse = decode_body(&response)?;
        self.set_token(Some(body.token.clone())).await;
        Ok(body.token)
    }

    // Pagination metadata: headers first, then envelope counts, then a
    // single page.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Page<T>, ApiError> {
        let response = self
            .send(Method::Get, path, query.to_vec(), RequestBody::Empty)
            .await?;
        if !response.is_success() {
            return Err(classify_failure(&response));
        }

        let payload: ListPayload<T> = decode_body(&response)?;
        let (items, envelope_total, envelope_current) = payload.into_parts();
        let total_pages = header_count(&response, TOTAL_PAGES_HEADER)
            .or(envelope_total)
            .unwrap_or(1)
            .max(1);
        let current_page = header_count(&response, CURRENT_PAGE_HEADER)
            .or(envelope_current)
            .unwrap_or(1)
            .clamp(1, total_pages);

        Ok(Page {
            items,
            meta: PageMeta {
                total_pages,
                current_page,
            },
        })
    }

    pub async fn fetch_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .send(Method::Get, path, Vec::new(), RequestBody::Empty)
            .await?;
        if !response.is_success() {
            return Err(classify_failure(&response));
        }
        decode_body(&response)
    }

    pub async fn create(&self, path: &str, record: &impl Serialize) -> Result<(), ApiError> {
        let body = encode_body(record)?;
        let response = self
            .send(Method::Post, path, Vec::new(), RequestBody::Json(body))
            .await?;
        if !response.is_success() {
            return Err(classify_failure(&response));
        }
        Ok(())
    }

    pub async fn update(&self, path: &str, record: &impl Serialize) -> Result<(), ApiError> {
        let body = encode_body(record)?;
        let response = self
            .send(Method::Put, path, Vec::new(), RequestBody::Json(body))
            .await?;
        if !response.is_success() {
            return Err(classify_failure(&response));
        }
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .send(Method::Delete, path, Vec::new(), RequestBody::Empty)
            .await?;
        if !response.is_success() {
            return Err(classify_failure(&response));
        }
        Ok(())
    }

    pub async fn upload(&self, path: &str, fields: Vec<MultipartField>) -> Result<(), ApiError> {
        let response = self
            .send(Method::Post, path, Vec::new(), RequestBody::Multipart(fields))
            .await?;
        if !response.is_success() {
            return Err(classify_failure(&response));
        }
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: RequestBody,
    ) -> Result<RawResponse, ApiError> {
        let bearer_token = self.token.read().await.clone();
        let request = TransportRequest {
            method,
            path: path.to_string(),
            query,
            body,
            bearer_token,
        };
        Ok(self.transport.send(request).await?)
    }
}

fn encode_body(record: &impl Serialize) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(record).map_err(|err| ApiError::Decode(err.to_string()))
}

fn decode_body<T: DeserializeOwned>(response: &RawResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body).map_err(|err| ApiError::Decode(err.to_string()))
}

fn header_count(response: &RawResponse, name: &str) -> Option<usize> {
    response
        .header(name)
        .and_then(|value| value.trim().parse().ok())
}

// A field map is validation only on a 4xx; anything else is Server.
fn classify_failure(response: &RawResponse) -> ApiError {
    match serde_json::from_slice::<ErrorPayload>(&response.body) {
        Ok(ErrorPayload::Fields(fields)) if (400..500).contains(&response.status) => {
            ApiError::Validation(FieldErrors::from(fields))
        }
        Ok(ErrorPayload::Message(body)) => ApiError::Server {
            status: response.status,
            message: body.text,
        },
        _ => ApiError::Server {
            status: response.status,
            message: fallback_message(response),
        },
    }
}

fn fallback_message(response: &RawResponse) -> String {
    let text = String::from_utf8_lossy(&response.body);
    let text = text.trim();
    if text.is_empty() || text.len() > 200 {
        format!("request failed with status {}", response.status)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: BTreeMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn field_map_on_4xx_classifies_as_validation() {
        let err = classify_failure(&response(400, r#"{"email_id": ["Invalid email format"]}"#));
        let fields = err.field_errors().expect("field errors");
        assert_eq!(fields.messages("email_id"), ["Invalid email format"]);
    }

    #[test]
    fn flat_message_classifies_as_server_error() {
        let err = classify_failure(&response(403, r#"{"error": "Forbidden"}"#));
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Forbidden");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn field_map_on_5xx_stays_a_server_error() {
        let err = classify_failure(&response(500, r#"{"email_id": ["Invalid email format"]}"#));
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
    }

    #[test]
    fn undecodable_body_falls_back_to_status_message() {
        let err = classify_failure(&response(502, ""));
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "request failed with status 502");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn short_plain_text_body_is_kept_as_the_message() {
        let err = classify_failure(&response(503, "upstream unavailable"));
        match err {
            ApiError::Server { message, .. } => assert_eq!(message, "upstream unavailable"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
