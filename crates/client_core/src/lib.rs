use std::{sync::Arc, time::Duration};

use anyhow::Result;
use storage::LocalStore;
use tokio::sync::broadcast;

pub mod api;
pub mod error;
pub mod events;
pub mod list;
pub mod transport;

pub use api::{ApiClient, Page};
pub use error::ApiError;
pub use events::{NoticeLevel, UiEvent};
pub use list::{FilterSet, ListController, ListEndpoint, ListState, AS_OF_FILTER, SEARCH_FILTER};
pub use transport::{HttpTransport, MultipartField, MultipartValue, Transport, TransportError};

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(400);

// No process-wide singletons; anything that needs the API client, the
// store, or the notification channel gets a context passed in.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    api: ApiClient,
    store: LocalStore,
    events: broadcast::Sender<UiEvent>,
    debounce_window: Duration,
}

impl AppContext {
    pub fn new(api: ApiClient, store: LocalStore, debounce_window: Duration) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(ContextInner {
                api,
                store,
                events,
                debounce_window,
            }),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn store(&self) -> &LocalStore {
        &self.inner.store
    }

    pub fn debounce_window(&self) -> Duration {
        self.inner.debounce_window
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<UiEvent> {
        self.inner.events.subscribe()
    }

    pub async fn restore_session(&self) -> Result<bool> {
        if !self.store().is_authenticated().await? {
            return Ok(false);
        }
        let Some(token) = self.store().session_token().await? else {
            return Ok(false);
        };
        self.api().set_token(Some(token)).await;
        Ok(true)
    }

    pub async fn login(&self, email_id: &str, password: &str) -> Result<()> {
        let token = self.api().login(email_id, password).await?;
        self.store().store_session(&token).await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.api().set_token(None).await;
        self.store().clear_session().await?;
        Ok(())
    }

    pub(crate) fn emit(&self, event: UiEvent) {
        let _ = self.inner.events.send(event);
    }

    pub(crate) fn notify(&self, level: NoticeLevel, text: impl Into<String>) {
        self.emit(UiEvent::Notice {
            level,
            text: text.into(),
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
