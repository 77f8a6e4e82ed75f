use std::{collections::BTreeMap, sync::Arc};

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use shared::domain::EntityKind;

use crate::{
    api::Page,
    error::ApiError,
    events::{NoticeLevel, UiEvent},
    AppContext,
};

pub const SEARCH_FILTER: &str = "search";
pub const AS_OF_FILTER: &str = "as_of";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    values: BTreeMap<String, String>,
}

impl FilterSet {
    pub fn set(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            self.values.remove(name);
        } else {
            self.values.insert(name.to_string(), value.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn to_query(&self, page: usize) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        pairs.push(("page".to_string(), page.to_string()));
        pairs
    }
}

#[derive(Clone)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub failed: bool,
    pub current_page: usize,
    pub total_pages: usize,
    pub filters: FilterSet,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            failed: false,
            current_page: 1,
            total_pages: 1,
            filters: FilterSet::default(),
        }
    }
}

#[derive(Clone)]
pub struct ListEndpoint {
    pub entity: EntityKind,
    pub path: &'static str,
    seeded: Vec<(String, String)>,
    persist_search: bool,
}

impl ListEndpoint {
    pub fn customers() -> Self {
        Self {
            entity: EntityKind::Customers,
            path: "/customers",
            seeded: Vec::new(),
            persist_search: true,
        }
    }

    pub fn statements_of_work() -> Self {
        Self {
            entity: EntityKind::Sows,
            path: "/sows",
            seeded: Vec::new(),
            persist_search: false,
        }
    }

    pub fn projects() -> Self {
        Self {
            entity: EntityKind::Projects,
            path: "/projects",
            seeded: Vec::new(),
            persist_search: false,
        }
    }

    pub fn employees() -> Self {
        Self {
            entity: EntityKind::Employees,
            path: "/employees",
            seeded: Vec::new(),
            persist_search: false,
        }
    }

    pub fn compliances() -> Self {
        let today = chrono::Local::now().date_naive().to_string();
        Self {
            entity: EntityKind::Compliances,
            path: "/compliances",
            seeded: vec![(AS_OF_FILTER.to_string(), today)],
            persist_search: false,
        }
    }

    pub fn candidates() -> Self {
        Self {
            entity: EntityKind::Candidates,
            path: "/candidates",
            seeded: Vec::new(),
            persist_search: false,
        }
    }

    pub fn for_entity(entity: EntityKind) -> Self {
        match entity {
            EntityKind::Customers => Self::customers(),
            EntityKind::Sows => Self::statements_of_work(),
            EntityKind::Projects => Self::projects(),
            EntityKind::Employees => Self::employees(),
            EntityKind::Compliances => Self::compliances(),
            EntityKind::Candidates => Self::candidates(),
        }
    }

    pub fn detail_path(&self, id: i64) -> String {
        format!("{}/{id}", self.path)
    }
}

struct ControllerState<T> {
    list: ListState<T>,
    draft_search: String,
    // Sequence token of the newest issued fetch. Only the response
    // carrying this exact token may be committed; everything older is
    // discarded on arrival.
    last_issued: u64,
    // Bumped on every keystroke; a sleeping debounce task only commits
    // if its generation is still the newest when it wakes.
    debounce_generation: u64,
}

pub struct ListController<T> {
    ctx: AppContext,
    endpoint: ListEndpoint,
    state: Arc<Mutex<ControllerState<T>>>,
}

impl<T> Clone for ListController<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            endpoint: self.endpoint.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> ListController<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    pub fn new(ctx: AppContext, endpoint: ListEndpoint) -> Self {
        let mut list = ListState::default();
        for (name, value) in &endpoint.seeded {
            list.filters.set(name, value);
        }
        Self {
            ctx,
            endpoint,
            state: Arc::new(Mutex::new(ControllerState {
                list,
                draft_search: String::new(),
                last_issued: 0,
                debounce_generation: 0,
            })),
        }
    }

    pub async fn open(ctx: AppContext, endpoint: ListEndpoint) -> Self {
        let controller = Self::new(ctx, endpoint);
        controller.restore_saved_search().await;
        controller.refresh().await;
        controller
    }

    pub fn entity(&self) -> EntityKind {
        self.endpoint.entity
    }

    pub fn endpoint(&self) -> &ListEndpoint {
        &self.endpoint
    }

    pub async fn snapshot(&self) -> ListState<T> {
        self.state.lock().await.list.clone()
    }

    pub async fn search_draft(&self) -> String {
        self.state.lock().await.draft_search.clone()
    }

    // The page resets before the fetch is issued; an instant response
    // is still for page 1.
    pub async fn set_filter(&self, name: &str, value: &str) {
        {
            let mut guard = self.state.lock().await;
            guard.list.filters.set(name, value);
            guard.list.current_page = 1;
            if name == SEARCH_FILTER {
                guard.draft_search = value.to_string();
            }
            self.issue_fetch(&mut guard);
        }

        if name == SEARCH_FILTER && self.endpoint.persist_search {
            if let Err(err) = self.ctx.store().save_search_term(value).await {
                warn!("failed to persist search term: {err:#}");
            }
        }
    }

    pub async fn set_page(&self, page: usize) {
        let mut guard = self.state.lock().await;
        let last_page = guard.list.total_pages.max(1);
        guard.list.current_page = page.clamp(1, last_page);
        self.issue_fetch(&mut guard);
    }

    pub async fn clear_filters(&self) {
        {
            let mut guard = self.state.lock().await;
            guard.list.filters = FilterSet::default();
            for (name, value) in &self.endpoint.seeded {
                guard.list.filters.set(name, value);
            }
            guard.draft_search.clear();
            guard.list.current_page = 1;
            self.issue_fetch(&mut guard);
        }

        if self.endpoint.persist_search {
            if let Err(err) = self.ctx.store().save_search_term("").await {
                warn!("failed to clear persisted search term: {err:#}");
            }
        }
    }

    // A typing burst costs at most one request.
    pub async fn search_input(&self, draft: &str) {
        let generation = {
            let mut guard = self.state.lock().await;
            guard.draft_search = draft.to_string();
            guard.debounce_generation += 1;
            guard.debounce_generation
        };

        let this = self.clone();
        let window = self.ctx.debounce_window();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            this.commit_search(generation).await;
        });
    }

    pub async fn refresh(&self) {
        let mut guard = self.state.lock().await;
        self.issue_fetch(&mut guard);
    }

    async fn restore_saved_search(&self) {
        if !self.endpoint.persist_search {
            return;
        }
        match self.ctx.store().saved_search_term().await {
            Ok(Some(term)) => {
                let mut guard = self.state.lock().await;
                guard.list.filters.set(SEARCH_FILTER, &term);
                guard.draft_search = term;
            }
            Ok(None) => {}
            Err(err) => warn!("failed to load saved search term: {err:#}"),
        }
    }

    // The generation check and the commit share one lock acquisition,
    // and the draft is never written here, so a keystroke racing this
    // commit keeps its newer text.
    async fn commit_search(&self, generation: u64) {
        let term = {
            let mut guard = self.state.lock().await;
            if generation != guard.debounce_generation {
                return;
            }
            let term = guard.draft_search.clone();
            guard.list.filters.set(SEARCH_FILTER, &term);
            guard.list.current_page = 1;
            self.issue_fetch(&mut guard);
            term
        };

        if self.endpoint.persist_search {
            if let Err(err) = self.ctx.store().save_search_term(&term).await {
                warn!("failed to persist search term: {err:#}");
            }
        }
    }

    // The query is captured under the same lock that assigns the
    // sequence token, so a request always carries the filters it was
    // issued for.
    fn issue_fetch(&self, guard: &mut ControllerState<T>) {
        guard.last_issued += 1;
        guard.list.is_loading = true;
        let seq = guard.last_issued;
        let query = guard.list.filters.to_query(guard.list.current_page);

        let this = self.clone();
        tokio::spawn(async move {
            let result = this.ctx.api().fetch_page::<T>(this.endpoint.path, &query).await;
            this.commit(seq, result).await;
        });
    }

    async fn commit(&self, seq: u64, result: Result<Page<T>, ApiError>) {
        let mut guard = self.state.lock().await;
        if seq != guard.last_issued {
            debug!(
                entity = self.endpoint.entity.label(),
                seq,
                newest = guard.last_issued,
                "discarding superseded response"
            );
            return;
        }

        guard.list.is_loading = false;
        match result {
            Ok(page) => {
                guard.list.failed = false;
                guard.list.items = page.items;
                guard.list.total_pages = page.meta.total_pages;
                guard.list.current_page = page.meta.current_page;
                drop(guard);
            }
            Err(err) => {
                guard.list.failed = true;
                guard.list.items.clear();
                drop(guard);
                self.ctx.notify(NoticeLevel::Error, err.toast_text());
            }
        }
        self.ctx.emit(UiEvent::ListUpdated {
            entity: self.endpoint.entity,
        });
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
