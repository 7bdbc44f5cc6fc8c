//! The browse page: filter state, URL write-back and the question query, wired
//! together the way a render loop drives them.
//!
//! Every input goes through [`BrowsePage::dispatch`], which applies a batch of
//! actions to a copy of the state and commits it in one step. The effect pass
//! then runs once per batch. Until the first URL write-back succeeds,
//! [`BrowsePage::render`] yields nothing, so default results never show before
//! a shared link's filters are applied.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::CheckedOption;
use crate::error::RemoteError;
use crate::models::{NewQuestion, Question};
use crate::remote::client::QueryClient;
use crate::remote::QuestionService;
use crate::search::filters::{FilterAction, SearchState};
use crate::search::QuestionQuery;
use crate::sync::navigator::Navigator;
use crate::sync::{SyncOutcome, UrlSynchronizer};

pub const DEFAULT_PAGE_PATH: &str = "/questions/browse";

/// Sidebar and sort bar contents.
#[derive(Debug, Clone, Serialize)]
pub struct FilterPanel {
    pub companies: Vec<CheckedOption>,
    pub question_types: Vec<CheckedOption>,
    pub question_age: Vec<CheckedOption>,
    pub roles: Vec<CheckedOption>,
    pub locations: Vec<CheckedOption>,
    pub sort_order: Vec<CheckedOption>,
    pub sort_type: Vec<CheckedOption>,
}

/// Everything the page shows once loaded.
#[derive(Debug, Clone, Serialize)]
pub struct PageView<'a> {
    pub location: String,
    pub has_filters: bool,
    /// None until the first response (or cached copy) arrives.
    pub questions: Option<&'a [Question]>,
    pub is_previous_data: bool,
    pub is_stale: bool,
    pub cached_at: Option<&'a str>,
    pub error: Option<&'a str>,
    pub filters: FilterPanel,
}

pub struct BrowsePage<N, S> {
    navigator: N,
    client: QueryClient<S>,
    state: SearchState,
    sync: UrlSynchronizer,
    now: DateTime<Utc>,
}

impl<N: Navigator, S: QuestionService> BrowsePage<N, S> {
    /// Mount the page. `now` is pinned as the end of every date window.
    pub fn mount(navigator: N, client: QueryClient<S>, now: DateTime<Utc>) -> Result<Self> {
        let pathname = navigator
            .current()
            .map(|l| l.pathname)
            .unwrap_or_else(|| DEFAULT_PAGE_PATH.to_string());

        let mut page = Self {
            navigator,
            client,
            state: SearchState::new(),
            sync: UrlSynchronizer::new(pathname),
            now,
        };
        page.init()?;
        Ok(page)
    }

    /// Read every field from the current URL if the router is ready, then
    /// reconcile. Safe to call again after the navigator becomes ready.
    pub fn init(&mut self) -> Result<SyncOutcome> {
        if !self.state.is_initialized() {
            match self.navigator.current() {
                Some(location) => {
                    debug!("hydrating filters from {location}");
                    self.state.hydrate(&location.query);
                }
                None => debug!("router not ready; filters stay uninitialized"),
            }
        }
        self.effects()
    }

    /// Apply a batch of actions atomically and run the effect pass once.
    ///
    /// If any action is rejected, none of them take effect.
    pub fn dispatch<I>(&mut self, actions: I) -> Result<SyncOutcome>
    where
        I: IntoIterator<Item = FilterAction>,
    {
        let mut next = self.state.clone();
        for action in actions {
            next.apply(action)?;
        }
        if next == self.state {
            return Ok(SyncOutcome::Unchanged);
        }
        self.state = next;
        self.effects()
    }

    fn effects(&mut self) -> Result<SyncOutcome> {
        self.sync.reconcile(&self.state, &mut self.navigator)
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn client(&self) -> &QueryClient<S> {
        &self.client
    }

    pub fn is_loaded(&self) -> bool {
        self.sync.is_loaded()
    }

    /// Request parameters for the current state.
    pub fn query(&self) -> QuestionQuery {
        QuestionQuery::from_state(&self.state, self.now)
    }

    /// Fetch results for the current filters. Does nothing before load.
    pub fn load(&mut self) -> Result<(), RemoteError> {
        if !self.is_loaded() {
            return Ok(());
        }
        let query = self.query();
        if !self.client.resource().needs_fetch(&query.cache_key()) {
            return Ok(());
        }
        self.client.begin(&query);
        self.client.refresh(&query)
    }

    /// Show only what the on-disk cache holds for the current filters.
    pub fn load_offline(&mut self) -> bool {
        if !self.is_loaded() {
            return false;
        }
        let query = self.query();
        self.client.load_offline(&query).is_some()
    }

    /// Submit a contributed question, then refetch the invalidated results.
    pub fn contribute(&mut self, question: &NewQuestion) -> Result<(), RemoteError> {
        self.client.create(question)?;
        info!("Question submitted; refreshing results");
        self.load()
    }

    /// The page as shown, or None until the URL and state are reconciled.
    pub fn render(&self) -> Option<PageView<'_>> {
        if !self.is_loaded() {
            return None;
        }
        let resource = self.client.resource();
        let location = self
            .navigator
            .current()
            .map(|l| l.to_string())
            .unwrap_or_default();

        Some(PageView {
            location,
            has_filters: self.state.has_filters(),
            questions: resource.data().map(Vec::as_slice),
            is_previous_data: resource.is_previous_data(),
            is_stale: resource.is_stale(),
            cached_at: resource.fetched_at(),
            error: resource.error(),
            filters: FilterPanel {
                companies: self.state.company_options(),
                question_types: self.state.question_type_options(),
                question_age: self.state.question_age_options(),
                roles: self.state.role_options(),
                locations: self.state.location_options(),
                sort_order: self.state.sort_order_options(),
                sort_type: self.state.sort_type_options(),
            },
        })
    }
}
