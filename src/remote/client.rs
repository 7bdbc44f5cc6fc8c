use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::RemoteError;
use crate::models::{NewQuestion, Question};
use crate::remote::{QuestionService, FILTER_PROCEDURE};
use crate::search::QuestionQuery;

/// Keep-previous-data state for one query slot.
///
/// Data for the last resolved key stays visible while a different key is
/// being fetched. Results for a key that is no longer current are dropped.
#[derive(Debug, Clone)]
pub struct QueryResource<T> {
    key: Option<String>,
    data_key: Option<String>,
    data: Option<T>,
    fetched_at: Option<String>,
    fetching: bool,
    stale: bool,
    error: Option<String>,
}

impl<T> Default for QueryResource<T> {
    fn default() -> Self {
        Self {
            key: None,
            data_key: None,
            data: None,
            fetched_at: None,
            fetching: false,
            stale: false,
            error: None,
        }
    }
}

impl<T> QueryResource<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `key`. Whatever data is held stays visible.
    pub fn begin(&mut self, key: &str) {
        self.key = Some(key.to_string());
        self.fetching = true;
        self.error = None;
    }

    /// Record the outcome for `key`. Returns false if `key` was superseded.
    pub fn resolve(&mut self, key: &str, result: Result<T, String>) -> bool {
        if self.key.as_deref() != Some(key) {
            debug!("dropping result for superseded query");
            return false;
        }
        self.fetching = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.data_key = Some(key.to_string());
                self.fetched_at = None;
                self.stale = false;
            }
            Err(message) => self.error = Some(message),
        }
        true
    }

    /// Fill the slot with a previously stored response for `key`.
    pub fn seed(&mut self, key: &str, data: T, fetched_at: String) {
        self.data = Some(data);
        self.data_key = Some(key.to_string());
        self.fetched_at = Some(fetched_at);
        self.stale = true;
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// The visible data belongs to an earlier request shape.
    pub fn is_previous_data(&self) -> bool {
        self.data.is_some() && self.data_key != self.key
    }

    /// The visible data came from storage or was invalidated since it loaded.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// When the visible data was stored, if it came from storage.
    pub fn fetched_at(&self) -> Option<&str> {
        self.fetched_at.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Whether loading `key` would hit the network.
    pub fn needs_fetch(&self, key: &str) -> bool {
        self.stale || self.data_key.as_deref() != Some(key)
    }
}

/// Remote query service fronted by the keep-previous-data slot and an optional
/// on-disk cache of last successful responses.
pub struct QueryClient<S> {
    service: S,
    store: Option<CacheStore>,
    resource: QueryResource<Vec<Question>>,
}

impl<S: QuestionService> QueryClient<S> {
    pub fn new(service: S, store: Option<CacheStore>) -> Self {
        Self {
            service,
            store,
            resource: QueryResource::new(),
        }
    }

    pub fn resource(&self) -> &QueryResource<Vec<Question>> {
        &self.resource
    }

    pub fn store(&self) -> Option<&CacheStore> {
        self.store.as_ref()
    }

    /// Begin loading `query` and return what can be shown meanwhile.
    ///
    /// An empty slot is seeded from the on-disk cache when it has this key.
    pub fn begin(&mut self, query: &QuestionQuery) -> Option<&[Question]> {
        let key = query.cache_key();
        if self.resource.data().is_none() {
            if let Some(entry) = self.load_stored(&key) {
                self.resource.seed(&key, entry.value, entry.fetched_at);
            }
        }
        self.resource.begin(&key);
        self.resource.data().map(Vec::as_slice)
    }

    /// Run the request begun for `query`.
    ///
    /// On failure the previous data stays in the slot and the error is both
    /// recorded and returned. There is no retry.
    pub fn refresh(&mut self, query: &QuestionQuery) -> Result<(), RemoteError> {
        let key = query.cache_key();
        match self.service.fetch_questions(query) {
            Ok(questions) => {
                if let Some(ref store) = self.store {
                    if let Err(e) = store.put(FILTER_PROCEDURE, &key, &questions) {
                        warn!("Failed to cache questions: {e:#}");
                    }
                }
                self.resource.resolve(&key, Ok(questions));
                Ok(())
            }
            Err(e) => {
                self.resource.resolve(&key, Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// Serve only from the on-disk cache, without touching the network.
    pub fn load_offline(&mut self, query: &QuestionQuery) -> Option<&[Question]> {
        let key = query.cache_key();
        let entry = self.load_stored(&key)?;
        self.resource.begin(&key);
        self.resource.seed(&key, entry.value, entry.fetched_at);
        self.resource.fetching = false;
        self.resource.data().map(Vec::as_slice)
    }

    /// Submit a question and invalidate every cached filter result.
    pub fn create(&mut self, question: &NewQuestion) -> Result<(), RemoteError> {
        self.service.create_question(question)?;
        if let Some(ref store) = self.store {
            if let Err(e) = store.invalidate(FILTER_PROCEDURE) {
                warn!("Failed to invalidate cached questions: {e:#}");
            }
        }
        self.resource.invalidate();
        Ok(())
    }

    fn load_stored(&self, key: &str) -> Option<crate::cache::CachedEntry<Vec<Question>>> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring unreadable cache entry: {e:#}");
                None
            }
        }
    }
}
