pub mod navigator;
pub mod params;

use anyhow::Result;
use tracing::{debug, info};

use crate::search::filters::SearchState;
use navigator::Navigator;
use params::{Location, QueryParams};

/// What a reconcile pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Some field has not read its URL value yet.
    NotInitialized,
    /// The URL already encodes the current state.
    Unchanged,
    /// The current history entry was replaced.
    Replaced,
}

/// Writes the filter state back to the URL.
///
/// Runs after state changes rather than from the setters, and diffs against
/// the last query it wrote, so one dispatch yields at most one replace.
#[derive(Debug, Clone)]
pub struct UrlSynchronizer {
    pathname: String,
    last_written: Option<QueryParams>,
    loaded: bool,
}

impl UrlSynchronizer {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            last_written: None,
            loaded: false,
        }
    }

    /// True once the first write-back has gone through.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Path of the last write-back, or the mount-time fallback before one.
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn reconcile(
        &mut self,
        state: &SearchState,
        navigator: &mut dyn Navigator,
    ) -> Result<SyncOutcome> {
        if !state.is_initialized() {
            debug!("URL sync deferred: fields not initialized");
            return Ok(SyncOutcome::NotInitialized);
        }

        let query = state.to_query();
        if self.last_written.as_ref() == Some(&query) {
            return Ok(SyncOutcome::Unchanged);
        }

        if let Some(current) = navigator.current() {
            self.pathname = current.pathname;
        }
        let location = Location::new(self.pathname.clone(), query.clone());
        navigator.replace(location)?;
        self.last_written = Some(query);

        if !self.loaded {
            info!("Filter state reconciled with URL");
            self.loaded = true;
        }
        Ok(SyncOutcome::Replaced)
    }
}
