use anyhow::{bail, Result};
use tracing::debug;

use super::params::Location;

/// Navigation seam: where the page reads its URL from and writes it back to.
pub trait Navigator {
    /// The current location, or None while the router is not ready yet.
    fn current(&self) -> Option<Location>;

    /// Replace the current history entry without adding a new one.
    fn replace(&mut self, location: Location) -> Result<()>;
}

/// In-process history stack.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Vec<Location>,
    replaces: usize,
}

impl MemoryHistory {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            replaces: 0,
        }
    }

    /// A history that never becomes ready.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn push(&mut self, location: Location) {
        self.entries.push(location);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `replace` calls seen so far.
    pub fn replace_count(&self) -> usize {
        self.replaces
    }
}

impl Navigator for MemoryHistory {
    fn current(&self) -> Option<Location> {
        self.entries.last().cloned()
    }

    fn replace(&mut self, location: Location) -> Result<()> {
        let Some(top) = self.entries.last_mut() else {
            bail!("Cannot replace: history has no entries");
        };
        debug!("history.replace {location}");
        *top = location;
        self.replaces += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::params::QueryParams;

    #[test]
    fn replace_swaps_top_entry() {
        let mut history = MemoryHistory::new(Location::new("/a", QueryParams::new()));
        history.push(Location::new("/b", QueryParams::new()));
        history
            .replace(Location::new("/c", QueryParams::parse("x=1")))
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().unwrap().to_string(), "/c?x=1");
        assert_eq!(history.replace_count(), 1);
    }

    #[test]
    fn pending_history_refuses_replace() {
        let mut history = MemoryHistory::pending();
        assert!(history.current().is_none());
        assert!(history.replace(Location::default()).is_err());
    }
}
