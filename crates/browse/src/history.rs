//! Back/forward history over browsing locations.

/// One browsing location: a bucket plus a key prefix within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub bucket: String,
    pub prefix: String,
}

impl Location {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }
}

/// Append-only location stack with a movable index.
///
/// Visiting a new location truncates any forward history; back/forward
/// only move the index and replay the stored location. Page cursors are
/// scoped to a single location, so the owner must reset its paginator on
/// every location change.
#[derive(Debug, Default)]
pub struct NavigationHistory {
    stack: Vec<Location>,
    /// Index of the current location; `None` until the first visit.
    index: Option<usize>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigates to a new location, dropping any forward entries.
    ///
    /// Re-visiting the current location is a no-op so refreshes don't
    /// pollute the stack.
    pub fn visit(&mut self, location: Location) {
        if self.current() == Some(&location) {
            return;
        }
        if let Some(index) = self.index {
            self.stack.truncate(index + 1);
        }
        self.stack.push(location);
        self.index = Some(self.stack.len() - 1);
    }

    /// Steps back, returning the new current location.
    pub fn back(&mut self) -> Option<&Location> {
        let index = self.index?;
        if index == 0 {
            return None;
        }
        self.index = Some(index - 1);
        self.current()
    }

    /// Steps forward, returning the new current location.
    pub fn forward(&mut self) -> Option<&Location> {
        let index = self.index?;
        if index + 1 >= self.stack.len() {
            return None;
        }
        self.index = Some(index + 1);
        self.current()
    }

    pub fn current(&self) -> Option<&Location> {
        self.index.and_then(|i| self.stack.get(i))
    }

    pub fn can_back(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_forward(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.stack.len())
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
