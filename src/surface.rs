//! The container the overlay renders into.

use std::sync::Mutex;

/// A single replaceable container in the host page.
///
/// `mount` replaces the container's markup, creating the container first
/// if it does not exist yet. Implementations must not call back into the
/// controller: mounting happens while its state is locked.
pub trait Surface: Send + Sync {
    fn mount(&self, html: &str);
}

/// In-memory surface that records every mounted fragment.
#[derive(Debug, Default)]
pub struct MemorySurface {
    frames: Mutex<Vec<String>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The markup currently in the container, if anything was mounted.
    pub fn current(&self) -> Option<String> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    /// Every fragment mounted so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn mount_count(&self) -> usize {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Surface for MemorySurface {
    fn mount(&self, html: &str) {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(html.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_surface_keeps_latest_and_history() {
        let s = MemorySurface::new();
        assert!(s.current().is_none());
        s.mount("<p>a</p>");
        s.mount("<p>b</p>");
        assert_eq!(s.current().as_deref(), Some("<p>b</p>"));
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.mount_count(), 2);
    }
}
