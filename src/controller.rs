//! Fetch lifecycle controller.
//!
//! Owns the single in-flight stats request of a page and ties it to page
//! visibility and unload:
//!
//! - [`Controller::start_load`] issues a request unless one is in flight or a
//!   result is already shown, with a fixed timeout.
//! - [`Controller::on_hidden`] cancels and releases the in-flight request and
//!   marks the cancellation as visibility-triggered, which suppresses the
//!   error card.
//! - [`Controller::on_visible`] retries after a short settle delay when
//!   nothing is loaded.
//! - [`Controller::on_unload`] cancels without marking.
//!
//! Every request gets a fresh [`CancellationToken`] and a generation number.
//! A settlement whose generation is no longer the active one is dropped, so
//! a superseded request can never overwrite the state of a newer one.

use crate::model::ProfileResponse;
use crate::render::OverlayRenderer;
use crate::source::StatsSource;
use crate::surface::Surface;
use crate::{Error, OverlayConfig, Result};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a load ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Ranked result rendered
    Loaded,
    /// Unranked or not-found result rendered
    Unranked,
    /// Cancelled by a visibility change; nothing rendered
    Suppressed,
    /// Cancelled by the timeout (or unload); timeout error rendered
    TimedOut,
    /// Any other failure; inline error rendered
    Failed(Error),
    /// A newer load took over before this one settled; nothing rendered
    Superseded,
    /// Not started: a result is already shown or a request is in flight
    Skipped,
}

/// Host page events the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Visible,
    Hidden,
    Unload,
}

/// Point-in-time copy of the controller record, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSnapshot {
    pub is_loading: bool,
    pub was_aborted: bool,
    pub is_loaded: bool,
    pub visible: bool,
    pub has_active_handle: bool,
    pub generation: u64,
}

struct ActiveRequest {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct LoadState {
    is_loading: bool,
    was_aborted: bool,
    is_loaded: bool,
    visible: bool,
    active: Option<ActiveRequest>,
    generation: u64,
}

impl LoadState {
    /// Cancel whatever is active and install a fresh handle.
    fn begin(&mut self) -> (u64, CancellationToken) {
        if let Some(prev) = self.active.take() {
            debug!("superseding request #{}", prev.generation);
            prev.cancel.cancel();
        }
        self.generation += 1;
        let cancel = CancellationToken::new();
        self.active = Some(ActiveRequest {
            generation: self.generation,
            cancel: cancel.clone(),
        });
        self.is_loading = true;
        self.was_aborted = false;
        (self.generation, cancel)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active.as_ref().map(|a| a.generation) == Some(generation)
    }

    fn release(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
        self.is_loading = false;
    }
}

struct Inner {
    subject: String,
    source: Arc<dyn StatsSource>,
    surface: Arc<dyn Surface>,
    renderer: OverlayRenderer,
    timeout: Duration,
    settle_delay: Duration,
    state: Mutex<LoadState>,
}

/// Per-page controller. Cheap to clone; clones share the same record.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

impl Controller {
    /// Build a controller for the page identified by `subject`.
    ///
    /// The page starts out visible.
    pub fn new(
        config: &OverlayConfig,
        subject: impl Into<String>,
        source: Arc<dyn StatsSource>,
        surface: Arc<dyn Surface>,
    ) -> Self {
        let state = LoadState {
            visible: true,
            ..Default::default()
        };
        Self {
            inner: Arc::new(Inner {
                subject: subject.into(),
                source,
                surface,
                renderer: OverlayRenderer::new(config.asset_base_url.clone()),
                timeout: Duration::from_millis(config.timeout_ms),
                settle_delay: Duration::from_millis(config.settle_delay_ms),
                state: Mutex::new(state),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, LoadState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The identifier this controller loads on visibility changes.
    pub fn subject(&self) -> &str {
        &self.inner.subject
    }

    pub fn snapshot(&self) -> LoadSnapshot {
        let st = self.state();
        LoadSnapshot {
            is_loading: st.is_loading,
            was_aborted: st.was_aborted,
            is_loaded: st.is_loaded,
            visible: st.visible,
            has_active_handle: st.active.is_some(),
            generation: st.generation,
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.state().visible = visible;
    }

    /// Mount the "Loading..." fragment.
    pub fn show_preloader(&self) {
        self.inner.surface.mount(&self.inner.renderer.preloader());
    }

    /// Load stats for `target` unless a result is already shown or a request
    /// is already in flight.
    pub async fn start_load(&self, target: &str) -> Settlement {
        let (generation, cancel) = {
            let mut st = self.state();
            if st.is_loaded || st.is_loading {
                debug!(
                    "skipping load of {} (loaded: {}, loading: {})",
                    target, st.is_loaded, st.is_loading
                );
                return Settlement::Skipped;
            }
            st.begin()
        };
        self.run(target, generation, cancel).await
    }

    /// Load stats for `target`, superseding any in-flight request and any
    /// result already shown. Used for explicit searches.
    pub async fn replace_load(&self, target: &str) -> Settlement {
        let (generation, cancel) = {
            let mut st = self.state();
            st.is_loaded = false;
            st.begin()
        };
        self.run(target, generation, cancel).await
    }

    /// Spawn [`Controller::start_load`] for the page subject.
    pub fn spawn_load(&self) -> JoinHandle<Settlement> {
        let this = self.clone();
        tokio::spawn(async move {
            let subject = this.inner.subject.clone();
            this.start_load(&subject).await
        })
    }

    /// The page came to the foreground. Schedules a load after the settle
    /// delay when nothing is loaded and nothing is in flight; the scheduled
    /// load re-checks visibility before it starts.
    pub fn on_visible(&self) -> Option<JoinHandle<Settlement>> {
        {
            let mut st = self.state();
            st.visible = true;
            if st.is_loaded || st.is_loading {
                return None;
            }
        }

        let this = self.clone();
        let delay = self.inner.settle_delay;
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !this.state().visible {
                debug!("page hidden again before delayed load");
                return Settlement::Skipped;
            }
            let subject = this.inner.subject.clone();
            this.start_load(&subject).await
        }))
    }

    /// The page went to the background. Cancels and releases the in-flight
    /// request and records the cancellation as visibility-triggered, so a
    /// following [`Controller::on_visible`] can retry right away.
    pub fn on_hidden(&self) {
        let mut st = self.state();
        st.visible = false;
        if !st.is_loading {
            return;
        }
        if let Some(active) = st.active.as_ref() {
            debug!("page hidden, aborting request #{}", active.generation);
            st.was_aborted = true;
        }
        // Free the record now so an immediate on_visible can schedule a retry
        st.release();
    }

    /// The page is going away. Cancels any in-flight request.
    pub fn on_unload(&self) {
        let st = self.state();
        if let Some(active) = st.active.as_ref() {
            debug!("page unloading, aborting request #{}", active.generation);
            active.cancel.cancel();
        }
    }

    /// Route a host page event to its handler.
    pub fn dispatch(&self, event: PageEvent) -> Option<JoinHandle<Settlement>> {
        match event {
            PageEvent::Visible => self.on_visible(),
            PageEvent::Hidden => {
                self.on_hidden();
                None
            }
            PageEvent::Unload => {
                self.on_unload();
                None
            }
        }
    }

    async fn run(&self, target: &str, generation: u64, cancel: CancellationToken) -> Settlement {
        info!("loading stats for {} (request #{})", target, generation);

        let fetch = self.inner.source.fetch_profile(target, cancel.clone());
        tokio::pin!(fetch);

        let result = tokio::select! {
            res = &mut fetch => res,
            _ = tokio::time::sleep(self.inner.timeout) => {
                debug!(
                    "request #{} exceeded {}ms, cancelling",
                    generation,
                    self.inner.timeout.as_millis()
                );
                cancel.cancel();
                fetch.await
            }
        };

        self.settle(generation, result)
    }

    fn settle(&self, generation: u64, result: Result<ProfileResponse>) -> Settlement {
        let mut st = self.state();

        if !st.is_current(generation) {
            // Released by on_hidden and not yet replaced by a retry
            if generation == st.generation && st.was_aborted && !st.is_loaded {
                debug!("request #{} aborted by tab switch", generation);
                return Settlement::Suppressed;
            }
            debug!("dropping settlement of superseded request #{}", generation);
            return Settlement::Superseded;
        }

        st.release();
        let renderer = &self.inner.renderer;
        let surface = &self.inner.surface;

        match result {
            Ok(profile) => {
                st.is_loaded = true;
                surface.mount(&renderer.profile(&profile));
                if profile.is_ranked() {
                    Settlement::Loaded
                } else {
                    Settlement::Unranked
                }
            }
            Err(Error::NotFound) => {
                info!("player not found on FACEIT");
                st.is_loaded = true;
                surface.mount(&renderer.unranked(None));
                Settlement::Unranked
            }
            Err(e) if e.is_cancellation() => {
                let err = Error::Timeout(self.inner.timeout.as_millis() as u64);
                warn!("request #{} failed: {}", generation, err);
                surface.mount(&renderer.error(&err));
                Settlement::TimedOut
            }
            Err(e) => {
                warn!("request #{} failed: {}", generation, e);
                surface.mount(&renderer.error(&e));
                Settlement::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_supersedes_and_cancels_previous_handle() {
        let mut st = LoadState::default();
        let (g1, t1) = st.begin();
        let (g2, t2) = st.begin();
        assert!(t1.is_cancelled());
        assert!(!t2.is_cancelled());
        assert!(!st.is_current(g1));
        assert!(st.is_current(g2));
        assert!(st.is_loading);
    }

    #[test]
    fn release_clears_handle_and_loading() {
        let mut st = LoadState::default();
        let (_, t) = st.begin();
        st.release();
        assert!(t.is_cancelled());
        assert!(st.active.is_none());
        assert!(!st.is_loading);
    }

    #[test]
    fn begin_resets_abort_flag() {
        let mut st = LoadState {
            was_aborted: true,
            ..Default::default()
        };
        st.begin();
        assert!(!st.was_aborted);
    }
}
