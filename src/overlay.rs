//! Attaching the overlay to a page.

use crate::controller::{Controller, Settlement};
use crate::page::ProfilePage;
use crate::source::StatsSource;
use crate::surface::Surface;
use crate::OverlayConfig;
use log::{debug, info};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// An overlay bound to one Steam profile page.
pub struct Overlay {
    page: ProfilePage,
    controller: Controller,
    initial: Option<JoinHandle<Settlement>>,
}

impl Overlay {
    /// Attach to `page_url`. Returns `None` when the URL is not a profile
    /// page; otherwise mounts the preloader and, if the page is visible,
    /// starts the first load right away.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach(
        config: &OverlayConfig,
        page_url: &str,
        visible: bool,
        source: Arc<dyn StatsSource>,
        surface: Arc<dyn Surface>,
    ) -> Option<Self> {
        let Some(page) = ProfilePage::detect(page_url) else {
            debug!("{} is not a profile page, overlay disabled", page_url);
            return None;
        };
        info!("profile page detected: {:?}", page.kind);

        let controller = Controller::new(config, page.url.clone(), source, surface);
        controller.show_preloader();
        controller.set_visible(visible);

        let initial = visible.then(|| controller.spawn_load());

        Some(Self {
            page,
            controller,
            initial,
        })
    }

    pub fn page(&self) -> &ProfilePage {
        &self.page
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Wait for the load started by [`Overlay::attach`], if any.
    pub async fn initial_load(&mut self) -> Option<Settlement> {
        let handle = self.initial.take()?;
        handle.await.ok()
    }
}
