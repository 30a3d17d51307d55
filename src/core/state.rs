use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::rendering::PageRenderer;
use crate::services::store::Store;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: Arc<dyn Store>,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        store: Arc<dyn Store>,
        renderer: Option<Arc<dyn PageRenderer>>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, store, renderer }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    pub(crate) fn renderer(&self) -> Option<&dyn PageRenderer> {
        self.inner.renderer.as_deref()
    }
}
