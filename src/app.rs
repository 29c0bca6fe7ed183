use std::sync::Arc;

use crate::config::Config;
use crate::selection::PendingSelections;
use crate::shortener::UrlShortener;
use crate::store::LinkStore;

/// Explicitly constructed process context, injected into every handler
/// instead of process-wide singletons.
pub struct App {
    pub config: Config,
    pub store: Arc<dyn LinkStore>,
    pub shortener: Arc<dyn UrlShortener>,
    pub selections: PendingSelections,
}
