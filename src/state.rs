use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::media::MediaProcessorTrait;
use crate::workflow::Workflow;

/// Shared state handed to every request handler
pub struct AppState {
    pub workflow: Workflow,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, media: Arc<dyn MediaProcessorTrait>) -> Arc<Self> {
        Arc::new(Self {
            workflow: Workflow::new(config, media),
            started_at: Utc::now(),
        })
    }
}
