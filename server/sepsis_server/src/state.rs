use parking_lot::RwLock;
use std::sync::Arc;

use sepsis_triage::ClinicalContext;

use crate::error::ApiError;

/// Shared handler state: the clinical context once it has loaded.
///
/// The slot is written exactly once, by the startup loader. Handlers take
/// an `Arc` snapshot and never hold the lock while scoring.
#[derive(Debug, Default)]
pub struct AppState {
    context: RwLock<Option<Arc<ClinicalContext>>>,
}

impl AppState {
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn ready(context: ClinicalContext) -> Self {
        Self {
            context: RwLock::new(Some(Arc::new(context))),
        }
    }

    pub fn publish(&self, context: ClinicalContext) {
        let mut slot = self.context.write();
        if slot.is_some() {
            log::warn!("clinical context already published; ignoring reload");
            return;
        }
        *slot = Some(Arc::new(context));
        log::info!("clinical context published; accepting scoring requests");
    }

    pub fn is_ready(&self) -> bool {
        self.context.read().is_some()
    }

    pub fn context(&self) -> Result<Arc<ClinicalContext>, ApiError> {
        self.context.read().clone().ok_or(ApiError::NotReady)
    }
}
