use std::sync::Arc;

use crate::db::LeadStore;

/// Shared handler state. Cloned per request; the store itself is shared.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LeadStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }
}
