//! Shared application state for all routes.

use crate::generation::RoutineGenerator;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub generator: Arc<RoutineGenerator>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, generator: RoutineGenerator) -> Self {
        AppState {
            store,
            generator: Arc::new(generator),
        }
    }
}
