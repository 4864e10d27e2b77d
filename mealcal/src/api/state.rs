use std::sync::Arc;

use crate::config::Config;
use crate::db::{PreferenceStore, StoreBackend};
use crate::services::{CalendarService, PreferenceService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn StoreBackend>,
    pub calendar: CalendarService,
    pub preferences: PreferenceService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn StoreBackend>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let config = Arc::new(config);
        let calendar = CalendarService::new(store.clone(), &config.cache);
        let preferences = PreferenceService::new(preferences);

        Self {
            config,
            store,
            calendar,
            preferences,
        }
    }
}
