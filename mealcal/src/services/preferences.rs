use std::sync::Arc;

use crate::db::PreferenceStore;
use crate::error::Result;
use crate::models::Theme;

const THEME_KEY: &str = "theme";

/// Client preferences persisted in a local key-value store.
#[derive(Clone)]
pub struct PreferenceService {
    store: Arc<dyn PreferenceStore>,
}

impl PreferenceService {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Stored theme, or the default when none was saved. An unreadable value
    /// is treated as unset.
    pub async fn theme(&self) -> Result<Theme> {
        let Some(raw) = self.store.get_preference(THEME_KEY).await? else {
            return Ok(Theme::default());
        };

        match raw.parse() {
            Ok(theme) => Ok(theme),
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "ignoring stored theme");
                Ok(Theme::default())
            }
        }
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<Theme> {
        self.store
            .set_preference(THEME_KEY, &theme.to_string())
            .await?;
        tracing::debug!(%theme, "theme saved");
        Ok(theme)
    }

    pub async fn toggle_theme(&self) -> Result<Theme> {
        let current = self.theme().await?;
        self.set_theme(current.toggled()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LibSqlPreferences;

    async fn service() -> (PreferenceService, Arc<LibSqlPreferences>) {
        let store = Arc::new(LibSqlPreferences::open(":memory:").await.unwrap());
        (PreferenceService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_theme_defaults_to_light() {
        let (service, _) = service().await;
        assert_eq!(service.theme().await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn test_theme_round_trip_and_toggle() {
        let (service, _) = service().await;
        service.set_theme(Theme::Dark).await.unwrap();
        assert_eq!(service.theme().await.unwrap(), Theme::Dark);

        assert_eq!(service.toggle_theme().await.unwrap(), Theme::Light);
        assert_eq!(service.theme().await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn test_garbage_value_falls_back_to_default() {
        let (service, store) = service().await;
        store.set_preference(THEME_KEY, "sepia").await.unwrap();
        assert_eq!(service.theme().await.unwrap(), Theme::Light);
    }
}
