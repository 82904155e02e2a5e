//! Where boundary documents come from.
//!
//! The viewer only ever talks to a [`FeatureSource`]; the HTTP implementation
//! resolves each [`LayerKind`] to the URL configured for it.

use crate::{
    core::config::ViewerConfig, data::geojson::GeoJson, layers::kind::LayerKind,
    prelude::HashMap, MapError, Result,
};
use async_trait::async_trait;

/// Fetches and parses the feature collection of one layer kind
#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn fetch(&self, kind: LayerKind) -> Result<GeoJson>;
}

/// Fetches GeoJSON documents over HTTP(S)
pub struct HttpFeatureSource {
    client: reqwest::Client,
    urls: HashMap<LayerKind, String>,
}

impl HttpFeatureSource {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.tiles.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            urls: config.data_sources.clone(),
        })
    }

    /// URL configured for `kind`
    pub fn url(&self, kind: LayerKind) -> Option<&str> {
        self.urls.get(&kind).map(String::as_str)
    }
}

#[async_trait]
impl FeatureSource for HttpFeatureSource {
    async fn fetch(&self, kind: LayerKind) -> Result<GeoJson> {
        let url = self
            .url(kind)
            .ok_or_else(|| MapError::Config(format!("no data source configured for {}", kind)))?;

        log::debug!("fetching {} from {}", kind, url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(MapError::Network)?
            .error_for_status()
            .map_err(MapError::Network)?;

        let body = response.text().await.map_err(MapError::Network)?;
        log::debug!("fetched {} ({} bytes)", kind, body.len());

        GeoJson::from_str(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_follow_config() {
        let config = ViewerConfig::default();
        let source = HttpFeatureSource::new(&config).unwrap();

        assert_eq!(
            source.url(LayerKind::House),
            Some("https://raw.githubusercontent.com/hayatkhan20/Election-NC/main/state_house_min.geojson")
        );
    }

    #[tokio::test]
    async fn test_missing_url_is_config_error() {
        let mut config = ViewerConfig::default();
        config.data_sources.remove(&LayerKind::Senate);
        let source = HttpFeatureSource::new(&config).unwrap();

        let err = source.fetch(LayerKind::Senate).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MapError>(),
            Some(MapError::Config(_))
        ));
    }
}
