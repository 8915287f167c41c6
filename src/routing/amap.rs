use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::geo::GeoPoint;
use crate::http::{HttpClient, QueryKey, TimedClient, get_body};
use crate::parser::parse_transit_response;
use crate::routing::{RoutingApi, TransitRoute};

pub const DEFAULT_BASE_URL: &str = "https://restapi.amap.com/v5/direction/transit/integrated";

/// Connection settings for the Amap routing endpoint.
#[derive(Debug, Clone)]
pub struct AmapConfig {
    pub base_url: String,
    pub api_key: String,
    /// Amap city code used for both ends of the trip (`"029"` is Xi'an).
    pub city_code: String,
    pub timeout: Duration,
}

impl AmapConfig {
    pub fn new(api_key: &str, city_code: &str, timeout: Duration) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            city_code: city_code.to_string(),
            timeout,
        }
    }
}

pub struct AmapClient<C> {
    http: QueryKey<C>,
    base_url: String,
    city_code: String,
}

impl AmapClient<TimedClient> {
    /// Builds a client over a fresh `reqwest` client with the configured timeout.
    pub fn new(config: AmapConfig) -> Result<Self> {
        let inner = TimedClient::new(config.timeout)?;
        Ok(Self::with_client(inner, config))
    }
}

impl<C: HttpClient> AmapClient<C> {
    pub fn with_client(inner: C, config: AmapConfig) -> Self {
        Self {
            http: QueryKey::new(inner, "key", &config.api_key),
            base_url: config.base_url,
            city_code: config.city_code,
        }
    }

    /// Request URL without the API key, which [`QueryKey`] appends.
    pub fn request_url(&self, origin: &GeoPoint, destination: &GeoPoint) -> String {
        format!(
            "{}?origin={}&destination={}&city1={}&city2={}&output=json",
            self.base_url,
            origin.to_query_param(),
            destination.to_query_param(),
            self.city_code,
            self.city_code,
        )
    }
}

#[async_trait]
impl<C: HttpClient> RoutingApi for AmapClient<C> {
    async fn transit_plans(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<Option<TransitRoute>> {
        let url = self.request_url(origin, destination);
        let bytes = get_body(&self.http, &url).await?;
        let response = parse_transit_response(&bytes)?;

        if !response.is_success() {
            debug!(
                status = %response.status,
                info = response.info.as_deref().unwrap_or(""),
                "Routing API returned non-success status"
            );
            return Ok(None);
        }

        Ok(Some(response.route.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url() {
        let config = AmapConfig::new("secret", "029", Duration::from_secs(10));
        let client = AmapClient::new(config).unwrap();

        let url = client.request_url(
            &GeoPoint::new(108.9188388, 34.2428542),
            &GeoPoint::new(108.9053867, 34.24247),
        );

        assert_eq!(
            url,
            "https://restapi.amap.com/v5/direction/transit/integrated\
             ?origin=108.918839,34.242854&destination=108.905387,34.242470\
             &city1=029&city2=029&output=json"
        );
        assert!(!url.contains("secret"));
    }
}
