//! Nearby duplicate check
//!
//! Before a citizen files a report, look up what is already reported around
//! them. The result is advisory: every failure degrades to "nothing nearby"
//! so the report form is never blocked.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::models::{Coordinates, Location, NearbyIssue, NearbyQuery};

use crate::issues::NearbySearch;
use crate::{ClientConfig, ClientError, ClientResult};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Device position source
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// `ClientError::Geolocation` when denied or unavailable
    async fn current_position(&self) -> ClientResult<Coordinates>;
}

/// Position known up front (CLI flag, saved station, tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Option<Coordinates>);

#[async_trait]
impl GeolocationProvider for FixedPosition {
    async fn current_position(&self) -> ClientResult<Coordinates> {
        self.0
            .ok_or_else(|| ClientError::Geolocation("Location permission denied".into()))
    }
}

/// Coordinates to a human-readable address
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, position: Coordinates) -> ClientResult<String>;
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
}

/// OpenStreetMap Nominatim reverse lookup
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Self::with_base_url(config, NOMINATIM_URL)
    }

    pub fn with_base_url(config: &ClientConfig, base_url: impl Into<String>) -> ClientResult<Self> {
        // Nominatim rejects requests without a User-Agent
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, position: Coordinates) -> ClientResult<String> {
        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}",
            self.base_url, position.latitude, position.longitude
        );
        let body: NominatimReverse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        body.display_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("No display_name in reverse lookup".into()))
    }
}

/// Outcome of a duplicate check
#[derive(Debug, Clone, Default)]
pub struct DuplicateReport {
    /// Where the device is, with the best address we could get
    pub location: Option<Location>,
    /// Existing issues around it, closest first
    pub candidates: Vec<NearbyIssue>,
}

impl DuplicateReport {
    pub fn has_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }
}

pub struct DuplicateCheck<G, R, N> {
    geolocation: G,
    geocoder: R,
    search: N,
    /// `None` uses the server default
    max_distance: Option<f64>,
}

impl<G, R, N> DuplicateCheck<G, R, N>
where
    G: GeolocationProvider,
    R: ReverseGeocoder,
    N: NearbySearch,
{
    pub fn new(geolocation: G, geocoder: R, search: N) -> Self {
        Self {
            geolocation,
            geocoder,
            search,
            max_distance: None,
        }
    }

    /// Search radius in meters
    pub fn with_max_distance(mut self, meters: f64) -> Self {
        self.max_distance = Some(meters);
        self
    }

    /// Never fails; see the module docs
    pub async fn run(&self) -> DuplicateReport {
        let position = match self.geolocation.current_position().await {
            Ok(position) => position,
            Err(e) => {
                tracing::info!(error = %e, "No position, skipping duplicate check");
                return DuplicateReport::default();
            }
        };

        let address = match self.geocoder.reverse(position).await {
            Ok(address) => address,
            Err(e) => {
                tracing::debug!(error = %e, "Reverse geocoding failed, using coordinates");
                position.display_fallback()
            }
        };

        let query = NearbyQuery {
            longitude: position.longitude,
            latitude: position.latitude,
            max_distance: self.max_distance,
        };
        let candidates = self.search.nearby(query).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Nearby search failed");
            Vec::new()
        });

        DuplicateReport {
            location: Some(Location::new(position.longitude, position.latitude, address)),
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use shared::models::{Issue, IssueStatus, Priority, UserRef};

    struct FakeGeocoder(Option<&'static str>);

    #[async_trait]
    impl ReverseGeocoder for FakeGeocoder {
        async fn reverse(&self, _position: Coordinates) -> ClientResult<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| ClientError::InvalidResponse("offline".into()))
        }
    }

    #[derive(Default)]
    struct FakeSearch {
        fail: bool,
        queries: Mutex<Vec<NearbyQuery>>,
    }

    fn nearby_issue(distance: f64) -> NearbyIssue {
        NearbyIssue {
            issue: Issue {
                id: "i1".into(),
                text: "Overflowing drain".into(),
                image_link: None,
                location: Location::new(77.0, 12.0, "MG Road"),
                category: "drainage".into(),
                status: IssueStatus::Open,
                region: "general".into(),
                priority: Priority::Medium,
                upvotes: 0,
                reported_by: UserRef {
                    id: "u1".into(),
                    name: "A".into(),
                },
                created_at: Utc::now(),
                updated_at: Utc::now(),
                comments: Vec::new(),
            },
            distance,
        }
    }

    #[async_trait]
    impl NearbySearch for FakeSearch {
        async fn nearby(&self, query: NearbyQuery) -> ClientResult<Vec<NearbyIssue>> {
            self.queries.lock().push(query);
            if self.fail {
                return Err(ClientError::NotFound("gone".into()));
            }
            Ok(vec![nearby_issue(42.0)])
        }
    }

    fn here() -> Coordinates {
        Coordinates::new(12.0, 77.0)
    }

    #[tokio::test]
    async fn test_denied_geolocation_yields_empty_report() {
        let check = DuplicateCheck::new(FixedPosition(None), FakeGeocoder(Some("x")), FakeSearch::default());
        let report = check.run().await;
        assert!(report.location.is_none());
        assert!(!report.has_candidates());
        assert!(check.search.queries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_candidates_with_geocoded_address() {
        let check = DuplicateCheck::new(
            FixedPosition(Some(here())),
            FakeGeocoder(Some("MG Road, Bengaluru")),
            FakeSearch::default(),
        )
        .with_max_distance(250.0);

        let report = check.run().await;
        assert_eq!(report.location.unwrap().address, "MG Road, Bengaluru");
        assert_eq!(report.candidates.len(), 1);

        let queries = check.search.queries.lock();
        assert_eq!(queries[0].max_distance, Some(250.0));
        assert_eq!(queries[0].longitude, 77.0);
    }

    #[tokio::test]
    async fn test_geocoder_failure_falls_back_to_coordinates() {
        let check = DuplicateCheck::new(
            FixedPosition(Some(here())),
            FakeGeocoder(None),
            FakeSearch::default(),
        );
        let report = check.run().await;
        assert_eq!(report.location.unwrap().address, "12, 77");
    }

    #[tokio::test]
    async fn test_search_failure_is_advisory() {
        let check = DuplicateCheck::new(
            FixedPosition(Some(here())),
            FakeGeocoder(Some("x")),
            FakeSearch {
                fail: true,
                ..FakeSearch::default()
            },
        );
        let report = check.run().await;
        assert!(report.location.is_some());
        assert!(report.candidates.is_empty());
    }
}
