use std::sync::Arc;

use chrono::NaiveDate;
use kurye_core::{ApiClientOptions, OptimizedRoute, RouteHistoryEntry, StartingLocation};
use kurye_diagnostics::ErrorReporter;

use crate::client::AuthenticatedClient;
use crate::error::ApiError;

/// Client for `/api/routes`. Optimization itself runs on the backend.
#[derive(Debug)]
pub struct RouteService {
    client: AuthenticatedClient,
}

impl RouteService {
    /// # Errors
    ///
    /// See [`AuthenticatedClient::new`].
    pub fn new(options: &ApiClientOptions, reporter: Arc<ErrorReporter>) -> Result<Self, ApiError> {
        Ok(Self {
            client: AuthenticatedClient::new("RouteService", options, reporter)?,
        })
    }

    #[must_use]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Fetches the optimized stop sequence for `route_date` (today when
    /// `None`), starting from `start` instead of the backend's default depot
    /// when given.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn get_optimized_route(
        &self,
        route_date: Option<NaiveDate>,
        start: Option<&StartingLocation>,
    ) -> Result<OptimizedRoute, ApiError> {
        let query = route_query(route_date, start);
        self.client
            .get("/api/routes", &query, "Could not load the route")
            .await
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn get_route_history(&self) -> Result<Vec<RouteHistoryEntry>, ApiError> {
        let history: Option<Vec<RouteHistoryEntry>> = self
            .client
            .get("/api/routes/history", &[], "Could not load route history")
            .await?;
        Ok(history.unwrap_or_default())
    }

    /// Liveness probe for the routes router.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn test_route(&self) -> Result<serde_json::Value, ApiError> {
        self.client
            .get("/api/routes/test", &[], "Route service unavailable")
            .await
    }
}

/// Coordinates use `{:?}` so whole numbers keep their decimal point
/// (`29.0`, not `29`).
pub(crate) fn route_query(
    route_date: Option<NaiveDate>,
    start: Option<&StartingLocation>,
) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(date) = route_date {
        query.push(("route_date", date.format("%Y-%m-%d").to_string()));
    }
    if let Some(start) = start {
        query.push(("start_lat", format!("{:?}", start.latitude)));
        query.push(("start_lng", format!("{:?}", start.longitude)));
        query.push(("start_address", start.name.clone()));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_no_query() {
        assert!(route_query(None, None).is_empty());
    }

    #[test]
    fn start_location_adds_three_params() {
        let start = StartingLocation {
            latitude: 41.05,
            longitude: 29.0,
            name: "X".to_owned(),
        };
        let date = NaiveDate::from_ymd_opt(2025, 8, 1);
        let query = route_query(date, Some(&start));
        assert_eq!(
            query,
            vec![
                ("route_date", "2025-08-01".to_owned()),
                ("start_lat", "41.05".to_owned()),
                ("start_lng", "29.0".to_owned()),
                ("start_address", "X".to_owned()),
            ]
        );
    }
}
