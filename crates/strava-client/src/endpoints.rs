//! Typed wrappers over the Strava endpoints the client supports

use reqwest::Method;
use tracing::{debug, info, instrument};

use crate::client::StravaClient;
use crate::dispatch::RequestOptions;
use crate::error::Result;
use crate::models::{
    ActivityStats, ActivityStreams, ActivityZone, DetailedActivity, DetailedAthlete, Lap,
    StreamType, SummaryActivity,
};

/// Page size `get_all_activities` uses when none is given, and its cap (Strava's maximum).
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Filters and paging for the athlete activity list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityListParams {
    /// Only activities that started before this unix time
    pub before: Option<i64>,
    /// Only activities that started after this unix time
    pub after: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ActivityListParams {
    fn to_options(&self) -> RequestOptions {
        RequestOptions::new()
            .opt_param("before", self.before)
            .opt_param("after", self.after)
            .opt_param("page", self.page)
            .opt_param("per_page", self.per_page)
    }
}

impl StravaClient {
    /// The authenticated athlete.
    pub async fn get_athlete(&mut self) -> Result<DetailedAthlete> {
        self.request(Method::GET, "/athlete", RequestOptions::new())
            .await
    }

    pub async fn get_athlete_stats(&mut self, athlete_id: u64) -> Result<ActivityStats> {
        self.request(
            Method::GET,
            &format!("/athletes/{athlete_id}/stats"),
            RequestOptions::new(),
        )
        .await
    }

    /// One page of the authenticated athlete's activities, newest first.
    pub async fn get_activities(
        &mut self,
        params: &ActivityListParams,
    ) -> Result<Vec<SummaryActivity>> {
        self.request(Method::GET, "/athlete/activities", params.to_options())
            .await
    }

    pub async fn get_activity(
        &mut self,
        activity_id: u64,
        include_all_efforts: Option<bool>,
    ) -> Result<DetailedActivity> {
        self.request(
            Method::GET,
            &format!("/activities/{activity_id}"),
            RequestOptions::new().opt_param("include_all_efforts", include_all_efforts),
        )
        .await
    }

    /// Sensor streams for an activity.
    ///
    /// `keys` is sent comma-joined; an empty slice leaves the choice to
    /// Strava. With `key_by_type` the response is a map keyed by stream type,
    /// otherwise a list.
    pub async fn get_activity_streams(
        &mut self,
        activity_id: u64,
        keys: &[StreamType],
        key_by_type: bool,
    ) -> Result<ActivityStreams> {
        let keys = (!keys.is_empty()).then(|| {
            keys.iter()
                .map(StreamType::as_str)
                .collect::<Vec<_>>()
                .join(",")
        });
        self.request(
            Method::GET,
            &format!("/activities/{activity_id}/streams"),
            RequestOptions::new()
                .opt_param("keys", keys)
                .param("key_by_type", key_by_type),
        )
        .await
    }

    pub async fn get_activity_zones(&mut self, activity_id: u64) -> Result<Vec<ActivityZone>> {
        self.request(
            Method::GET,
            &format!("/activities/{activity_id}/zones"),
            RequestOptions::new(),
        )
        .await
    }

    pub async fn get_activity_laps(&mut self, activity_id: u64) -> Result<Vec<Lap>> {
        self.request(
            Method::GET,
            &format!("/activities/{activity_id}/laps"),
            RequestOptions::new(),
        )
        .await
    }

    /// Every activity matching `before`/`after`, fetched page by page.
    ///
    /// Pages are requested in order starting at `params.page` (default 1)
    /// and concatenated. `per_page` is capped at `DEFAULT_PAGE_SIZE`, the
    /// most Strava returns. Paging stops at the first page that is empty or
    /// shorter than the page size. Any error aborts the walk and discards
    /// what was collected so far.
    #[instrument(skip_all, fields(before = ?params.before, after = ?params.after))]
    pub async fn get_all_activities(
        &mut self,
        params: &ActivityListParams,
    ) -> Result<Vec<SummaryActivity>> {
        let per_page = params
            .per_page
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(DEFAULT_PAGE_SIZE);
        let mut all = Vec::new();
        let mut page = params.page.filter(|&n| n > 0).unwrap_or(1);

        loop {
            let batch = self
                .get_activities(&ActivityListParams {
                    page: Some(page),
                    per_page: Some(per_page),
                    ..params.clone()
                })
                .await?;
            let fetched = batch.len();
            debug!(page, fetched, "activity page fetched");
            all.extend(batch);

            if fetched < per_page as usize {
                break;
            }
            page += 1;
        }

        info!(last_page = page, total = all.len(), "activities collected");
        Ok(all)
    }

    /// Whether the API accepts the current credentials.
    ///
    /// Calls `get_athlete` and folds every failure into `false`.
    pub async fn test_connection(&mut self) -> bool {
        match self.get_athlete().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "connection check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use strava_auth::{TokenSet, unix_now};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::Error;
    use crate::test_support::client_for;

    async fn authed_client(server: &MockServer) -> StravaClient {
        let mut client = client_for(server);
        client.set_tokens(TokenSet::new("at", "rt", unix_now() + 7200));
        client
    }

    fn activities(ids: std::ops::Range<u64>) -> Value {
        Value::Array(
            ids.map(|id| json!({"id": id, "name": format!("Run {id}"), "type": "Run"}))
                .collect(),
        )
    }

    async fn mount_page(server: &MockServer, page: &str, per_page: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete/activities"))
            .and(query_param("page", page))
            .and(query_param("per_page", per_page))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn all_activities_stops_on_short_page() {
        let server = MockServer::start().await;
        mount_page(&server, "1", "2", activities(1..3)).await;
        mount_page(&server, "2", "2", activities(3..5)).await;
        mount_page(&server, "3", "2", activities(5..6)).await;

        let mut client = authed_client(&server).await;
        let all = client
            .get_all_activities(&ActivityListParams {
                per_page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        let ids: Vec<u64> = all.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn all_activities_stops_on_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, "1", "2", activities(1..3)).await;
        mount_page(&server, "2", "2", json!([])).await;

        let mut client = authed_client(&server).await;
        let all = client
            .get_all_activities(&ActivityListParams {
                per_page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn all_activities_starts_at_callers_page() {
        let server = MockServer::start().await;
        mount_page(&server, "3", "2", activities(5..7)).await;
        mount_page(&server, "4", "2", activities(7..8)).await;

        let mut client = authed_client(&server).await;
        let all = client
            .get_all_activities(&ActivityListParams {
                page: Some(3),
                per_page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        let ids: Vec<u64> = all.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![5, 6, 7]);
    }

    #[tokio::test]
    async fn all_activities_caps_oversized_page_size() {
        let server = MockServer::start().await;
        mount_page(&server, "1", "200", activities(1..201)).await;
        mount_page(&server, "2", "200", activities(201..202)).await;

        let mut client = authed_client(&server).await;
        let all = client
            .get_all_activities(&ActivityListParams {
                per_page: Some(500),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(all.len(), 201);
        assert_eq!(all.last().map(|a| a.id), Some(201));
    }

    #[tokio::test]
    async fn all_activities_defaults_page_size_and_forwards_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete/activities"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "200"))
            .and(query_param("after", "1700000000"))
            .and(query_param_is_missing("before"))
            .respond_with(ResponseTemplate::new(200).set_body_json(activities(1..4)))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        let all = client
            .get_all_activities(&ActivityListParams {
                after: Some(1_700_000_000),
                page: Some(0),
                per_page: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn all_activities_error_discards_partial_results() {
        let server = MockServer::start().await;
        mount_page(&server, "1", "2", activities(1..3)).await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete/activities"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({"message": "Rate Limit Exceeded"})))
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        let result = client
            .get_all_activities(&ActivityListParams {
                per_page: Some(2),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(Error::RateLimit { .. })), "got {result:?}");
    }

    #[tokio::test]
    async fn single_page_omits_unset_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete/activities"))
            .and(query_param("per_page", "30"))
            .and(query_param_is_missing("page"))
            .and(query_param_is_missing("before"))
            .and(query_param_is_missing("after"))
            .respond_with(ResponseTemplate::new(200).set_body_json(activities(1..2)))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        let page = client
            .get_activities(&ActivityListParams {
                per_page: Some(30),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page[0].activity_type.as_deref(), Some("Run"));
    }

    #[tokio::test]
    async fn athlete_stats_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athletes/227615/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "biggest_ride_distance": 175454.0,
                "recent_run_totals": {"count": 3, "distance": 21000.0, "moving_time": 6300,
                    "elapsed_time": 6500, "elevation_gain": 120.0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        let stats = client.get_athlete_stats(227615).await.unwrap();
        assert_eq!(stats.recent_run_totals.count, 3);
        assert_eq!(stats.ytd_ride_totals.count, 0);
    }

    #[tokio::test]
    async fn activity_forwards_include_all_efforts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/activities/42"))
            .and(query_param("include_all_efforts", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42, "name": "Morning Ride", "type": "Ride", "calories": 870.4
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        let activity = client.get_activity(42, Some(true)).await.unwrap();
        assert_eq!(activity.summary.id, 42);
        assert_eq!(activity.calories, Some(870.4));
    }

    #[tokio::test]
    async fn streams_keyed_by_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/activities/42/streams"))
            .and(query_param("keys", "time,heartrate"))
            .and(query_param("key_by_type", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "time": {"data": [0, 1, 2], "series_type": "distance", "original_size": 3, "resolution": "high"},
                "heartrate": {"data": [120, 125, 130], "series_type": "distance", "original_size": 3, "resolution": "high"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        let streams = client
            .get_activity_streams(42, &[StreamType::Time, StreamType::Heartrate], true)
            .await
            .unwrap();
        assert!(matches!(streams, ActivityStreams::Keyed(_)));
        assert!(streams.get(StreamType::Heartrate).is_some());
        assert!(streams.get(StreamType::Watts).is_none());
    }

    #[tokio::test]
    async fn streams_without_keys_omit_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/activities/42/streams"))
            .and(query_param_is_missing("keys"))
            .and(query_param("key_by_type", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"type": "distance", "data": [0.0, 5.2], "series_type": "distance", "original_size": 2, "resolution": "high"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        let streams = client.get_activity_streams(42, &[], false).await.unwrap();
        assert!(matches!(streams, ActivityStreams::List(ref list) if list.len() == 1));
    }

    #[tokio::test]
    async fn zones_and_laps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/activities/42/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"type": "heartrate", "sensor_based": true, "distribution_buckets": [
                    {"min": 0.0, "max": 115.0, "time": 120.0},
                    {"min": 115.0, "max": 152.0, "time": 1800.0}
                ]}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/activities/42/laps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Lap 1", "lap_index": 1, "elapsed_time": 300, "moving_time": 290, "distance": 1000.0}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        let zones = client.get_activity_zones(42).await.unwrap();
        assert_eq!(zones[0].zone_type, "heartrate");
        assert_eq!(zones[0].distribution_buckets.len(), 2);

        let laps = client.get_activity_laps(42).await.unwrap();
        assert_eq!(laps[0].lap_index, 1);
    }

    #[tokio::test]
    async fn connection_check_reports_bool() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Authorization Error"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        assert!(!client.test_connection().await);

        let mut unauthenticated = client_for(&server);
        assert!(!unauthenticated.test_connection().await);
    }

    #[tokio::test]
    async fn connection_check_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/athlete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "firstname": "Ann"})))
            .mount(&server)
            .await;

        let mut client = authed_client(&server).await;
        assert!(client.test_connection().await);
    }
}
