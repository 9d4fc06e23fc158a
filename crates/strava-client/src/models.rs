//! Strava API payload types
//!
//! Only the fields callers commonly read are modelled; unknown fields are
//! ignored on deserialize. Anything Strava may omit (privacy settings, scope,
//! device-dependent metrics) is an `Option`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `[lat, lng]` pair as sent by Strava.
pub type LatLng = [f64; 2];

/// Athlete summary, as embedded in token responses and activities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryAthlete {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub premium: Option<bool>,
    #[serde(default)]
    pub summit: Option<bool>,
    #[serde(default)]
    pub profile_medium: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Authenticated athlete profile from `GET /athlete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAthlete {
    #[serde(flatten)]
    pub summary: SummaryAthlete,
    #[serde(default)]
    pub follower_count: Option<u32>,
    #[serde(default)]
    pub friend_count: Option<u32>,
    #[serde(default)]
    pub measurement_preference: Option<String>,
    /// Functional threshold power in watts
    #[serde(default)]
    pub ftp: Option<u32>,
    /// Kilograms
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Rolled-up totals for one sport over one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityTotal {
    pub count: u32,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub moving_time: u64,
    /// Seconds
    pub elapsed_time: u64,
    /// Meters
    pub elevation_gain: f64,
    pub achievement_count: Option<u32>,
}

/// `GET /athletes/{id}/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityStats {
    pub biggest_ride_distance: Option<f64>,
    pub biggest_climb_elevation_gain: Option<f64>,
    pub recent_ride_totals: ActivityTotal,
    pub recent_run_totals: ActivityTotal,
    pub recent_swim_totals: ActivityTotal,
    pub ytd_ride_totals: ActivityTotal,
    pub ytd_run_totals: ActivityTotal,
    pub ytd_swim_totals: ActivityTotal,
    pub all_ride_totals: ActivityTotal,
    pub all_run_totals: ActivityTotal,
    pub all_swim_totals: ActivityTotal,
}

/// Reference to an athlete by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaAthlete {
    pub id: u64,
}

/// Encoded route polyline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolylineMap {
    pub id: Option<String>,
    pub polyline: Option<String>,
    pub summary_polyline: Option<String>,
}

/// Activity as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryActivity {
    pub id: u64,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub upload_id: Option<u64>,
    #[serde(default)]
    pub athlete: Option<MetaAthlete>,
    #[serde(default)]
    pub name: String,
    /// Meters
    #[serde(default)]
    pub distance: f64,
    /// Seconds
    #[serde(default)]
    pub moving_time: u64,
    /// Seconds
    #[serde(default)]
    pub elapsed_time: u64,
    /// Meters
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub start_date_local: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub start_latlng: Option<Vec<f64>>,
    #[serde(default)]
    pub end_latlng: Option<Vec<f64>>,
    #[serde(default)]
    pub achievement_count: Option<u32>,
    #[serde(default)]
    pub kudos_count: Option<u32>,
    #[serde(default)]
    pub comment_count: Option<u32>,
    #[serde(default)]
    pub trainer: Option<bool>,
    #[serde(default)]
    pub commute: Option<bool>,
    #[serde(default)]
    pub manual: Option<bool>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub gear_id: Option<String>,
    /// Meters per second
    #[serde(default)]
    pub average_speed: Option<f64>,
    /// Meters per second
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub weighted_average_watts: Option<f64>,
    #[serde(default)]
    pub max_watts: Option<f64>,
    /// Kilojoules
    #[serde(default)]
    pub kilojoules: Option<f64>,
    #[serde(default)]
    pub device_watts: Option<bool>,
    #[serde(default)]
    pub has_heartrate: Option<bool>,
    #[serde(default)]
    pub map: Option<PolylineMap>,
}

impl SummaryActivity {
    /// Start coordinates. `None` for activities without GPS, which Strava
    /// sends as an empty array.
    pub fn start_point(&self) -> Option<LatLng> {
        self.start_latlng.as_deref().and_then(lat_lng)
    }

    pub fn end_point(&self) -> Option<LatLng> {
        self.end_latlng.as_deref().and_then(lat_lng)
    }
}

fn lat_lng(raw: &[f64]) -> Option<LatLng> {
    match raw {
        [lat, lng] => Some([*lat, *lng]),
        _ => None,
    }
}

/// Full activity from `GET /activities/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedActivity {
    #[serde(flatten)]
    pub summary: SummaryActivity,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub embed_token: Option<String>,
    #[serde(default)]
    pub laps: Option<Vec<Lap>>,
    #[serde(default)]
    pub splits_metric: Option<Vec<Split>>,
    #[serde(default)]
    pub splits_standard: Option<Vec<Split>>,
    /// Only populated when `include_all_efforts` was requested
    #[serde(default)]
    pub segment_efforts: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub best_efforts: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Split {
    pub split: u32,
    pub distance: f64,
    pub elapsed_time: u64,
    pub moving_time: u64,
    pub elevation_difference: Option<f64>,
    pub average_speed: Option<f64>,
    pub pace_zone: Option<u32>,
}

/// `GET /activities/{id}/laps`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lap_index: u32,
    #[serde(default)]
    pub split: Option<u32>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: u64,
    #[serde(default)]
    pub elapsed_time: u64,
    #[serde(default)]
    pub start_index: Option<u64>,
    #[serde(default)]
    pub end_index: Option<u64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub pace_zone: Option<u32>,
}

/// One bucket of a zone distribution; `max` of `-1` means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionBucket {
    pub min: f64,
    pub max: f64,
    /// Seconds spent in this bucket
    pub time: f64,
}

/// `GET /activities/{id}/zones` returns one of these per zone type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityZone {
    /// `heartrate` or `power`
    #[serde(rename = "type")]
    pub zone_type: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub sensor_based: Option<bool>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub custom_zones: Option<bool>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub distribution_buckets: Vec<DistributionBucket>,
}

/// Stream keys accepted by the streams endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    Time,
    Distance,
    Latlng,
    Altitude,
    VelocitySmooth,
    Heartrate,
    Cadence,
    Watts,
    Temp,
    Moving,
    GradeSmooth,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Time => "time",
            StreamType::Distance => "distance",
            StreamType::Latlng => "latlng",
            StreamType::Altitude => "altitude",
            StreamType::VelocitySmooth => "velocity_smooth",
            StreamType::Heartrate => "heartrate",
            StreamType::Cadence => "cadence",
            StreamType::Watts => "watts",
            StreamType::Temp => "temp",
            StreamType::Moving => "moving",
            StreamType::GradeSmooth => "grade_smooth",
        }
    }
}

impl std::str::FromStr for StreamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown stream type: {s}"))
    }
}

/// One time series. `data` is heterogeneous across stream types (numbers,
/// booleans for `moving`, `[lat, lng]` pairs for `latlng`), so it stays raw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    /// Present when streams are returned as a list
    #[serde(default, rename = "type")]
    pub stream_type: Option<String>,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub series_type: Option<String>,
    #[serde(default)]
    pub original_size: Option<u64>,
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Streams response: a map keyed by stream type when `key_by_type=true`,
/// otherwise a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityStreams {
    Keyed(HashMap<String, Stream>),
    List(Vec<Stream>),
}

impl ActivityStreams {
    /// Look up a stream by type regardless of the response shape.
    pub fn get(&self, stream_type: StreamType) -> Option<&Stream> {
        let key = stream_type.as_str();
        match self {
            ActivityStreams::Keyed(map) => map.get(key),
            ActivityStreams::List(list) => list
                .iter()
                .find(|s| s.stream_type.as_deref() == Some(key)),
        }
    }
}
