//! Sensor readings pushed by IoT devices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Location/device label used when a device does not report one.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One temperature/humidity sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: String,
    pub user_id: String,
    /// Degrees Celsius.
    #[serde(alias = "suhu")]
    pub temperature: f64,
    /// Relative humidity in percent.
    #[serde(alias = "kelembapan")]
    pub humidity: f64,
    pub location: String,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SensorReading {
    /// Build a reading for `user_id` stamped at `at`.
    pub fn new(user_id: impl Into<String>, input: NewReading, at: DateTime<Utc>) -> Self {
        Self {
            id: format!("reading_{}", Uuid::new_v4().simple()),
            user_id: user_id.into(),
            temperature: input.temperature,
            humidity: input.humidity,
            location: input.location.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            device_id: input.device_id.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            created_at: at,
            updated_at: at,
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
        }
    }
}

/// Validated device payload, before it is bound to a user and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub temperature: f64,
    pub humidity: f64,
    pub location: Option<String>,
    pub device_id: Option<String>,
}

/// Measured quantity of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
}
