//! Request validation rules for device, query and chat input.
//!
//! Payloads are inspected as loose JSON so that every failing field can be
//! reported at once instead of stopping at the first deserialization error.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::reading::NewReading;

pub const TEMPERATURE_RANGE: (f64, f64) = (-50.0, 100.0);
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
pub const MAX_LABEL_LEN: usize = 255;
pub const DEFAULT_LATEST_LIMIT: usize = 10;
pub const MAX_LATEST_LIMIT: i64 = 100;
pub const DEFAULT_STATS_HOURS: i64 = 24;
/// One week.
pub const MAX_STATS_HOURS: i64 = 168;
pub const MAX_CHAT_MESSAGE_LEN: usize = 1000;
pub const MAX_MODEL_NAME_LEN: usize = 50;

/// Field-keyed validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("validation failed for {} field(s)", .0.len())]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn display_name(field: &str) -> String {
    field.replace('_', " ")
}

/// Rule checker over one JSON object payload.
pub struct Validator<'a> {
    payload: &'a Value,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    pub fn new(payload: &'a Value) -> Self {
        Self {
            payload,
            errors: ValidationErrors::new(),
        }
    }

    /// First present, non-null value among `names`. The first name is canonical.
    fn lookup(&self, names: &[&str]) -> Option<&'a Value> {
        names
            .iter()
            .filter_map(|name| self.payload.get(*name))
            .find(|value| !value.is_null())
    }

    fn is_blank(value: &Value) -> bool {
        matches!(value, Value::String(s) if s.trim().is_empty())
    }

    fn require(&mut self, names: &[&str]) -> Option<&'a Value> {
        match self.lookup(names) {
            Some(value) if !Self::is_blank(value) => Some(value),
            _ => {
                let field = names[0];
                self.errors.add(
                    field,
                    format!("The {} field is required.", display_name(field)),
                );
                None
            }
        }
    }

    fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    fn as_integer(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    fn check_string(&mut self, field: &str, value: &Value, max_len: usize) -> Option<String> {
        let Value::String(s) = value else {
            self.errors.add(
                field,
                format!("The {} field must be a string.", display_name(field)),
            );
            return None;
        };
        let s = s.trim();
        if s.chars().count() > max_len {
            self.errors.add(
                field,
                format!(
                    "The {} field must not be greater than {max_len} characters.",
                    display_name(field)
                ),
            );
            return None;
        }
        Some(s.to_string())
    }

    pub fn required_string(&mut self, names: &[&str], max_len: usize) -> Option<String> {
        let value = self.require(names)?;
        self.check_string(names[0], value, max_len)
    }

    pub fn optional_string(&mut self, names: &[&str], max_len: usize) -> Option<String> {
        let value = self.lookup(names).filter(|v| !Self::is_blank(v))?;
        self.check_string(names[0], value, max_len)
    }

    pub fn required_number_between(
        &mut self,
        names: &[&str],
        min: f64,
        max: f64,
    ) -> Option<f64> {
        let field = names[0];
        let value = self.require(names)?;
        let Some(number) = Self::as_number(value) else {
            self.errors.add(
                field,
                format!("The {} field must be a number.", display_name(field)),
            );
            return None;
        };
        if number < min || number > max {
            self.errors.add(
                field,
                format!(
                    "The {} field must be between {min} and {max}.",
                    display_name(field)
                ),
            );
            return None;
        }
        Some(number)
    }

    pub fn optional_integer_between(
        &mut self,
        names: &[&str],
        min: i64,
        max: i64,
    ) -> Option<i64> {
        let field = names[0];
        let value = self.lookup(names).filter(|v| !Self::is_blank(v))?;
        let Some(number) = Self::as_integer(value) else {
            self.errors.add(
                field,
                format!("The {} field must be an integer.", display_name(field)),
            );
            return None;
        };
        if number < min {
            self.errors.add(
                field,
                format!("The {} field must be at least {min}.", display_name(field)),
            );
            return None;
        }
        if number > max {
            self.errors.add(
                field,
                format!(
                    "The {} field must not be greater than {max}.",
                    display_name(field)
                ),
            );
            return None;
        }
        Some(number)
    }

    pub fn finish(self) -> ValidationErrors {
        self.errors
    }
}

/// A validated reading plus the credential that identifies its owner
/// (`user_id` or `api_key`, depending on the endpoint).
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSubmission {
    pub owner: String,
    pub reading: NewReading,
}

pub fn validate_reading(
    payload: &Value,
    owner_field: &str,
) -> Result<ReadingSubmission, ValidationErrors> {
    let mut v = Validator::new(payload);
    let owner = v.required_string(&[owner_field], MAX_LABEL_LEN);
    let temperature = v.required_number_between(
        &["temperature", "suhu"],
        TEMPERATURE_RANGE.0,
        TEMPERATURE_RANGE.1,
    );
    let humidity = v.required_number_between(
        &["humidity", "kelembapan"],
        HUMIDITY_RANGE.0,
        HUMIDITY_RANGE.1,
    );
    let location = v.optional_string(&["location"], MAX_LABEL_LEN);
    let device_id = v.optional_string(&["device_id"], MAX_LABEL_LEN);
    let errors = v.finish();

    match (owner, temperature, humidity) {
        (Some(owner), Some(temperature), Some(humidity)) if errors.is_empty() => {
            Ok(ReadingSubmission {
                owner,
                reading: NewReading {
                    temperature,
                    humidity,
                    location,
                    device_id,
                },
            })
        }
        _ => Err(errors),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestQuery {
    pub user_id: String,
    pub limit: usize,
}

pub fn validate_latest(payload: &Value) -> Result<LatestQuery, ValidationErrors> {
    let mut v = Validator::new(payload);
    let user_id = v.required_string(&["user_id"], MAX_LABEL_LEN);
    let limit = v.optional_integer_between(&["limit"], 1, MAX_LATEST_LIMIT);
    let errors = v.finish();

    match user_id {
        Some(user_id) if errors.is_empty() => Ok(LatestQuery {
            user_id,
            limit: limit
                .and_then(|l| usize::try_from(l).ok())
                .unwrap_or(DEFAULT_LATEST_LIMIT),
        }),
        _ => Err(errors),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub user_id: String,
    pub hours: i64,
}

pub fn validate_stats(payload: &Value) -> Result<StatsQuery, ValidationErrors> {
    let mut v = Validator::new(payload);
    let user_id = v.required_string(&["user_id"], MAX_LABEL_LEN);
    let hours = v.optional_integer_between(&["hours"], 1, MAX_STATS_HOURS);
    let errors = v.finish();

    match user_id {
        Some(user_id) if errors.is_empty() => Ok(StatsQuery {
            user_id,
            hours: hours.unwrap_or(DEFAULT_STATS_HOURS),
        }),
        _ => Err(errors),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSubmission {
    pub message: String,
    pub model: Option<String>,
}

pub fn validate_chat(payload: &Value) -> Result<ChatSubmission, ValidationErrors> {
    let mut v = Validator::new(payload);
    let message = v.required_string(&["message"], MAX_CHAT_MESSAGE_LEN);
    let model = v.optional_string(&["model"], MAX_MODEL_NAME_LEN);
    let errors = v.finish();

    match message {
        Some(message) if errors.is_empty() => Ok(ChatSubmission { message, model }),
        _ => Err(errors),
    }
}
