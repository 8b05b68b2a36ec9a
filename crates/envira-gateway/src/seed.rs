//! Demo data: a week of hourly readings plus a dense recent tail.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use envira_core::{stats::round1, NewReading, SensorReading, User};
use rand::Rng;
use tracing::info;

use crate::db::{RepositoryError, Repositories};

pub const SEED_LOCATION: &str = "Living Room";
pub const SEED_DEVICE: &str = "DHT22_001";

const DAYS: i64 = 7;
const RECENT_MINUTES: i64 = 300;
const RECENT_STEP_MINUTES: usize = 5;

fn reading(user_id: &str, temperature: f64, humidity: f64, at: DateTime<Utc>) -> SensorReading {
    SensorReading::new(
        user_id,
        NewReading {
            temperature: round1(temperature),
            humidity: round1(humidity),
            location: Some(SEED_LOCATION.to_string()),
            device_id: Some(SEED_DEVICE.to_string()),
        },
        at,
    )
}

/// Hourly readings on a daily temperature cycle for the last seven calendar
/// days, then one reading every five minutes for the last five hours.
/// Timestamps after `now` are skipped.
pub fn generate_readings<R: Rng + ?Sized>(
    user_id: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<SensorReading> {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let mut readings = Vec::new();

    for day in (0..DAYS).rev() {
        let start = today - Duration::days(day);
        for hour in 0..24u32 {
            let at = start + Duration::hours(i64::from(hour));
            if at > now {
                break;
            }
            let cycle = ((f64::from(hour) - 6.0) * PI / 12.0).sin() * 4.0;
            let temperature = 22.0 + cycle + f64::from(rng.gen_range(-20..=20_i32)) / 10.0;
            let humidity = (55.0 - (temperature - 22.0) * 2.0
                + f64::from(rng.gen_range(-100..=100_i32)) / 10.0)
                .clamp(30.0, 80.0);
            readings.push(reading(user_id, temperature, humidity, at));
        }
    }

    for minutes in (0..=RECENT_MINUTES).rev().step_by(RECENT_STEP_MINUTES) {
        let temperature = 23.5 + f64::from(rng.gen_range(-5..=5_i32)) / 10.0;
        let humidity = 52.0 + f64::from(rng.gen_range(-20..=20_i32)) / 10.0;
        readings.push(reading(
            user_id,
            temperature,
            humidity,
            now - Duration::minutes(minutes),
        ));
    }

    readings
}

/// Seed the first user's readings, creating a test user on an empty store.
/// Returns the total number of stored readings.
pub async fn run(repositories: &Repositories) -> Result<usize, RepositoryError> {
    let user: User = match repositories.users.first().await? {
        Some(user) => user,
        None => {
            let user = repositories
                .users
                .create("Test User", "test@example.com")
                .await?;
            info!("created seed user {} <{}>", user.id, user.email);
            user
        }
    };

    let now = Utc::now().with_nanosecond(0).unwrap_or_else(Utc::now);
    let readings = {
        let mut rng = rand::thread_rng();
        generate_readings(&user.id, now, &mut rng)
    };
    for reading in readings {
        repositories.readings.insert(reading).await?;
    }

    let total = repositories.readings.count().await?;
    info!("Created {} sensor data records.", total);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 14, 30, 0).unwrap()
    }

    #[test]
    fn generates_week_plus_recent_tail() {
        let mut rng = StdRng::seed_from_u64(7);
        let readings = generate_readings("user_1", now(), &mut rng);

        // 6 full days, 15 hours today, 61 five-minute readings.
        assert_eq!(readings.len(), 6 * 24 + 15 + 61);
        assert!(readings.iter().all(|r| r.created_at <= now()));
        assert_eq!(
            readings[0].created_at,
            Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap()
        );
        assert_eq!(readings.last().unwrap().created_at, now());
    }

    #[test]
    fn values_stay_in_plausible_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let readings = generate_readings("user_1", now(), &mut rng);

        for r in &readings {
            assert!((16.0..=28.0).contains(&r.temperature), "{}", r.temperature);
            assert!((30.0..=80.0).contains(&r.humidity), "{}", r.humidity);
            assert_eq!(r.location, SEED_LOCATION);
            assert_eq!(r.device_id, SEED_DEVICE);
            assert_eq!(r.temperature, round1(r.temperature));
        }

        for r in &readings[readings.len() - 61..] {
            assert!((23.0..=24.0).contains(&r.temperature));
            assert!((50.0..=54.0).contains(&r.humidity));
        }
    }

    #[tokio::test]
    async fn run_creates_user_when_store_is_empty() {
        let repositories = Repositories::in_memory();

        let total = run(&repositories).await.unwrap();

        let user = repositories.users.first().await.unwrap().unwrap();
        assert_eq!(user.email, "test@example.com");
        assert!(total >= 61 + 6 * 24);
        assert_eq!(repositories.readings.count_for_user(&user.id).await.unwrap(), total);
    }
}
