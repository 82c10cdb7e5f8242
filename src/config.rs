use std::env;
use std::str::FromStr;

use chrono::Duration;

/// Upper bounds for the policy windows. One year either way.
const MAX_GRACE_HOURS: i64 = 24 * 366;
const MAX_PENDING_TTL_MINUTES: i64 = 60 * 24 * 366;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub booking_grace_hours: i64,
    pub pending_booking_ttl_minutes: i64,
    pub expiry_sweep_interval_secs: u64,
    pub order_code_attempts: u32,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "cinema.db".to_string()),
            booking_grace_hours: env_or("BOOKING_GRACE_HOURS", 24),
            pending_booking_ttl_minutes: env_or("PENDING_BOOKING_TTL_MINUTES", 15),
            expiry_sweep_interval_secs: env_or("EXPIRY_SWEEP_INTERVAL_SECS", 60),
            order_code_attempts: env_or("ORDER_CODE_ATTEMPTS", 5),
            seed_demo_data: env_or("SEED_DEMO_DATA", false),
        }
    }

    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy {
            grace_window: Duration::hours(self.booking_grace_hours.clamp(0, MAX_GRACE_HOURS)),
            pending_ttl: Duration::minutes(
                self.pending_booking_ttl_minutes.clamp(1, MAX_PENDING_TTL_MINUTES),
            ),
            order_code_attempts: self.order_code_attempts.max(1),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Tunables passed explicitly into the booking services.
#[derive(Clone, Debug)]
pub struct BookingPolicy {
    /// How far in the past a showtime may be and still accept bookings.
    pub grace_window: Duration,
    /// Age after which an unpaid booking is expired by the sweeper.
    pub pending_ttl: Duration,
    pub order_code_attempts: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            grace_window: Duration::hours(24),
            pending_ttl: Duration::minutes(15),
            order_code_attempts: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(grace_hours: i64, ttl_minutes: i64) -> AppConfig {
        AppConfig {
            port: 3000,
            database_url: ":memory:".to_string(),
            booking_grace_hours: grace_hours,
            pending_booking_ttl_minutes: ttl_minutes,
            expiry_sweep_interval_secs: 0,
            order_code_attempts: 0,
            seed_demo_data: false,
        }
    }

    #[test]
    fn test_policy_uses_configured_windows() {
        let policy = config(2, 30).booking_policy();
        assert_eq!(policy.grace_window, Duration::hours(2));
        assert_eq!(policy.pending_ttl, Duration::minutes(30));
        assert_eq!(policy.order_code_attempts, 1);
    }

    #[test]
    fn test_extreme_windows_are_clamped() {
        let policy = config(i64::MAX, i64::MAX).booking_policy();
        assert_eq!(policy.grace_window, Duration::hours(MAX_GRACE_HOURS));
        assert_eq!(policy.pending_ttl, Duration::minutes(MAX_PENDING_TTL_MINUTES));

        let policy = config(i64::MIN, -5).booking_policy();
        assert_eq!(policy.grace_window, Duration::zero());
        assert_eq!(policy.pending_ttl, Duration::minutes(1));
    }
}
