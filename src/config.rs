use std::time::Duration;

use tracing::warn;

/// Runtime knobs for the order system.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Actor mailbox depth.
    pub buffer_size: usize,
    /// How long a delivered order lingers before the expiry queue
    /// removes it.
    pub delivered_ttl: Duration,
    /// Local wall-clock hour of the daily purge sweep.
    pub purge_hour: u32,
    /// How long an OTP session token stays usable.
    pub otp_session_ttl: Duration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            delivered_ttl: Duration::from_secs(30),
            purge_hour: 0,
            otp_session_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl SystemConfig {
    /// Reads overrides from the environment, falling back to the
    /// defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            buffer_size: env_var("STORE_BUFFER_SIZE").unwrap_or(defaults.buffer_size),
            delivered_ttl: env_var("DELIVERED_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.delivered_ttl),
            purge_hour: env_var::<u32>("PURGE_HOUR")
                .map(|hour| hour.min(23))
                .unwrap_or(defaults.purge_hour),
            otp_session_ttl: env_var("OTP_SESSION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.otp_session_ttl),
        }
    }
}

fn env_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, %raw, "ignoring unparsable config override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_observed_system() {
        let config = SystemConfig::default();
        assert_eq!(config.delivered_ttl, Duration::from_secs(30));
        assert_eq!(config.purge_hour, 0);
    }

    #[test]
    fn env_overrides_are_applied_and_clamped() {
        std::env::set_var("DELIVERED_TTL_SECS", "5");
        std::env::set_var("PURGE_HOUR", "99");
        let config = SystemConfig::from_env();
        std::env::remove_var("DELIVERED_TTL_SECS");
        std::env::remove_var("PURGE_HOUR");

        assert_eq!(config.delivered_ttl, Duration::from_secs(5));
        assert_eq!(config.purge_hour, 23);
    }

    #[test]
    fn unparsable_overrides_fall_back_to_defaults() {
        std::env::set_var("STORE_BUFFER_SIZE", "lots");
        let config = SystemConfig::from_env();
        std::env::remove_var("STORE_BUFFER_SIZE");
        assert_eq!(config.buffer_size, SystemConfig::default().buffer_size);
    }
}
