//! Application-level configuration loaded from the environment at startup.

use std::{env, path::PathBuf, str::FromStr};

use time::{Date, Duration, OffsetDateTime, macros::format_description};
use tracing::{info, warn};

use crate::state::session::GameSettings;

/// Port used when neither `PORT` nor `SERVER_PORT` is set.
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MEDIA_DIR: &str = "media";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_BIRTH_DATE: Date = time::macros::date!(2024 - 01 - 01);
const DEFAULT_VIDEO_SECONDS: i64 = 20;
const DEFAULT_IMAGE_SECONDS: i64 = 10;
const DEFAULT_REVEAL_SECONDS: i64 = 5;
const DEFAULT_TOTAL_ROUNDS: u32 = 50;
const DEFAULT_BABY_NAME: &str = "the baby";
/// Longest accepted round or reveal duration.
const MAX_DURATION_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Listening port.
    pub port: u16,
    /// Root directory holding the photos and videos.
    pub media_dir: PathBuf,
    /// Directory served for the front-end.
    pub static_dir: PathBuf,
    /// Reference date ages are computed from.
    pub birth_date: OffsetDateTime,
    /// Round timing and length.
    pub game: GameSettings,
    /// Name shown in "how old was ..." prompts.
    pub baby_name: String,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn load() -> Self {
        let config = Self::from_lookup(|key| env::var(key).ok());
        info!(
            port = config.port,
            media_dir = %config.media_dir.display(),
            birth_date = %config.birth_date.date(),
            total_rounds = config.game.total_rounds,
            image_secs = config.game.image_duration.whole_seconds(),
            video_secs = config.game.video_duration.whole_seconds(),
            reveal_secs = config.game.reveal_duration.whole_seconds(),
            "configuration loaded"
        );
        config
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    /// for anything missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = lookup("PORT")
            .or_else(|| lookup("SERVER_PORT"))
            .and_then(|raw| parse_or_warn::<u16>("PORT", &raw))
            .unwrap_or(DEFAULT_PORT);

        // The legacy combined setting only ever drove video rounds.
        let video_seconds = lookup("TURN_DURATION_SECONDS_VIDEO")
            .map(|raw| ("TURN_DURATION_SECONDS_VIDEO", raw))
            .or_else(|| lookup("TURN_DURATION_SECONDS").map(|raw| ("TURN_DURATION_SECONDS", raw)))
            .and_then(|(key, raw)| parse_seconds(key, &raw))
            .unwrap_or(DEFAULT_VIDEO_SECONDS);
        let image_seconds = lookup("TURN_DURATION_SECONDS_IMAGE")
            .and_then(|raw| parse_seconds("TURN_DURATION_SECONDS_IMAGE", &raw))
            .unwrap_or(DEFAULT_IMAGE_SECONDS);
        let reveal_seconds = lookup("REVEAL_SECONDS")
            .and_then(|raw| parse_seconds("REVEAL_SECONDS", &raw))
            .unwrap_or(DEFAULT_REVEAL_SECONDS);
        let total_rounds = lookup("TOTAL_ROUNDS")
            .and_then(|raw| parse_or_warn::<u32>("TOTAL_ROUNDS", &raw))
            .filter(|rounds| *rounds > 0)
            .unwrap_or(DEFAULT_TOTAL_ROUNDS);

        Self {
            port,
            media_dir: lookup("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR)),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            birth_date: parse_birth_date(lookup("BIRTH_DATE").as_deref()),
            game: GameSettings {
                total_rounds,
                image_duration: Duration::seconds(image_seconds),
                video_duration: Duration::seconds(video_seconds),
                reveal_duration: Duration::seconds(reveal_seconds),
            },
            baby_name: lookup("BABY_NAME").unwrap_or_else(|| DEFAULT_BABY_NAME.into()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw, "invalid setting; using default");
            None
        }
    }
}

/// Durations must lie between one second and one day.
fn parse_seconds(key: &str, raw: &str) -> Option<i64> {
    parse_or_warn::<i64>(key, raw).filter(|seconds| {
        let valid = (1..=MAX_DURATION_SECONDS).contains(seconds);
        if !valid {
            warn!(
                key,
                value = raw,
                max = MAX_DURATION_SECONDS,
                "duration out of range; using default"
            );
        }
        valid
    })
}

/// Parse a `YYYY-MM-DD` birth date at midnight UTC.
fn parse_birth_date(raw: Option<&str>) -> OffsetDateTime {
    let format = format_description!("[year]-[month]-[day]");
    let date = match raw {
        Some(raw) => Date::parse(raw.trim(), format).unwrap_or_else(|err| {
            warn!(value = raw, error = %err, "invalid BIRTH_DATE; using default");
            DEFAULT_BIRTH_DATE
        }),
        None => DEFAULT_BIRTH_DATE,
    };
    date.midnight().assume_utc()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use time::macros::datetime;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.game, GameSettings::default());
        assert_eq!(config.birth_date, datetime!(2024-01-01 00:00:00 UTC));
        assert_eq!(config.baby_name, "the baby");
        assert_eq!(config.media_dir, PathBuf::from("media"));
    }

    #[test]
    fn video_duration_falls_back_to_legacy_setting() {
        let legacy = config(&[("TURN_DURATION_SECONDS", "45")]);
        assert_eq!(legacy.game.video_duration, Duration::seconds(45));
        assert_eq!(legacy.game.image_duration, Duration::seconds(10));

        let both = config(&[
            ("TURN_DURATION_SECONDS", "45"),
            ("TURN_DURATION_SECONDS_VIDEO", "30"),
        ]);
        assert_eq!(both.game.video_duration, Duration::seconds(30));
    }

    #[test]
    fn malformed_values_use_defaults() {
        let config = config(&[
            ("PORT", "eighty"),
            ("TOTAL_ROUNDS", "0"),
            ("REVEAL_SECONDS", "-3"),
            ("BIRTH_DATE", "01/02/2024"),
        ]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.game.total_rounds, 50);
        assert_eq!(config.game.reveal_duration, Duration::seconds(5));
        assert_eq!(config.birth_date, datetime!(2024-01-01 00:00:00 UTC));
    }

    #[test]
    fn durations_longer_than_a_day_use_defaults() {
        let config = config(&[
            ("TURN_DURATION_SECONDS_IMAGE", "300000000000"),
            ("TURN_DURATION_SECONDS_VIDEO", "86401"),
            ("REVEAL_SECONDS", "86400"),
        ]);
        assert_eq!(config.game.image_duration, Duration::seconds(10));
        assert_eq!(config.game.video_duration, Duration::seconds(20));
        assert_eq!(config.game.reveal_duration, Duration::days(1));
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config(&[
            ("SERVER_PORT", "8081"),
            ("TOTAL_ROUNDS", "7"),
            ("BIRTH_DATE", "2023-11-20"),
            ("BABY_NAME", "Mila"),
            ("MEDIA_DIR", "/srv/photos"),
        ]);
        assert_eq!(config.port, 8081);
        assert_eq!(config.game.total_rounds, 7);
        assert_eq!(config.birth_date, datetime!(2023-11-20 00:00:00 UTC));
        assert_eq!(config.baby_name, "Mila");
        assert_eq!(config.media_dir, PathBuf::from("/srv/photos"));
    }
}
