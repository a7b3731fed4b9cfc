use time::OffsetDateTime;

pub mod health;
pub mod phase;
pub mod player;
pub mod state;
pub mod validation;

/// Milliseconds since the Unix epoch, as browsers expect for countdowns.
fn epoch_ms(time: OffsetDateTime) -> i64 {
    i64::try_from(time.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}
