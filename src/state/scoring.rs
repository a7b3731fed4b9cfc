//! Points awarded for a single guess.

/// Points for a perfect guess; one point is lost per day of error.
pub const MAX_POINTS: u32 = 100;

/// Score a guess against the true age, both expressed in days.
pub fn points(guess_days: u32, true_age_days: u32) -> u32 {
    MAX_POINTS.saturating_sub(guess_days.abs_diff(true_age_days))
}
