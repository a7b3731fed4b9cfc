//! Cosmetic helpers for player display names.

use rand::{Rng, seq::IndexedRandom};

/// Longest display name kept after sanitising.
pub const MAX_USERNAME_CHARS: usize = 24;

const ADJECTIVES: &[&str] = &[
    "Goofy", "Bouncy", "Sunny", "Rosy", "Wobbly", "Tiny", "Giggle", "Fuzzy", "Peachy", "Zany",
    "Sparkly", "Bubbly",
];

const ANIMALS: &[&str] = &[
    "Giraffe", "Panda", "Koala", "Bunny", "Otter", "Duckling", "Kitten", "Puppy", "Lamb", "Chick",
    "Fawn", "Cub",
];

/// Build a playful random name such as `FuzzyOtter42`.
pub fn generate_username() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Happy");
    let animal = ANIMALS.choose(&mut rng).copied().unwrap_or("Guest");
    let suffix: u8 = rng.random_range(10..=99);
    format!("{adjective}{animal}{suffix}")
}

/// Trim and shorten a requested name, falling back to a generated one when blank.
pub fn sanitize_username(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return generate_username();
    }
    trimmed.chars().take(MAX_USERNAME_CHARS).collect()
}
