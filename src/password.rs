//! Password strength rules and generation

use rand::Rng;

/// Characters accepted as "special" by the strength rule.
pub const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Alphabet used by [`generate_password`].
pub const GENERATOR_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()-_=+[]{}<>?";

/// Default generated password length.
pub const DEFAULT_LENGTH: usize = 16;

/// Strength bucket derived from [`password_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLabel {
    Empty,
    Weak,
    Medium,
    Strong,
}

impl std::fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Empty => "Empty",
            Self::Weak => "Weak",
            Self::Medium => "Medium",
            Self::Strong => "Strong",
        };
        f.write_str(s)
    }
}

/// At least 8 characters with an uppercase letter, a digit and a special
/// character.
///
/// # Examples
///
/// ```
/// use securepass::password::is_strong_password;
///
/// assert!(is_strong_password("Passw0rd!"));
/// assert!(!is_strong_password("password"));
/// ```
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARS.contains(c))
}

/// Score in `0..=100`: up to 40 for length, plus 15 for every character
/// class beyond the first.
pub fn password_score(password: &str) -> u32 {
    if password.is_empty() {
        return 0;
    }
    let length = (password.chars().count() as u32).saturating_mul(4).min(40);
    let classes = [
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ]
    .into_iter()
    .filter(|present| *present)
    .count() as u32;
    (length + classes.saturating_sub(1) * 15).min(100)
}

pub fn strength_label(password: &str) -> StrengthLabel {
    match password_score(password) {
        s if s >= 80 => StrengthLabel::Strong,
        s if s >= 50 => StrengthLabel::Medium,
        0 => StrengthLabel::Empty,
        _ => StrengthLabel::Weak,
    }
}

/// Random password drawn from [`GENERATOR_ALPHABET`] with the thread-local
/// CSPRNG.
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| GENERATOR_ALPHABET[rng.random_range(0..GENERATOR_ALPHABET.len())] as char)
        .collect()
}
