use regex::Regex;
use std::sync::LazyLock;

use crate::models::pix::PixKeyType;

static NON_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9@.\-]").expect("valid regex"));
static CPF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{11}$").expect("valid regex"));
static CNPJ: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{14}$").expect("valid regex"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,11}$").expect("valid regex"));
static RANDOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")
        .expect("valid regex")
});

/// Drops everything but ASCII letters, digits, `@`, `.` and `-`.
pub fn clean_key(key: &str) -> String {
    NON_KEY_CHARS.replace_all(key, "").into_owned()
}

fn pattern(key_type: PixKeyType) -> &'static Regex {
    match key_type {
        PixKeyType::Cpf => &CPF,
        PixKeyType::Cnpj => &CNPJ,
        PixKeyType::Email => &EMAIL,
        PixKeyType::Phone => &PHONE,
        PixKeyType::Random => &RANDOM,
    }
}

/// Classifies a bare PIX key. Never fails: keys that match nothing land in
/// [`PixKeyType::Random`].
///
/// Patterns are tried in the order CPF, CNPJ, email, phone, random key, so an
/// 11-digit key is always a CPF even when it is a mobile number with area
/// code.
pub fn classify(key: &str) -> PixKeyType {
    if key.is_empty() {
        return PixKeyType::Random;
    }

    let clean = clean_key(key);
    match PixKeyType::ALL
        .into_iter()
        .find(|key_type| pattern(*key_type).is_match(&clean))
    {
        Some(key_type) => key_type,
        None => {
            log::debug!("PIX key {:?} matches no known pattern", key);
            PixKeyType::Random
        }
    }
}

/// Checks a key against one declared type only, with no fallback.
pub fn validate_key_by_type(key: &str, key_type: PixKeyType) -> bool {
    !key.is_empty() && pattern(key_type).is_match(&clean_key(key))
}

/// Whether the key matches any of the known key layouts.
pub fn is_valid_key(key: &str) -> bool {
    PixKeyType::ALL
        .into_iter()
        .any(|key_type| validate_key_by_type(key, key_type))
}
