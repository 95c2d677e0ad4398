use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::LazyLock;

/// Tokens used to re-split names that payment generators squashed together.
const COMMON_NAMES: [&str; 20] = [
    "LUCAS",
    "BISPO",
    "SILVA",
    "SANTOS",
    "OLIVEIRA",
    "SOUZA",
    "LIMA",
    "COSTA",
    "PEREIRA",
    "RODRIGUES",
    "ALMEIDA",
    "NASCIMENTO",
    "CARVALHO",
    "GOMES",
    "MARTINS",
    "ARAUJO",
    "MELO",
    "BARBOSA",
    "RIBEIRO",
    "MONTEIRO",
];

const MIN_SPLIT_LEN: usize = 6;
const NBSP: char = '\u{a0}';
const MAX_EXPONENT: u32 = 28;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("valid regex")
});

/// Title-cases a recipient name for display, re-inserting spaces into
/// squashed names where possible. The split is a best guess for names
/// outside the token list.
pub fn format_recipient_name(name: &str) -> String {
    let mut formatted = name.to_uppercase();

    if !name.is_empty() && !name.contains(' ') {
        for common in COMMON_NAMES {
            if formatted.contains(common) {
                formatted = formatted.replace(common, &format!(" {common} "));
            }
        }
        formatted = formatted.split_whitespace().collect::<Vec<_>>().join(" ");

        let len = formatted.chars().count();
        if !formatted.contains(' ') && len > MIN_SPLIT_LEN {
            let (head, tail): (String, String) = {
                let middle = len / 2;
                (
                    formatted.chars().take(middle).collect(),
                    formatted.chars().skip(middle).collect(),
                )
            };
            formatted = format!("{head} {tail}");
        }
    }

    formatted
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let rest = chars.as_str().to_lowercase();
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    }
}

/// Parses the leading decimal number of `input`, ignoring trailing garbage.
/// An exponent such as `1.5e3` is applied.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let matched = LEADING_NUMBER.find(input.trim_start())?.as_str();
    let (mantissa, exponent) = match matched.find(|c| c == 'e' || c == 'E') {
        Some(at) => (&matched[..at], Some(&matched[at + 1..])),
        None => (matched, None),
    };

    let number = mantissa.trim_start_matches('+').trim_end_matches('.');
    let number = match number.strip_prefix('-') {
        Some(rest) if rest.starts_with('.') => format!("-0{rest}"),
        _ if number.starts_with('.') => format!("0{number}"),
        _ => number.to_string(),
    };
    let value = Decimal::from_str(&number).ok()?;

    match exponent {
        Some(exponent) => scale_by_exponent(value, exponent.parse().ok()?),
        None => Some(value),
    }
}

/// `value * 10^exponent`; `None` once the result leaves `Decimal` range.
fn scale_by_exponent(value: Decimal, exponent: i32) -> Option<Decimal> {
    if exponent < -(MAX_EXPONENT as i32) {
        return Some(Decimal::ZERO);
    }
    if exponent > MAX_EXPONENT as i32 {
        return None;
    }

    let factor = (0..exponent.unsigned_abs())
        .try_fold(Decimal::ONE, |factor, _| factor.checked_mul(Decimal::TEN))?;
    if exponent < 0 {
        value.checked_div(factor)
    } else {
        value.checked_mul(factor)
    }
}

/// Renders an amount as Brazilian Real, e.g. `R$ 1.234,56` with a
/// non-breaking space after the symbol.
pub fn format_amount(amount: &str) -> String {
    let Some(value) = parse_amount(amount) else {
        return format!("R${NBSP}NaN");
    };

    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().to_string();
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R${NBSP}{grouped},{fraction:0<2}")
}

/// Sanitizes an amount typed by the user: digits and one decimal point, at
/// most two decimals. A comma is accepted as the decimal separator.
pub fn normalize_amount_input(input: &str) -> String {
    let filtered: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let mut value = filtered.replacen(',', ".", 1);

    let parts: Vec<String> = value.split('.').map(str::to_string).collect();
    if parts.len() > 2 {
        value = format!("{}.{}", parts[0], parts[1..].concat());
    }
    if let Some(decimals) = parts.get(1) {
        if decimals.chars().count() > 2 {
            let truncated: String = decimals.chars().take(2).collect();
            value = format!("{}.{}", parts[0], truncated);
        }
    }

    value
}
