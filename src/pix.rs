//! PIX copy-and-paste (BR Code) payload decoding.
//!
//! A payload is a flat run of text TLV records (see [`tlv`]). The codec pulls
//! the recipient key out of the merchant account template (tag `26`), the
//! amount (`54`), merchant name (`59`), city (`60`) and the description from
//! the additional data template (`62`). The trailing CRC16 is neither parsed
//! nor verified.
//!
//! Every function here is pure: malformed input yields `None`, `false` or an
//! [`IntakeError`], never a panic.

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;

use crate::models::pix::{IntakeSource, ParsedPixPayment, PaymentData, PaymentSource};

pub mod format;
pub mod keys;
pub mod tlv;

pub use format::{format_amount, format_recipient_name, normalize_amount_input, parse_amount};
pub use keys::{classify, is_valid_key, validate_key_by_type};

use tlv::TlvError;

/// Payload format indicator `00 02 01` every BR Code starts with.
const PAYLOAD_PREFIX: &str = "000201";
const CRC_LEN: usize = 4;
const MIN_PAYLOAD_LEN: usize = 50;

const TAG_MERCHANT_ACCOUNT: &str = "26";
const TAG_AMOUNT: &str = "54";
const TAG_MERCHANT_NAME: &str = "59";
const TAG_MERCHANT_CITY: &str = "60";
const TAG_ADDITIONAL_DATA: &str = "62";
const SUBTAG_PIX_KEY: &str = "01";
const SUBTAG_DESCRIPTION: &str = "05";

static DOCUMENT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+(?:/[0-9]+-[0-9]+)?").expect("valid regex")
});
// Some generators let the city record bleed into the name.
static CITY_ARTIFACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"600[0-9]*$").expect("valid regex"));

/// Removes every whitespace character. Spaces inside names and cities go
/// too, which is how payloads pasted with wrapping or grouping are read.
fn compact(payload: &str) -> String {
    payload.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Joins a payload split over several lines, keeping inner spaces.
fn unwrap_lines(payload: &str) -> String {
    payload
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}

fn clean_recipient_name(name: &str) -> String {
    let name = DOCUMENT_PREFIX.replace(name, "");
    let name = CITY_ARTIFACT.replace(&name, "");
    name.trim().to_string()
}

#[derive(Default)]
struct PayloadFields {
    pix_key: Option<String>,
    amount: Option<String>,
    recipient_name: Option<String>,
    recipient_city: Option<String>,
    description: Option<String>,
}

fn walk_payload(payload: &str) -> Result<PayloadFields, TlvError> {
    let chars: Vec<char> = payload.chars().collect();
    let end = chars.len().saturating_sub(CRC_LEN);
    let mut fields = PayloadFields::default();
    let mut position = 0;

    while position < end {
        let (record, next) = tlv::read_record(&chars, position)?;
        position = next;

        match record.tag.as_str() {
            TAG_MERCHANT_ACCOUNT => {
                if let Some(key) = tlv::find_field(&record.value, SUBTAG_PIX_KEY)? {
                    fields.pix_key = Some(key);
                }
            }
            TAG_AMOUNT => fields.amount = Some(record.value),
            TAG_MERCHANT_NAME => fields.recipient_name = Some(clean_recipient_name(&record.value)),
            TAG_MERCHANT_CITY => fields.recipient_city = Some(record.value),
            TAG_ADDITIONAL_DATA => {
                if let Some(description) = tlv::find_field(&record.value, SUBTAG_DESCRIPTION)? {
                    fields.description = Some(description);
                }
            }
            _ => {}
        }
    }

    Ok(fields)
}

fn decode_exact(payload: &str) -> Option<ParsedPixPayment> {
    if !payload.starts_with(PAYLOAD_PREFIX) {
        return None;
    }

    let fields = match walk_payload(payload) {
        Ok(fields) => fields,
        Err(e) => {
            log::debug!("Malformed PIX payload: {}", e);
            return None;
        }
    };

    let pix_key = fields.pix_key.filter(|v| !v.is_empty())?;
    let amount = fields.amount.filter(|v| !v.is_empty())?;
    let recipient_name = fields.recipient_name.filter(|v| !v.is_empty())?;

    Some(ParsedPixPayment {
        pix_key_type: classify(&pix_key),
        pix_key,
        amount,
        recipient_name,
        recipient_city: fields.recipient_city.unwrap_or_default(),
        description: fields.description,
    })
}

/// Decodes a PIX copy-and-paste payload.
///
/// The payload is read as given (line breaks and surrounding whitespace
/// removed) and, failing that, with all whitespace removed. Returns `None`
/// when the payload does not start with the format indicator, when any
/// record is structurally broken, or when the key, amount or recipient name
/// is missing.
pub fn decode(payload: &str) -> Option<ParsedPixPayment> {
    let unwrapped = unwrap_lines(payload);
    if let Some(payment) = decode_exact(&unwrapped) {
        return Some(payment);
    }

    let compacted = compact(payload);
    if compacted == unwrapped {
        return None;
    }
    decode_exact(&compacted)
}

/// Cheap gates first, then a full [`decode`].
pub fn is_valid_payload(payload: &str) -> bool {
    let clean = compact(payload);
    if !clean.starts_with(PAYLOAD_PREFIX) || clean.chars().count() < MIN_PAYLOAD_LEN {
        return false;
    }

    decode(payload).is_some()
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Not a PIX payload or PIX key")]
    InvalidInput,
    #[error("Invalid PIX key: {0}")]
    InvalidKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Turns text read from the clipboard or a QR code into payment data. A full
/// payload wins; otherwise the text is accepted as a bare key with the
/// source's default amount. Clipboard text must also pass the
/// [`is_valid_payload`] length gate, a scanned code only has to decode.
pub fn intake(raw: &str, source: IntakeSource) -> Result<PaymentData, IntakeError> {
    let decoded = match source {
        IntakeSource::Clipboard if !is_valid_payload(raw) => None,
        _ => decode(raw),
    };

    if let Some(payment) = decoded {
        return Ok(PaymentData {
            pix_key: payment.pix_key,
            pix_key_type: payment.pix_key_type,
            amount: payment.amount,
            recipient_name: Some(format_recipient_name(&payment.recipient_name)),
            description: payment.description,
            source: PaymentSource::Payload,
        });
    }

    let key = raw.trim();
    if is_valid_key(key) {
        return Ok(PaymentData {
            pix_key: key.to_string(),
            pix_key_type: classify(key),
            amount: source.default_amount().to_string(),
            recipient_name: None,
            description: None,
            source: PaymentSource::BareKey,
        });
    }

    Err(IntakeError::InvalidInput)
}

/// Payment data from a key and an amount typed by hand.
pub fn manual(key: &str, amount: &str) -> Result<PaymentData, IntakeError> {
    let key = key.trim();
    if !is_valid_key(key) {
        return Err(IntakeError::InvalidKey(key.to_string()));
    }

    let amount = normalize_amount_input(amount);
    match parse_amount(&amount) {
        Some(value) if value > Decimal::ZERO => Ok(PaymentData {
            pix_key: key.to_string(),
            pix_key_type: classify(key),
            amount,
            recipient_name: None,
            description: None,
            source: PaymentSource::Manual,
        }),
        _ => Err(IntakeError::InvalidAmount(amount)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pix::PixKeyType;

    // Same fields as the sample invoice below, with consistent lengths.
    const SAMPLE: &str = "00020126330014br.gov.bcb.pix011111987654321520400005303986540525.005802BR5914LUCAS BISPO DE6009SAO PAULO62070503***6304A1B2";
    // Sample invoice as circulated; its merchant account template declares a
    // 36 character key that is only 11 characters long.
    const MISENCODED_SAMPLE: &str = "00020126580014br.gov.bcb.pix013611987654321520400005303986540525.005802BR5913LUCAS BISPO DE6009SAO PAULO62070503***6304A1B2";

    #[test]
    fn test_decode_sample() {
        let payment = decode(SAMPLE).unwrap();
        assert_eq!(payment.pix_key, "11987654321");
        assert_eq!(payment.pix_key_type, PixKeyType::Cpf);
        assert_eq!(payment.amount, "25.00");
        assert!(payment.recipient_name.contains("LUCAS BISPO DE"));
        assert_eq!(payment.recipient_city, "SAO PAULO");
        assert_eq!(payment.description.as_deref(), Some("***"));
        assert!(is_valid_payload(SAMPLE));
    }

    #[test]
    fn test_decode_misencoded_sample() {
        assert_eq!(decode(MISENCODED_SAMPLE), None);
        assert!(!is_valid_payload(MISENCODED_SAMPLE));
    }

    #[test]
    fn test_decode_ignores_whitespace() {
        let wrapped = format!("  {}\n{}\t", &SAMPLE[..40], &SAMPLE[40..]);
        assert_eq!(decode(&wrapped), decode(SAMPLE));
        assert!(is_valid_payload(&wrapped));
    }

    #[test]
    fn test_decode_compacted_payload() {
        // Lengths written for the payload with its spaces removed.
        let grouped = "0002 0126 3300 14br.gov.bcb.pix011111987654321520400005303986540525.005802BR5912LUCASBISPODE6008SAOPAULO62070503***6304A1B2";
        let payment = decode(grouped).unwrap();
        assert_eq!(payment.recipient_name, "LUCASBISPODE");
        assert_eq!(payment.recipient_city, "SAOPAULO");
        assert!(is_valid_payload(grouped));
        assert_eq!(format_recipient_name(&payment.recipient_name), "Lucas Bispo De");
    }

    #[test]
    fn test_decode_is_deterministic() {
        assert_eq!(decode(SAMPLE), decode(SAMPLE));
        assert_eq!(decode(MISENCODED_SAMPLE), decode(MISENCODED_SAMPLE));
    }

    #[test]
    fn test_prefix_gate() {
        let payload = SAMPLE.replacen("000201", "000202", 1);
        assert_eq!(decode(&payload), None);
        assert!(!is_valid_payload(&payload));
        assert_eq!(decode(""), None);
        assert!(!is_valid_payload("hello world"));
    }

    #[test]
    fn test_minimum_length_gate() {
        let short = "000201261501111198765432154041.005901A6304ABCD";
        assert!(short.len() < MIN_PAYLOAD_LEN);
        assert!(decode(short).is_some());
        assert!(!is_valid_payload(short));
        assert!(!is_valid_payload("000201"));
    }

    #[test]
    fn test_length_past_end() {
        assert_eq!(decode("0002015499123"), None);
        let truncated = format!("{}5499{}", &SAMPLE[..SAMPLE.len() - 8], "1.00ABCD");
        assert_eq!(decode(&truncated), None);
        assert!(!is_valid_payload(&truncated));
    }

    #[test]
    fn test_nested_length_past_end() {
        let payload = "00020126150199119876543215404".to_string()
            + "1.005914LUCAS BISPO DE6009SAO PAULO6304ABCD";
        assert_eq!(decode(&payload), None);
    }

    #[test]
    fn test_missing_mandatory_fields() {
        let without_amount = "00020126330014br.gov.bcb.pix0111119876543215802BR5914LUCAS BISPO DE6009SAO PAULO6304A1B2";
        assert_eq!(decode(without_amount), None);

        let empty_name = "00020126330014br.gov.bcb.pix011111987654321540525.005900".to_string()
            + "6009SAO PAULO6304A1B2";
        assert_eq!(decode(&empty_name), None);
    }

    #[test]
    fn test_recipient_name_cleanup() {
        assert_eq!(clean_recipient_name("123.456.789 MARIA"), "MARIA");
        assert_eq!(
            clean_recipient_name("12.345.678/0001-90 PADARIA BOM PAO"),
            "PADARIA BOM PAO"
        );
        assert_eq!(clean_recipient_name("LUCAS BISPO DE6009"), "LUCAS BISPO DE");
        assert_eq!(clean_recipient_name("  ANA  "), "ANA");
    }

    #[test]
    fn test_decode_email_key_with_description() {
        let payload = "00020126410014br.gov.bcb.pix0119loja@example.com.br52040000530398654071234.565802BR5909LOJA ABC 6014RIO DE JANEIRO62130509Pedido 426304FFFF";
        let payment = decode(payload).unwrap();
        assert_eq!(payment.pix_key, "loja@example.com.br");
        assert_eq!(payment.pix_key_type, PixKeyType::Email);
        assert_eq!(payment.amount, "1234.56");
        assert_eq!(payment.recipient_name, "LOJA ABC");
        assert_eq!(payment.recipient_city, "RIO DE JANEIRO");
        assert_eq!(payment.description.as_deref(), Some("Pedido 42"));
        assert!(is_valid_payload(payload));
    }

    #[test]
    fn test_intake_payload() {
        let payment = intake(SAMPLE, IntakeSource::Clipboard).unwrap();
        assert_eq!(payment.source, PaymentSource::Payload);
        assert_eq!(payment.amount, "25.00");
        assert_eq!(payment.recipient_name.as_deref(), Some("Lucas Bispo De"));
    }

    #[test]
    fn test_intake_bare_key() {
        let clipboard = intake(" user@example.com ", IntakeSource::Clipboard).unwrap();
        assert_eq!(clipboard.source, PaymentSource::BareKey);
        assert_eq!(clipboard.pix_key, "user@example.com");
        assert_eq!(clipboard.pix_key_type, PixKeyType::Email);
        assert_eq!(clipboard.amount, "25.00");

        let scanned = intake("12345678901234", IntakeSource::QrCode).unwrap();
        assert_eq!(scanned.pix_key_type, PixKeyType::Cnpj);
        assert_eq!(scanned.amount, "50.00");
    }

    #[test]
    fn test_intake_invalid() {
        assert_eq!(
            intake("!!!", IntakeSource::Clipboard),
            Err(IntakeError::InvalidInput)
        );
        assert_eq!(
            intake(MISENCODED_SAMPLE, IntakeSource::QrCode),
            Err(IntakeError::InvalidInput)
        );
    }

    #[test]
    fn test_intake_short_payload_by_source() {
        let short = "000201261501111198765432154041.005901A6304ABCD";

        let scanned = intake(short, IntakeSource::QrCode).unwrap();
        assert_eq!(scanned.source, PaymentSource::Payload);
        assert_eq!(scanned.pix_key, "11987654321");
        assert_eq!(scanned.amount, "1.00");
        assert_eq!(scanned.recipient_name.as_deref(), Some("A"));

        assert_eq!(
            intake(short, IntakeSource::Clipboard),
            Err(IntakeError::InvalidInput)
        );
    }

    #[test]
    fn test_manual() {
        let payment = manual("1198765432", "R$ 10,5").unwrap();
        assert_eq!(payment.pix_key_type, PixKeyType::Phone);
        assert_eq!(payment.amount, "10.5");
        assert_eq!(payment.source, PaymentSource::Manual);

        assert_eq!(
            manual("nope", "10"),
            Err(IntakeError::InvalidKey("nope".to_string()))
        );
        assert_eq!(
            manual("1198765432", "0,00"),
            Err(IntakeError::InvalidAmount("0.00".to_string()))
        );
    }
}
