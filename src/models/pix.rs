use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixKeyType {
    Cpf,
    Cnpj,
    Email,
    Phone,
    /// Random key in the 8-4-4-4-12 hex layout. Also the bucket for keys
    /// that match no other pattern.
    #[serde(alias = "UUID")]
    Random,
}

impl PixKeyType {
    pub const ALL: [PixKeyType; 5] = [
        PixKeyType::Cpf,
        PixKeyType::Cnpj,
        PixKeyType::Email,
        PixKeyType::Phone,
        PixKeyType::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PixKeyType::Cpf => "CPF",
            PixKeyType::Cnpj => "CNPJ",
            PixKeyType::Email => "EMAIL",
            PixKeyType::Phone => "PHONE",
            PixKeyType::Random => "RANDOM",
        }
    }

    /// Label shown on the confirmation screen.
    pub fn label(&self) -> &'static str {
        match self {
            PixKeyType::Cpf => "CPF",
            PixKeyType::Cnpj => "CNPJ",
            PixKeyType::Email => "E-mail",
            PixKeyType::Phone => "Telefone",
            PixKeyType::Random => "Chave Aleatória",
        }
    }
}

impl fmt::Display for PixKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown PIX key type: {0}")]
pub struct UnknownKeyType(pub String);

impl FromStr for PixKeyType {
    type Err = UnknownKeyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CPF" => Ok(PixKeyType::Cpf),
            "CNPJ" => Ok(PixKeyType::Cnpj),
            "EMAIL" => Ok(PixKeyType::Email),
            "PHONE" => Ok(PixKeyType::Phone),
            // Older clients still send the random key type as UUID.
            "RANDOM" | "UUID" => Ok(PixKeyType::Random),
            _ => Err(UnknownKeyType(s.to_string())),
        }
    }
}

/// Fields extracted from a PIX copy-and-paste payload.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPixPayment {
    pub pix_key: String,
    pub pix_key_type: PixKeyType,
    pub amount: String,
    pub recipient_name: String,
    pub recipient_city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSource {
    Payload,
    BareKey,
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeSource {
    Clipboard,
    QrCode,
}

impl IntakeSource {
    /// Amount assumed when the input carries only a key.
    pub fn default_amount(&self) -> &'static str {
        match self {
            IntakeSource::Clipboard => "25.00",
            IntakeSource::QrCode => "50.00",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    pub pix_key: String,
    pub pix_key_type: PixKeyType,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: PaymentSource,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyClassification {
    pub key_type: PixKeyType,
    pub label: String,
    /// Whether the key matches the declared type, or any type when none was
    /// declared.
    pub valid: bool,
}
