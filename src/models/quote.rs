use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pix::PaymentData;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuote {
    pub id: Uuid,
    pub payment: PaymentData,
    pub brl_amount: Decimal,
    /// BRL paid for one KALE.
    pub kale_rate: Decimal,
    pub kale_amount: Decimal,
    pub formatted_amount: String,
    pub balance: Decimal,
    pub can_send: bool,
    pub created_at: DateTime<Utc>,
}
