use super::{RequestHandler, Service, ServiceError};

use crate::models::pix::PaymentData;
use crate::models::quote::PaymentQuote;
use crate::pix;
use crate::repositories::price::PriceOracle;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Stellar amounts carry seven decimals.
const KALE_DECIMALS: u32 = 7;

pub enum PriceRequest {
    GetRate {
        response: oneshot::Sender<Result<Decimal, ServiceError>>,
    },
    Quote {
        payment: PaymentData,
        response: oneshot::Sender<Result<PaymentQuote, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct PriceRequestHandler {
    oracle: Arc<dyn PriceOracle>,
    balance: Decimal,
}

impl PriceRequestHandler {
    pub fn new(oracle: Arc<dyn PriceOracle>, balance: Decimal) -> Self {
        Self { oracle, balance }
    }

    async fn get_rate(&self) -> Result<Decimal, ServiceError> {
        let rate = self
            .oracle
            .kale_rate()
            .await
            .map_err(|e| ServiceError::Price(e.to_string()))?;

        if rate <= Decimal::ZERO {
            return Err(ServiceError::Price(format!("Non-positive KALE rate {}", rate)));
        }
        Ok(rate)
    }

    async fn quote(&self, payment: PaymentData) -> Result<PaymentQuote, ServiceError> {
        let brl_amount = pix::parse_amount(&payment.amount)
            .filter(|amount| *amount > Decimal::ZERO)
            .ok_or_else(|| ServiceError::InvalidInput(format!("Invalid amount: {}", payment.amount)))?;
        let kale_rate = self.get_rate().await?;
        let kale_amount = brl_amount
            .checked_div(kale_rate)
            .ok_or_else(|| ServiceError::InvalidInput("Amount out of range".to_string()))?
            .round_dp(KALE_DECIMALS);

        let can_send = kale_amount <= self.balance;
        if !can_send {
            log::warn!(
                "Insufficient balance: quote needs {} KALE, wallet holds {}",
                kale_amount,
                self.balance
            );
        }

        Ok(PaymentQuote {
            id: Uuid::new_v4(),
            formatted_amount: pix::format_amount(&payment.amount),
            payment,
            brl_amount,
            kale_rate,
            kale_amount,
            balance: self.balance,
            can_send,
            created_at: chrono::Utc::now(),
        })
    }
}

#[async_trait]
impl RequestHandler<PriceRequest> for PriceRequestHandler {
    async fn handle_request(&self, request: PriceRequest) {
        match request {
            PriceRequest::GetRate { response } => {
                let _ = response.send(self.get_rate().await);
            }
            PriceRequest::Quote { payment, response } => {
                let _ = response.send(self.quote(payment).await);
            }
        }
    }
}

pub struct PriceService;

impl PriceService {
    pub fn new() -> Self {
        PriceService {}
    }
}

#[async_trait]
impl Service<PriceRequest, PriceRequestHandler> for PriceService {}
