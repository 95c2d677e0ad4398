use super::{RequestHandler, Service, ServiceError};

use crate::models::pix::{
    IntakeSource, KeyClassification, ParsedPixPayment, PaymentData, PixKeyType,
};
use crate::pix;

use async_trait::async_trait;
use tokio::sync::oneshot;

pub enum PixRequest {
    Decode {
        payload: String,
        response: oneshot::Sender<Result<ParsedPixPayment, ServiceError>>,
    },
    Validate {
        payload: String,
        response: oneshot::Sender<bool>,
    },
    Classify {
        key: String,
        declared_type: Option<PixKeyType>,
        response: oneshot::Sender<KeyClassification>,
    },
    Intake {
        input: String,
        source: IntakeSource,
        response: oneshot::Sender<Result<PaymentData, ServiceError>>,
    },
    Manual {
        key: String,
        amount: String,
        response: oneshot::Sender<Result<PaymentData, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct PixRequestHandler;

impl PixRequestHandler {
    pub fn new() -> Self {
        PixRequestHandler {}
    }

    fn decode(&self, payload: &str) -> Result<ParsedPixPayment, ServiceError> {
        pix::decode(payload)
            .ok_or_else(|| ServiceError::InvalidInput("Invalid PIX code".to_string()))
    }

    fn classify(&self, key: &str, declared_type: Option<PixKeyType>) -> KeyClassification {
        let (key_type, valid) = match declared_type {
            Some(key_type) => (key_type, pix::validate_key_by_type(key, key_type)),
            None => (pix::classify(key), pix::is_valid_key(key)),
        };

        KeyClassification {
            key_type,
            label: key_type.label().to_string(),
            valid,
        }
    }

    fn intake(&self, input: &str, source: IntakeSource) -> Result<PaymentData, ServiceError> {
        let payment =
            pix::intake(input, source).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        log::info!(
            "Accepted {:?} input from {:?}: key type {}, amount {}",
            payment.source,
            source,
            payment.pix_key_type,
            payment.amount
        );
        Ok(payment)
    }

    fn manual(&self, key: &str, amount: &str) -> Result<PaymentData, ServiceError> {
        pix::manual(key, amount).map_err(|e| ServiceError::InvalidInput(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<PixRequest> for PixRequestHandler {
    async fn handle_request(&self, request: PixRequest) {
        match request {
            PixRequest::Decode { payload, response } => {
                let _ = response.send(self.decode(&payload));
            }
            PixRequest::Validate { payload, response } => {
                let _ = response.send(pix::is_valid_payload(&payload));
            }
            PixRequest::Classify {
                key,
                declared_type,
                response,
            } => {
                let _ = response.send(self.classify(&key, declared_type));
            }
            PixRequest::Intake {
                input,
                source,
                response,
            } => {
                let _ = response.send(self.intake(&input, source));
            }
            PixRequest::Manual {
                key,
                amount,
                response,
            } => {
                let _ = response.send(self.manual(&key, &amount));
            }
        }
    }
}

pub struct PixService;

impl PixService {
    pub fn new() -> Self {
        PixService {}
    }
}

#[async_trait]
impl Service<PixRequest, PixRequestHandler> for PixService {}
