use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use super::{pix::PixRequest, price::PriceRequest, Channels, ServiceError};
use crate::models::pix::{IntakeSource, PaymentData, PixKeyType};
use std::str::FromStr;

#[derive(Deserialize)]
struct PayloadRequest {
    payload: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyRequest {
    key: String,
    key_type: Option<String>,
}

#[derive(Deserialize)]
struct IntakeRequest {
    input: String,
    source: IntakeSource,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuoteRequest {
    Intake {
        input: String,
        source: IntakeSource,
    },
    #[serde(rename_all = "camelCase")]
    Manual {
        pix_key: String,
        amount: String,
    },
}

type Reply = (StatusCode, Json<serde_json::Value>);

fn error_reply(status: StatusCode, description: String) -> Reply {
    (status, Json(json!({ "description": description })))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Reply> {
    body.map(|Json(req)| req)
        .map_err(|rejection| error_reply(rejection.status(), rejection.body_text()))
}

fn service_error_reply(error: ServiceError) -> Reply {
    match error {
        ServiceError::InvalidInput(_) => {
            error_reply(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        _ => {
            log::error!("Request failed: {}", error);
            error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error.".to_string(),
            )
        }
    }
}

async fn ask<Req, T>(
    channel: &tokio::sync::mpsc::Sender<Req>,
    build: impl FnOnce(oneshot::Sender<T>) -> Req,
) -> Result<T, Reply> {
    let (tx, rx) = oneshot::channel();

    channel.send(build(tx)).await.map_err(|e| {
        error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to process request: {}", e),
        )
    })?;

    rx.await.map_err(|e| {
        error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to receive response: {}", e),
        )
    })
}

async fn decode_payload(
    State(state): State<Channels>,
    body: Result<Json<PayloadRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match json_body(body) {
        Ok(req) => req,
        Err(reply) => return reply,
    };
    let result = ask(&state.pix, |response| PixRequest::Decode {
        payload: req.payload,
        response,
    })
    .await;

    match result {
        Ok(Ok(payment)) => (StatusCode::OK, Json(json!(payment))),
        Ok(Err(service_error)) => service_error_reply(service_error),
        Err(reply) => reply,
    }
}

async fn validate_payload(
    State(state): State<Channels>,
    body: Result<Json<PayloadRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match json_body(body) {
        Ok(req) => req,
        Err(reply) => return reply,
    };
    let result = ask(&state.pix, |response| PixRequest::Validate {
        payload: req.payload,
        response,
    })
    .await;

    match result {
        Ok(valid) => (StatusCode::OK, Json(json!({ "valid": valid }))),
        Err(reply) => reply,
    }
}

async fn classify_key(
    State(state): State<Channels>,
    body: Result<Json<ClassifyRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match json_body(body) {
        Ok(req) => req,
        Err(reply) => return reply,
    };
    let declared_type = match req.key_type.as_deref().map(PixKeyType::from_str).transpose() {
        Ok(declared_type) => declared_type,
        Err(e) => return error_reply(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    };

    let result = ask(&state.pix, |response| PixRequest::Classify {
        key: req.key,
        declared_type,
        response,
    })
    .await;

    match result {
        Ok(classification) => (StatusCode::OK, Json(json!(classification))),
        Err(reply) => reply,
    }
}

async fn request_payment(
    state: &Channels,
    input: String,
    source: IntakeSource,
) -> Result<PaymentData, Reply> {
    ask(&state.pix, |response| PixRequest::Intake {
        input,
        source,
        response,
    })
    .await?
    .map_err(service_error_reply)
}

async fn intake(
    State(state): State<Channels>,
    body: Result<Json<IntakeRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match json_body(body) {
        Ok(req) => req,
        Err(reply) => return reply,
    };
    match request_payment(&state, req.input, req.source).await {
        Ok(payment) => (StatusCode::OK, Json(json!(payment))),
        Err(reply) => reply,
    }
}

async fn quote(
    State(state): State<Channels>,
    body: Result<Json<QuoteRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match json_body(body) {
        Ok(req) => req,
        Err(reply) => return reply,
    };
    let payment = match req {
        QuoteRequest::Intake { input, source } => request_payment(&state, input, source).await,
        QuoteRequest::Manual { pix_key, amount } => ask(&state.pix, |response| {
            PixRequest::Manual {
                key: pix_key,
                amount,
                response,
            }
        })
        .await
        .and_then(|result| result.map_err(service_error_reply)),
    };
    let payment = match payment {
        Ok(payment) => payment,
        Err(reply) => return reply,
    };

    let result = ask(&state.price, |response| PriceRequest::Quote { payment, response }).await;
    match result {
        Ok(Ok(quote)) => (StatusCode::CREATED, Json(json!(quote))),
        Ok(Err(service_error)) => service_error_reply(service_error),
        Err(reply) => reply,
    }
}

async fn kale_rate(State(state): State<Channels>) -> impl IntoResponse {
    let result = ask(&state.price, |response| PriceRequest::GetRate { response }).await;

    match result {
        Ok(Ok(rate)) => (StatusCode::OK, Json(json!({ "rate": rate }))),
        Ok(Err(service_error)) => service_error_reply(service_error),
        Err(reply) => reply,
    }
}

pub fn router(channels: Channels) -> Router {
    Router::new()
        .route("/pix/decode", post(decode_payload))
        .route("/pix/validate", post(validate_payload))
        .route("/pix/classify", post(classify_key))
        .route("/pix/intake", post(intake))
        .route("/pix/quote", post(quote))
        .route("/price/kale", get(kale_rate))
        .route("/health", get(|| async { "OK" }))
        .with_state(channels)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(
    channels: Channels,
    host: &str,
    port: u16,
) -> Result<(), anyhow::Error> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(channels)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::price::{PriceError, PriceOracle};
    use crate::services::spawn_services;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use tower::ServiceExt;

    const PAYLOAD: &str = "00020126330014br.gov.bcb.pix011111987654321520400005303986540525.005802BR5914LUCAS BISPO DE6009SAO PAULO62070503***6304A1B2";

    struct FixedRate;

    #[async_trait]
    impl PriceOracle for FixedRate {
        async fn kale_rate(&self) -> Result<Decimal, PriceError> {
            Ok(Decimal::new(5, 1))
        }
    }

    fn app() -> Router {
        router(spawn_services(Arc::new(FixedRate), Decimal::from(1000)))
    }

    async fn post_json(path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_decode_endpoint() {
        let (status, body) = post_json("/pix/decode", json!({ "payload": PAYLOAD })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pixKey"], "11987654321");
        assert_eq!(body["pixKeyType"], "CPF");
        assert_eq!(body["recipientCity"], "SAO PAULO");

        let (status, body) = post_json("/pix/decode", json!({ "payload": "000201" })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["description"].is_string());
    }

    #[tokio::test]
    async fn test_validate_endpoint() {
        let (status, body) = post_json("/pix/validate", json!({ "payload": PAYLOAD })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
    }

    #[tokio::test]
    async fn test_classify_endpoint() {
        let (_, body) = post_json("/pix/classify", json!({ "key": "user@example.com" })).await;
        assert_eq!(body["keyType"], "EMAIL");
        assert_eq!(body["label"], "E-mail");
        assert_eq!(body["valid"], true);

        let (_, body) = post_json(
            "/pix/classify",
            json!({ "key": "user@example.com", "keyType": "CPF" }),
        )
        .await;
        assert_eq!(body["valid"], false);
    }

    #[tokio::test]
    async fn test_classify_legacy_key_type() {
        let (status, body) = post_json(
            "/pix/classify",
            json!({ "key": "123e4567-e89b-12d3-a456-426614174000", "keyType": "UUID" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["keyType"], "RANDOM");
        assert_eq!(body["valid"], true);

        let (status, body) = post_json(
            "/pix/classify",
            json!({ "key": "user@example.com", "keyType": "IBAN" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["description"], "Unknown PIX key type: IBAN");
    }

    #[tokio::test]
    async fn test_malformed_body_has_description() {
        let (status, body) = post_json("/pix/decode", json!({ "payload": 5 })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["description"].is_string());

        let (status, body) = post_json("/pix/classify", json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["description"].as_str().unwrap().contains("key"));
    }

    #[tokio::test]
    async fn test_quote_endpoint() {
        let (status, body) = post_json(
            "/pix/quote",
            json!({ "input": PAYLOAD, "source": "clipboard" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let kale_amount: Decimal = body["kaleAmount"].as_str().unwrap().parse().unwrap();
        assert_eq!(kale_amount, Decimal::from(50));
        assert_eq!(body["canSend"], true);
        assert_eq!(body["payment"]["recipientName"], "Lucas Bispo De");

        let (status, body) = post_json(
            "/pix/quote",
            json!({ "pixKey": "1198765432", "amount": "600,00" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["canSend"], false);

        let (status, _) = post_json("/pix/quote", json!({ "input": "!!!", "source": "qr_code" })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
