use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::repositories::price::{PoolPriceOracle, PriceOracle, PriceRepository};
use crate::settings::{self, PriceSource, Settings};

pub mod http;
pub mod pix;
pub mod price;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Price error: {0}")]
    Price(String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

/// Channels into the running services.
#[derive(Clone)]
pub struct Channels {
    pub pix: mpsc::Sender<pix::PixRequest>,
    pub price: mpsc::Sender<price::PriceRequest>,
}

/// Spawns the PIX and price services around `oracle` and returns their
/// request channels.
pub fn spawn_services(
    oracle: Arc<dyn PriceOracle>,
    balance: rust_decimal::Decimal,
) -> Channels {
    let (pix_tx, mut pix_rx) = mpsc::channel(512);
    let (price_tx, mut price_rx) = mpsc::channel(512);

    let mut pix_service = pix::PixService::new();
    let mut price_service = price::PriceService::new();

    log::info!("Starting PIX service.");
    tokio::spawn(async move {
        pix_service
            .run(pix::PixRequestHandler::new(), &mut pix_rx)
            .await;
    });

    log::info!("Starting price service.");
    tokio::spawn(async move {
        let handler = price::PriceRequestHandler::new(oracle, balance);
        price_service.run(handler, &mut price_rx).await;
    });

    Channels {
        pix: pix_tx,
        price: price_tx,
    }
}

/// Builds the configured price oracle. The HTTP oracle starts its refresh
/// task here.
pub async fn build_oracle(price: settings::Price) -> Result<Arc<dyn PriceOracle>, anyhow::Error> {
    match price.source {
        PriceSource::Http => {
            let repository = PriceRepository::new(price.url, price.asset_id, price.fallback_rate);
            repository
                .start_price_fetch_task(price.refresh_interval_secs)
                .await;
            let oracle: Arc<dyn PriceOracle> = Arc::new(repository);
            Ok(oracle)
        }
        PriceSource::Pool => {
            let pool = price
                .pool
                .ok_or_else(|| anyhow::anyhow!("price source is pool but [price.pool] is missing"))?;
            log::info!(
                "Pricing KALE from pool reserves {} / {}",
                pool.quote_reserve,
                pool.kale_reserve
            );
            let oracle: Arc<dyn PriceOracle> =
                Arc::new(PoolPriceOracle::new(pool.quote_reserve, pool.kale_reserve));
            Ok(oracle)
        }
    }
}

pub async fn start_services(settings: Settings) -> Result<(), anyhow::Error> {
    log::info!(
        "KALE asset on {:?}: {} (horizon {})",
        settings.wallet.network,
        settings.wallet.network.asset(),
        settings.wallet.network.config().horizon_server
    );

    let oracle = build_oracle(settings.price).await?;
    let channels = spawn_services(oracle, settings.wallet.balance);

    log::info!("Starting HTTP server.");
    http::start_http_server(channels, &settings.server.host, settings.server.port).await
}
