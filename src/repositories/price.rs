use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("Price request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("No {0} rate in price response")]
    MissingRate(String),
    #[error("Liquidity pool is empty")]
    EmptyPool,
}

/// Source of the KALE exchange rate, in quote currency per KALE.
#[async_trait]
pub trait PriceOracle: Send + Sync + 'static {
    async fn kale_rate(&self) -> Result<Decimal, PriceError>;
}

/// Oracle backed by a CoinGecko-style `simple/price` endpoint. The last good
/// rate is cached; until one arrives the configured fallback is served.
#[derive(Clone)]
pub struct PriceRepository {
    url: String,
    asset_id: String,
    fallback_rate: Decimal,
    rate_cache: Arc<RwLock<Option<Decimal>>>,
    client: reqwest::Client,
}

impl PriceRepository {
    pub fn new(url: String, asset_id: String, fallback_rate: Decimal) -> Self {
        Self {
            url,
            asset_id,
            fallback_rate,
            rate_cache: Arc::new(RwLock::new(None)),
            client: reqwest::Client::new(),
        }
    }

    pub async fn start_price_fetch_task(&self, interval_secs: u64) {
        let repository = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));

            loop {
                interval.tick().await;

                match repository.refresh_rate().await {
                    Ok(rate) => log::info!("Fetched KALE rate: {}", format_price(rate)),
                    Err(e) => log::error!("Error updating KALE rate: {}", e),
                }
            }
        });

        log::info!("Price fetch task started");
    }

    pub async fn refresh_rate(&self) -> Result<Decimal, PriceError> {
        let rate = self.fetch_rate().await?;
        let mut cache = self.rate_cache.write().await;
        *cache = Some(rate);

        Ok(rate)
    }

    async fn fetch_rate(&self) -> Result<Decimal, PriceError> {
        let prices: serde_json::Value = self
            .client
            .get(format!(
                "{}/api/v3/simple/price?ids={}&vs_currencies=brl",
                self.url, self.asset_id
            ))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        log::debug!("Price response: {:?}", prices);

        rate_from_response(&prices, &self.asset_id)
            .ok_or_else(|| PriceError::MissingRate(self.asset_id.clone()))
    }
}

fn rate_from_response(prices: &serde_json::Value, asset_id: &str) -> Option<Decimal> {
    prices[asset_id]["brl"]
        .as_f64()
        .and_then(Decimal::from_f64)
        .filter(|rate| *rate > Decimal::ZERO)
}

#[async_trait]
impl PriceOracle for PriceRepository {
    async fn kale_rate(&self) -> Result<Decimal, PriceError> {
        let cache = self.rate_cache.read().await;
        match *cache {
            Some(rate) => Ok(rate),
            None => {
                log::warn!("No cached KALE rate, using fallback {}", self.fallback_rate);
                Ok(self.fallback_rate)
            }
        }
    }
}

/// Rate implied by a constant-product pool's reserves.
pub struct PoolPriceOracle {
    quote_reserve: Decimal,
    kale_reserve: Decimal,
}

impl PoolPriceOracle {
    pub fn new(quote_reserve: Decimal, kale_reserve: Decimal) -> Self {
        Self {
            quote_reserve,
            kale_reserve,
        }
    }
}

#[async_trait]
impl PriceOracle for PoolPriceOracle {
    async fn kale_rate(&self) -> Result<Decimal, PriceError> {
        if self.kale_reserve <= Decimal::ZERO || self.quote_reserve <= Decimal::ZERO {
            return Err(PriceError::EmptyPool);
        }

        Ok(self.quote_reserve / self.kale_reserve)
    }
}

/// Display precision grows as the price shrinks.
pub fn format_price(price: Decimal) -> String {
    let decimals = if price < Decimal::new(1, 3) {
        6
    } else if price < Decimal::ONE {
        4
    } else {
        2
    };

    let mut rounded = price.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(decimals);
    rounded.to_string()
}
