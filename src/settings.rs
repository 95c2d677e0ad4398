use config::{Config, ConfigError, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::kale::KaleNetwork;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// CoinGecko-style HTTP price endpoint.
    #[default]
    Http,
    /// Fixed reserves of a constant-product pool.
    Pool,
}

#[derive(Debug, Deserialize)]
pub struct Pool {
    pub quote_reserve: Decimal,
    pub kale_reserve: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub source: PriceSource,
    pub url: String,
    pub asset_id: String,
    /// BRL per KALE used until the oracle answers.
    pub fallback_rate: Decimal,
    pub refresh_interval_secs: u64,
    pub pool: Option<Pool>,
}

#[derive(Debug, Deserialize)]
pub struct Wallet {
    pub network: KaleNetwork,
    /// Mock KALE balance quotes are checked against.
    pub balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub price: Price,
    pub wallet: Wallet,
}

impl Settings {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_settings_from_toml() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [price]
            url = "https://api.coingecko.com"
            asset_id = "kale"
            fallback_rate = "0.42"
            refresh_interval_secs = 60

            [wallet]
            network = "testnet"
            balance = "1247.89"
        "#;

        let settings: Settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.price.fallback_rate, Decimal::new(42, 2));
        assert_eq!(settings.wallet.network, KaleNetwork::Testnet);
        assert_eq!(settings.wallet.balance, Decimal::new(124789, 2));
        assert_eq!(settings.price.source, PriceSource::Http);
        assert!(settings.price.pool.is_none());
    }

    #[test]
    fn test_pool_price_source() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [price]
            source = "pool"
            url = "https://api.coingecko.com"
            asset_id = "kale"
            fallback_rate = "0.42"
            refresh_interval_secs = 60

            [price.pool]
            quote_reserve = "1769"
            kale_reserve = "4595406"

            [wallet]
            network = "mainnet"
            balance = "0"
        "#;

        let settings: Settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.price.source, PriceSource::Pool);
        let pool = settings.price.pool.unwrap();
        assert_eq!(pool.kale_reserve, Decimal::from(4595406));
    }
}
