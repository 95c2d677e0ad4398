use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KaleNetwork {
    Mainnet,
    Testnet,
}

pub struct KaleConfig {
    pub asset_code: &'static str,
    pub issuer: &'static str,
    pub horizon_server: &'static str,
}

const MAINNET: KaleConfig = KaleConfig {
    asset_code: "KALE",
    issuer: "GBDVX4VELCDSQ54KQJYTNHXAHFLBCA77ZY2USQBM4CSHTTV7DME7KALE",
    horizon_server: "https://horizon.stellar.org",
};

const TESTNET: KaleConfig = KaleConfig {
    asset_code: "KALE",
    issuer: "GCHPTWXMT3HYF4RLZHWBNRF4MPXLTJ76ISHMSYIWCCDXWUYOQG5MR2AB",
    horizon_server: "https://horizon-testnet.stellar.org",
};

impl KaleNetwork {
    pub fn config(&self) -> &'static KaleConfig {
        match self {
            KaleNetwork::Mainnet => &MAINNET,
            KaleNetwork::Testnet => &TESTNET,
        }
    }

    /// Stellar asset identifier in `CODE:ISSUER` form.
    pub fn asset(&self) -> String {
        let config = self.config();
        format!("{}:{}", config.asset_code, config.issuer)
    }
}
