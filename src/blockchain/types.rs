// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network definitions and amount helpers.

use serde::{Deserialize, Serialize};

/// A chain the wallet can talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    /// Hex genesis block hash, no `0x`
    pub genesis_hash: String,
    pub gql_endpoint: String,
    /// Extra GraphQL endpoints tried when the primary fails.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_endpoints: Vec<String>,
    pub is_mainnet: bool,
}

impl Network {
    /// Primary endpoint followed by fallbacks, without duplicates.
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints = vec![self.gql_endpoint.clone()];
        for endpoint in &self.fallback_endpoints {
            if !endpoints.contains(endpoint) {
                endpoints.push(endpoint.clone());
            }
        }
        endpoints
    }

    /// Check the fields a user-imported network must get right.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("network id is empty".into());
        }
        for endpoint in self.endpoints() {
            let url: url::Url = endpoint
                .parse()
                .map_err(|e: url::ParseError| format!("invalid endpoint `{endpoint}`: {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("endpoint `{endpoint}` must be http(s)"));
            }
        }
        match alloy::hex::decode(&self.genesis_hash) {
            Ok(bytes) if bytes.len() == 32 => Ok(()),
            _ => Err("genesis hash must be 32 hex bytes".into()),
        }
    }
}

pub const ODIN_NETWORK_ID: &str = "0x000000000000";
pub const HEIMDALL_NETWORK_ID: &str = "0x000000000001";

/// Networks installed on first run.
pub fn default_networks() -> Vec<Network> {
    vec![
        Network {
            id: ODIN_NETWORK_ID.to_string(),
            name: "odin".to_string(),
            genesis_hash: "4582250d0da33b06779a8475d283d5dd210c683b9b999d74d03fac4f58fa6bce"
                .to_string(),
            gql_endpoint: "https://odin-rpc-1.nine-chronicles.com/graphql".to_string(),
            fallback_endpoints: Vec::new(),
            is_mainnet: true,
        },
        Network {
            id: HEIMDALL_NETWORK_ID.to_string(),
            name: "heimdall".to_string(),
            genesis_hash: "729fa26958648a35b53e8e3905d11ec53b1b4929bf5f499884aed7df616f5913"
                .to_string(),
            gql_endpoint: "https://heimdall-rpc-1.nine-chronicles.com/graphql".to_string(),
            fallback_endpoints: Vec::new(),
            is_mainnet: true,
        },
    ]
}

/// Decimal places of the transferable asset.
pub const ASSET_DECIMALS: u8 = 2;

/// Parse a human-readable amount into smallest units.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<u128, String> {
    let parts: Vec<&str> = amount.trim().split('.').collect();

    if parts.len() > 2 {
        return Err("Invalid amount format".to_string());
    }

    let whole = parts[0]
        .parse::<u128>()
        .map_err(|_| "Invalid whole number".to_string())?;

    let decimal_part = if parts.len() == 2 {
        let dec_str = parts[1];
        if dec_str.is_empty() || dec_str.len() > decimals as usize {
            return Err(format!("Invalid decimal places (max {decimals})"));
        }
        let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
        padded
            .parse::<u128>()
            .map_err(|_| "Invalid decimal".to_string())?
    } else {
        0u128
    };

    let multiplier = 10u128.pow(decimals as u32);
    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(decimal_part))
        .ok_or_else(|| "Amount overflow".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_networks_validate() {
        let networks = default_networks();
        assert_eq!(networks.len(), 2);
        for network in &networks {
            network.validate().unwrap();
        }
        assert_eq!(networks[0].id, ODIN_NETWORK_ID);
    }

    #[test]
    fn endpoints_put_primary_first_and_dedupe() {
        let mut network = default_networks().remove(1);
        network.fallback_endpoints = vec![
            "https://heimdall-rpc-2.nine-chronicles.com/graphql".into(),
            network.gql_endpoint.clone(),
        ];
        let endpoints = network.endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0], network.gql_endpoint);
    }

    #[test]
    fn validate_rejects_bad_input() {
        let mut network = default_networks().remove(0);
        network.gql_endpoint = "ftp://example.com".into();
        assert!(network.validate().is_err());

        let mut network = default_networks().remove(0);
        network.genesis_hash = "abcd".into();
        assert!(network.validate().is_err());
    }

    #[test]
    fn network_json_shape() {
        let json = serde_json::to_value(&default_networks()[0]).unwrap();
        assert_eq!(json["gqlEndpoint"], "https://odin-rpc-1.nine-chronicles.com/graphql");
        assert_eq!(json["isMainnet"], true);
        assert!(json.get("fallbackEndpoints").is_none());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1", 2).unwrap(), 100);
        assert_eq!(parse_amount("1.5", 2).unwrap(), 150);
        assert_eq!(parse_amount("0.01", 2).unwrap(), 1);
        assert!(parse_amount("0.001", 2).is_err());
        assert!(parse_amount("1.2.3", 2).is_err());
        assert!(parse_amount("-1", 2).is_err());
        assert!(parse_amount("1.", 2).is_err());
    }
}
