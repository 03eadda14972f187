//! Raw provider records
//!
//! Field names follow the Etherscan account API. Numeric fields arrive as
//! decimal strings and are parsed on deserialization; amounts stay strings
//! until the normalizer scales them.

use serde::{de, Deserialize, Deserializer, Serialize};

/// Native transfer row (`txlist` / `txlistinternal`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransfer {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(deserialize_with = "number_from_string")]
    pub block_number: u64,
    #[serde(deserialize_with = "number_from_string")]
    pub time_stamp: i64,
    #[serde(default)]
    pub value: String,
    /// Absent on internal transfers
    #[serde(default)]
    pub gas_price: String,
    #[serde(default, deserialize_with = "number_from_string")]
    pub gas_used: u64,
    #[serde(default, deserialize_with = "number_from_string")]
    pub is_error: u8,
}

/// Mined block row (`getminedblocks`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMinedBlock {
    #[serde(deserialize_with = "number_from_string")]
    pub block_number: u64,
    #[serde(deserialize_with = "number_from_string")]
    pub time_stamp: i64,
    #[serde(default)]
    pub block_reward: String,
}

/// Token transfer row (`tokentx` / `tokennfttx`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenTransfer {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(deserialize_with = "number_from_string")]
    pub block_number: u64,
    #[serde(deserialize_with = "number_from_string")]
    pub time_stamp: i64,
    #[serde(default)]
    pub token_name: String,
    #[serde(default)]
    pub token_symbol: String,
    /// Absent on ERC-721 rows
    #[serde(default, deserialize_with = "number_from_string")]
    pub token_decimal: u32,
    /// Base units for ERC-20; absent on ERC-721 rows
    #[serde(default)]
    pub value: String,
    #[serde(default, rename = "tokenID")]
    pub token_id: String,
    #[serde(default)]
    pub gas_price: String,
    #[serde(default, deserialize_with = "number_from_string")]
    pub gas_used: u64,
}

/// Accepts `"123"`, `123` and `""` (as zero)
fn number_from_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    let text = match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(T::default());
    }
    text.parse::<T>().map_err(de::Error::custom)
}
