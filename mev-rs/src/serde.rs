pub use ethereum_consensus::serde::as_str;

/// Serializes a `u64` as a `0x`-prefixed hex quantity, as the execution JSON-RPC does.
pub mod as_hex_quantity {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let input = String::deserialize(deserializer)?;
        let digits = input
            .strip_prefix("0x")
            .ok_or_else(|| D::Error::custom("quantity must be 0x-prefixed"))?;
        u64::from_str_radix(digits, 16).map_err(D::Error::custom)
    }
}
