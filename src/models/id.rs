//! Identifier wire format.
//!
//! Ids travel in request paths as 32 hex digits (the simple form of a UUID).

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Length of an id on the wire.
pub const ID_HEX_LEN: usize = 32;

/// Parse a hex id, rejecting anything that is not exactly 32 hex digits.
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    if raw.len() != ID_HEX_LEN {
        return Err(AppError::InvalidInput(format!(
            "id must be {} hex characters, got {:?}",
            ID_HEX_LEN, raw
        )));
    }

    let mut bytes = [0u8; 16];
    hex::decode_to_slice(raw, &mut bytes)
        .map_err(|e| AppError::InvalidInput(format!("id {:?} is not valid hex: {}", raw, e)))?;

    Ok(Uuid::from_bytes(bytes))
}

/// Render an id in its wire form.
pub fn format_id(id: Uuid) -> String {
    hex::encode(id.as_bytes())
}

/// Serde adapter for ids in their wire form.
pub mod hex_id {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_id(*id))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_id(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional ids in their wire form.
pub mod opt_hex_id {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.serialize_some(&super::format_id(*id)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Uuid>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse_id(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
