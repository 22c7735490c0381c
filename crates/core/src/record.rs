//! Dictionary form of an entity.

/// Attribute-name keyed mapping used for (de)serializing entities.
pub type Record = serde_json::Map<String, serde_json::Value>;
