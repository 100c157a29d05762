//! Embedded JSON schemas for the YAML documents the CLI reads

use rust_embed::Embed;
use std::collections::HashMap;
use std::fmt;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// Documents with a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// Booking draft (`register --from`, `validate`)
    Booking,
    /// Offline seed (`--seed`)
    Seed,
}

impl SchemaKind {
    pub fn all() -> &'static [SchemaKind] {
        &[SchemaKind::Booking, SchemaKind::Seed]
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            SchemaKind::Booking => "booking.schema.json",
            SchemaKind::Seed => "seed.schema.json",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Booking => write!(f, "booking draft"),
            SchemaKind::Seed => write!(f, "offline seed"),
        }
    }
}

/// Schema sources keyed by document kind
pub struct SchemaRegistry {
    schemas: HashMap<SchemaKind, String>,
}

impl SchemaRegistry {
    pub fn get(&self, kind: SchemaKind) -> Option<&str> {
        self.schemas.get(&kind).map(String::as_str)
    }

    pub fn has_schema(&self, kind: SchemaKind) -> bool {
        self.schemas.contains_key(&kind)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let schemas = SchemaKind::all()
            .iter()
            .filter_map(|kind| {
                let file = EmbeddedSchemas::get(kind.file_name())?;
                let text = String::from_utf8(file.data.into_owned()).ok()?;
                Some((*kind, text))
            })
            .collect();
        Self { schemas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_schemas_embedded_and_parse() {
        let registry = SchemaRegistry::default();
        for kind in SchemaKind::all() {
            let text = registry.get(*kind).unwrap();
            let json: serde_json::Value = serde_json::from_str(text).unwrap();
            assert_eq!(json["type"], "object");
        }
    }
}
