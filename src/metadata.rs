//! Collaborators the compiler consumes: table/type metadata and string escaping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{JoineryError, JoineryResult};

/// Declared semantic type of a field, selecting how literals are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DomainType {
    String,
    Json,
    Integer,
    Timestamp,
    Float,
    DateTime,
    #[default]
    Other,
}

impl DomainType {
    pub fn name(&self) -> &'static str {
        match self {
            DomainType::String => "String",
            DomainType::Json => "JSON",
            DomainType::Integer => "Integer",
            DomainType::Timestamp => "Timestamp",
            DomainType::Float => "Float",
            DomainType::DateTime => "DateTime",
            DomainType::Other => "Other",
        }
    }
}

impl From<&str> for DomainType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => DomainType::String,
            "json" => DomainType::Json,
            "integer" | "int" => DomainType::Integer,
            "timestamp" => DomainType::Timestamp,
            "float" | "double" => DomainType::Float,
            "datetime" => DomainType::DateTime,
            _ => DomainType::Other,
        }
    }
}

impl From<String> for DomainType {
    fn from(s: String) -> Self {
        DomainType::from(s.as_str())
    }
}

impl From<DomainType> for String {
    fn from(t: DomainType) -> Self {
        t.name().to_string()
    }
}

/// Resolves classes to table names and fields to domain types.
pub trait Metadata {
    /// SQL table name backing `class`.
    fn table_name(&self, class: &str) -> JoineryResult<String>;

    /// Domain type of `field` on `class`.
    fn property_type(&self, class: &str, field: &str) -> JoineryResult<DomainType>;
}

/// Neutralises quote and delimiter characters in text literals.
pub trait Escaper {
    fn escape_string(&self, raw: &str) -> String;
}

/// MySQL string escaping, as `mysql_real_escape_string` does it
/// for connections not in NO_BACKSLASH_ESCAPES mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlEscaper;

impl Escaper for MysqlEscaper {
    fn escape_string(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len() + 8);
        for c in raw.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\x1a' => out.push_str("\\Z"),
                c => out.push(c),
            }
        }
        out
    }
}

/// One entity of the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDef {
    pub table: String,
    #[serde(default)]
    pub fields: HashMap<String, DomainType>,
}

/// In-memory metadata provider, usually loaded from the `[entities]`
/// section of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entities: HashMap<String, EntityDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `class` backed by `table`.
    pub fn entity(mut self, class: impl Into<String>, table: impl Into<String>) -> Self {
        self.entities.insert(
            class.into(),
            EntityDef {
                table: table.into(),
                fields: HashMap::new(),
            },
        );
        self
    }

    /// Declare the domain type of a field. The class must already be registered.
    pub fn field(mut self, class: &str, field: impl Into<String>, ty: DomainType) -> Self {
        if let Some(def) = self.entities.get_mut(class) {
            def.fields.insert(field.into(), ty);
        }
        self
    }

    pub fn add(&mut self, class: impl Into<String>, def: EntityDef) {
        self.entities.insert(class.into(), def);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn get(&self, class: &str) -> JoineryResult<&EntityDef> {
        self.entities
            .get(class)
            .ok_or_else(|| JoineryError::UnknownClass(class.to_string()))
    }
}

impl Metadata for Catalog {
    fn table_name(&self, class: &str) -> JoineryResult<String> {
        Ok(self.get(class)?.table.clone())
    }

    fn property_type(&self, class: &str, field: &str) -> JoineryResult<DomainType> {
        Ok(self.get(class)?.fields.get(field).copied().unwrap_or_default())
    }
}
