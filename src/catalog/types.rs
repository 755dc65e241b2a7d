//! Resource definitions: tables, columns, joins, filters and validation rules for runtime use.

use crate::error::AppError;
use std::collections::HashMap;

/// The five resources exposed by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Pets,
    Adopters,
    Shelters,
    Adoptions,
    MedicalRecords,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Pets,
        Resource::Adopters,
        Resource::Shelters,
        Resource::Adoptions,
        Resource::MedicalRecords,
    ];

    pub fn path_segment(self) -> &'static str {
        match self {
            Resource::Pets => "pets",
            Resource::Adopters => "adopters",
            Resource::Shelters => "shelters",
            Resource::Adoptions => "adoptions",
            Resource::MedicalRecords => "medical-records",
        }
    }
}

/// Binds a handler to one resource at compile time, e.g. `entity::list::<Adopters>`.
pub trait ResourceKind: Send + Sync + 'static {
    const RESOURCE: Resource;
}

macro_rules! resource_kind {
    ($name:ident) => {
        pub struct $name;

        impl ResourceKind for $name {
            const RESOURCE: Resource = Resource::$name;
        }
    };
}

pub mod kinds {
    use super::{Resource, ResourceKind};

    resource_kind!(Pets);
    resource_kind!(Adopters);
    resource_kind!(Shelters);
    resource_kind!(Adoptions);
    resource_kind!(MedicalRecords);
}

/// PostgreSQL type used for casts when binding JSON values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Int4,
    Text,
    Date,
}

impl SqlType {
    pub fn cast(self) -> &'static str {
        match self {
            SqlType::Int4 => "int4",
            SqlType::Text => "text",
            SqlType::Date => "date",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: SqlType,
    /// Whether the column has a DB default (serial, CURRENT_DATE, 'available').
    pub has_default: bool,
    /// Accepted from the request body on create.
    pub insertable: bool,
    /// Replaced on update. Columns fixed after creation are insertable only.
    pub updatable: bool,
}

/// LEFT JOIN to a parent table (`alias.id = main.local_column`) exposing some of its columns.
#[derive(Clone, Debug)]
pub struct JoinSpec {
    pub table: String,
    pub alias: String,
    pub local_column: String,
    /// (column in the joined table, output name in the row).
    pub fields: Vec<(String, String)>,
}

/// List filter: query parameter (or alias) matched exactly against a column.
#[derive(Clone, Debug)]
pub struct FilterSpec {
    pub param: String,
    pub aliases: Vec<String>,
    pub column: String,
    pub ignore_case: bool,
}

#[derive(Clone, Debug)]
pub struct OrderSpec {
    pub column: String,
    pub descending: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: Option<bool>,
    /// `email` or `date`.
    pub format: Option<String>,
    pub max_length: Option<u32>,
    pub allowed: Option<Vec<serde_json::Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl ValidationRule {
    pub fn required() -> Self {
        ValidationRule {
            required: Some(true),
            ..Default::default()
        }
    }

    pub fn optional() -> Self {
        ValidationRule::default()
    }

    pub fn max_length(mut self, n: u32) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn allowed(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| serde_json::Value::String(v.to_string())).collect());
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }
}

#[derive(Clone, Debug)]
pub struct EntityDef {
    pub resource: Resource,
    /// Singular display name used in messages ("Pet not found").
    pub label: String,
    pub table_name: String,
    pub path_segment: String,
    pub pk_column: String,
    pub columns: Vec<ColumnInfo>,
    pub joins: Vec<JoinSpec>,
    pub filters: Vec<FilterSpec>,
    pub order_by: Vec<OrderSpec>,
    pub validation: HashMap<String, ValidationRule>,
}

impl EntityDef {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn filter_for_param(&self, param: &str) -> Option<&FilterSpec> {
        self.filters
            .iter()
            .find(|f| f.param == param || f.aliases.iter().any(|a| a == param))
    }

    pub fn not_found(&self, id: i32) -> AppError {
        AppError::NotFound(format!("{} {} not found", self.label, id))
    }
}
