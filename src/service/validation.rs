//! Request validation from catalog rules.

use crate::catalog::{EntityDef, SqlType, ValidationRule};
use crate::error::AppError;
use serde_json::Value;
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate body against per-column rules. All required fields must be present and non-empty.
    pub fn validate(
        body: &HashMap<String, Value>,
        rules: &HashMap<String, ValidationRule>,
    ) -> Result<(), AppError> {
        let mut columns: Vec<&String> = rules.keys().collect();
        columns.sort();
        for col in columns {
            let rule = &rules[col];
            let val = body.get(col.as_str());
            if rule.required == Some(true) && is_blank(val) {
                return Err(AppError::Validation(format!("{} is required", col)));
            }
            if let Some(v) = val {
                validate_field(col, v, rule)?;
            }
        }
        Ok(())
    }

    /// Check body values against the column types and normalize them: integer columns take
    /// integers or numeric strings, date columns take `YYYY-MM-DD`; blank strings become null.
    pub fn coerce_types(body: &mut HashMap<String, Value>, entity: &EntityDef) -> Result<(), AppError> {
        for column in &entity.columns {
            let Some(v) = body.get_mut(&column.name) else { continue };
            match column.sql_type {
                SqlType::Int4 => {
                    *v = int_value(&column.name, v)?.map(Value::from).unwrap_or(Value::Null);
                }
                SqlType::Date => {
                    *v = date_value(&column.name, v)?;
                }
                SqlType::Text => {}
            }
        }
        Ok(())
    }
}

/// An int4 from a JSON number or numeric string. Fractions and values outside i32 are rejected
/// rather than rounded or left for the database to refuse.
pub(crate) fn int_value(col: &str, v: &Value) -> Result<Option<i32>, AppError> {
    let invalid = || AppError::Validation(format!("{} must be an integer", col));
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()).map(Some).ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<i32>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn date_value(col: &str, v: &Value) -> Result<Value, AppError> {
    let invalid = || AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", col));
    match v {
        Value::Null => Ok(Value::Null),
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        Value::String(s) => chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn is_blank(val: Option<&Value>) -> bool {
    match val {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            let names: Vec<&str> = allowed.iter().filter_map(Value::as_str).collect();
            return Err(AppError::Validation(format!(
                "{} must be one of: {}",
                col,
                names.join(", ")
            )));
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

/// Strings compare case-insensitively so "Available" matches "available".
fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s.eq_ignore_ascii_case(t),
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    match format.to_lowercase().as_str() {
        "email" => {
            if let Some(s) = v.as_str() {
                if !s.contains('@') || s.len() < 3 {
                    return Err(AppError::Validation(format!("{} must be a valid email", col)));
                }
            }
        }
        "date" => {
            if let Some(s) = v.as_str() {
                if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                    return Err(AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", col)));
                }
            }
        }
        _ => {}
    }
    Ok(())
}
