//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from an entity definition.

use crate::catalog::{ColumnInfo, EntityDef, FilterSpec};
use serde_json::Value;
use std::collections::HashMap;

/// Alias of the entity's own table in SELECTs that join display names.
pub const MAIN_ALIAS: &str = "main";

/// Quote identifier for PostgreSQL (safe: only from the catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Next placeholder with a cast to the column type, e.g. `$2::int4`.
    fn placeholder(&mut self, column: &ColumnInfo, v: Value) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, column.sql_type.cast())
    }
}

/// Own columns as `main."col"` followed by joined display columns as `alias."col" AS "output"`.
fn projection(entity: &EntityDef) -> String {
    let mut parts: Vec<String> = entity
        .columns
        .iter()
        .map(|c| format!("{}.{}", MAIN_ALIAS, quoted(&c.name)))
        .collect();
    for j in &entity.joins {
        for (column, output) in &j.fields {
            parts.push(format!("{}.{} AS {}", quoted(&j.alias), quoted(column), quoted(output)));
        }
    }
    parts.join(", ")
}

fn from_clause(entity: &EntityDef) -> String {
    let mut from = format!("{} {}", quoted(&entity.table_name), MAIN_ALIAS);
    for j in &entity.joins {
        from.push_str(&format!(
            " LEFT JOIN {} {} ON {}.\"id\" = {}.{}",
            quoted(&j.table),
            quoted(&j.alias),
            quoted(&j.alias),
            MAIN_ALIAS,
            quoted(&j.local_column)
        ));
    }
    from
}

/// Plain column list of the entity's own table, for RETURNING.
fn returning_list(entity: &EntityDef) -> String {
    entity
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key with joined display columns. Caller binds id as `$1`.
pub fn select_by_id(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}.{} = $1",
        projection(entity),
        from_clause(entity),
        MAIN_ALIAS,
        quoted(&entity.pk_column)
    );
    q
}

/// SELECT list: filters appended as `AND` predicates in the given order, catalog ordering, LIMIT/OFFSET.
pub fn select_list(
    entity: &EntityDef,
    filters: &[(&FilterSpec, Value)],
    limit: Option<u32>,
    offset: Option<u32>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (f, val) in filters {
        let Some(c) = entity.column(&f.column) else { continue };
        let lhs = format!("{}.{}", MAIN_ALIAS, quoted(&c.name));
        let ph = q.placeholder(c, val.clone());
        if f.ignore_case {
            where_parts.push(format!("lower({}) = lower({})", lhs, ph));
        } else {
            where_parts.push(format!("{} = {}", lhs, ph));
        }
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let order_clause = if entity.order_by.is_empty() {
        String::new()
    } else {
        let keys: Vec<String> = entity
            .order_by
            .iter()
            .map(|o| {
                let dir = if o.descending { " DESC" } else { "" };
                format!("{}.{}{}", MAIN_ALIAS, quoted(&o.column), dir)
            })
            .collect();
        format!(" ORDER BY {}", keys.join(", "))
    };
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n.min(1000))).unwrap_or_default();
    let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        projection(entity),
        from_clause(entity),
        where_clause,
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

/// INSERT of insertable columns. A column missing from the body is omitted when it has a DB default
/// and inserted as NULL otherwise.
pub fn insert(entity: &EntityDef, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.columns.iter().filter(|c| c.insertable) {
        let val = body.get(&c.name).cloned();
        if val.is_none() && c.has_default {
            continue;
        }
        placeholders.push(q.placeholder(c, val.unwrap_or(Value::Null)));
        cols.push(quoted(&c.name));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(&entity.table_name),
            returning_list(entity)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(&entity.table_name),
            cols.join(", "),
            placeholders.join(", "),
            returning_list(entity)
        )
    };
    q
}

/// Full-row replace by id: every updatable column is set from the body, falling back to
/// `DEFAULT` or `NULL` when absent.
pub fn update(entity: &EntityDef, id: &Value, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in entity.columns.iter().filter(|c| c.updatable) {
        let rhs = match body.get(&c.name) {
            Some(v) => q.placeholder(c, v.clone()),
            None if c.has_default => "DEFAULT".to_string(),
            None => "NULL".to_string(),
        };
        sets.push(format!("{} = {}", quoted(&c.name), rhs));
    }
    let id_param = q.push_param(id.clone());
    if sets.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = ${}",
            returning_list(entity),
            quoted(&entity.table_name),
            quoted(&entity.pk_column),
            id_param
        );
        return q;
    }
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(&entity.table_name),
        sets.join(", "),
        quoted(&entity.pk_column),
        id_param,
        returning_list(entity)
    );
    q
}

/// DELETE by id. Caller binds id as `$1`.
pub fn delete(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        quoted(&entity.table_name),
        quoted(&entity.pk_column),
        quoted(&entity.pk_column)
    );
    q
}
