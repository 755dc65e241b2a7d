//! The five resource definitions, matching the tables created by `migration`.

use super::types::*;
use std::collections::HashMap;

fn pk() -> ColumnInfo {
    ColumnInfo {
        name: "id".into(),
        sql_type: SqlType::Int4,
        has_default: true,
        insertable: false,
        updatable: false,
    }
}

fn col(name: &str, sql_type: SqlType) -> ColumnInfo {
    ColumnInfo {
        name: name.into(),
        sql_type,
        has_default: false,
        insertable: true,
        updatable: true,
    }
}

fn defaulted(name: &str, sql_type: SqlType) -> ColumnInfo {
    ColumnInfo {
        has_default: true,
        ..col(name, sql_type)
    }
}

/// Set on create, never replaced afterwards.
fn fixed(column: ColumnInfo) -> ColumnInfo {
    ColumnInfo {
        updatable: false,
        ..column
    }
}

fn join(table: &str, alias: &str, local_column: &str, fields: &[(&str, &str)]) -> JoinSpec {
    JoinSpec {
        table: table.into(),
        alias: alias.into(),
        local_column: local_column.into(),
        fields: fields.iter().map(|(c, o)| (c.to_string(), o.to_string())).collect(),
    }
}

fn filter(column: &str, aliases: &[&str], ignore_case: bool) -> FilterSpec {
    FilterSpec {
        param: column.into(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        column: column.into(),
        ignore_case,
    }
}

fn desc(column: &str) -> OrderSpec {
    OrderSpec {
        column: column.into(),
        descending: true,
    }
}

fn rules(entries: Vec<(&str, ValidationRule)>) -> HashMap<String, ValidationRule> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub const PET_STATUSES: [&str; 3] = ["available", "pending", "adopted"];

pub(super) fn pets() -> EntityDef {
    EntityDef {
        resource: Resource::Pets,
        label: "Pet".into(),
        table_name: "pets".into(),
        path_segment: Resource::Pets.path_segment().into(),
        pk_column: "id".into(),
        columns: vec![
            pk(),
            col("name", SqlType::Text),
            col("species", SqlType::Text),
            col("gender", SqlType::Text),
            col("age", SqlType::Int4),
            defaulted("adoption_status", SqlType::Text),
            col("image_url", SqlType::Text),
            col("shelter_id", SqlType::Int4),
            fixed(defaulted("added_date", SqlType::Date)),
        ],
        joins: vec![join(
            "shelters",
            "s",
            "shelter_id",
            &[("name", "shelter_name"), ("phone", "shelter_phone"), ("email", "shelter_email")],
        )],
        filters: vec![
            filter("species", &[], true),
            filter("gender", &[], true),
            filter("adoption_status", &["status"], true),
            filter("shelter_id", &[], false),
        ],
        order_by: vec![desc("added_date"), desc("id")],
        validation: rules(vec![
            ("name", ValidationRule::required().max_length(100)),
            ("species", ValidationRule::required().max_length(50)),
            ("gender", ValidationRule::optional().max_length(20)),
            ("age", ValidationRule::optional().range(0.0, 100.0)),
            ("adoption_status", ValidationRule::optional().allowed(&PET_STATUSES)),
            ("shelter_id", ValidationRule::required()),
        ]),
    }
}

pub(super) fn adopters() -> EntityDef {
    EntityDef {
        resource: Resource::Adopters,
        label: "Adopter".into(),
        table_name: "adopters".into(),
        path_segment: Resource::Adopters.path_segment().into(),
        pk_column: "id".into(),
        columns: vec![
            pk(),
            col("full_name", SqlType::Text),
            col("email", SqlType::Text),
            col("phone", SqlType::Text),
            col("address", SqlType::Text),
            col("account", SqlType::Text),
        ],
        joins: Vec::new(),
        filters: Vec::new(),
        order_by: vec![desc("id")],
        validation: rules(vec![
            ("full_name", ValidationRule::required().max_length(100)),
            ("email", ValidationRule::required().format("email").max_length(255)),
            ("phone", ValidationRule::optional().max_length(20)),
        ]),
    }
}

pub(super) fn shelters() -> EntityDef {
    EntityDef {
        resource: Resource::Shelters,
        label: "Shelter".into(),
        table_name: "shelters".into(),
        path_segment: Resource::Shelters.path_segment().into(),
        pk_column: "id".into(),
        columns: vec![
            pk(),
            col("name", SqlType::Text),
            col("address", SqlType::Text),
            col("phone", SqlType::Text),
            col("email", SqlType::Text),
        ],
        joins: Vec::new(),
        filters: Vec::new(),
        order_by: vec![desc("id")],
        validation: rules(vec![
            ("name", ValidationRule::required().max_length(100)),
            ("email", ValidationRule::optional().format("email").max_length(255)),
            ("phone", ValidationRule::optional().max_length(20)),
        ]),
    }
}

pub(super) fn adoptions() -> EntityDef {
    EntityDef {
        resource: Resource::Adoptions,
        label: "Adoption record".into(),
        table_name: "adoption_records".into(),
        path_segment: Resource::Adoptions.path_segment().into(),
        pk_column: "id".into(),
        columns: vec![
            pk(),
            fixed(col("adopter_id", SqlType::Int4)),
            fixed(col("pet_id", SqlType::Int4)),
            fixed(col("shelter_id", SqlType::Int4)),
            defaulted("adoption_date", SqlType::Date),
            col("notes", SqlType::Text),
        ],
        joins: vec![
            join("adopters", "a", "adopter_id", &[("full_name", "adopter_name")]),
            join("pets", "p", "pet_id", &[("name", "pet_name")]),
            join("shelters", "s", "shelter_id", &[("name", "shelter_name")]),
        ],
        filters: vec![
            filter("adopter_id", &[], false),
            filter("shelter_id", &[], false),
            filter("pet_id", &[], false),
        ],
        order_by: vec![desc("adoption_date"), desc("id")],
        validation: rules(vec![
            ("adopter_id", ValidationRule::required()),
            ("pet_id", ValidationRule::required()),
            ("adoption_date", ValidationRule::optional().format("date")),
        ]),
    }
}

pub(super) fn medical_records() -> EntityDef {
    EntityDef {
        resource: Resource::MedicalRecords,
        label: "Medical record".into(),
        table_name: "medical_records".into(),
        path_segment: Resource::MedicalRecords.path_segment().into(),
        pk_column: "id".into(),
        columns: vec![
            pk(),
            fixed(col("pet_id", SqlType::Int4)),
            col("checkup_date", SqlType::Date),
            col("condition", SqlType::Text),
            col("treatment", SqlType::Text),
            col("vet_name", SqlType::Text),
        ],
        joins: vec![join("pets", "p", "pet_id", &[("name", "pet_name")])],
        filters: vec![filter("pet_id", &[], false)],
        order_by: vec![desc("checkup_date"), desc("id")],
        validation: rules(vec![
            ("pet_id", ValidationRule::required()),
            ("checkup_date", ValidationRule::required().format("date")),
            ("vet_name", ValidationRule::optional().max_length(100)),
        ]),
    }
}
