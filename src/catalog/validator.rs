//! Consistency checks over the catalog, run once at startup.

use super::{Catalog, EntityDef};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(catalog: &Catalog) -> Result<(), ConfigError> {
    let mut segments = HashSet::new();
    for entity in catalog.entities() {
        if !segments.insert(entity.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(entity.path_segment.clone()));
        }
        validate_entity(entity)?;
    }
    Ok(())
}

fn validate_entity(entity: &EntityDef) -> Result<(), ConfigError> {
    let missing = |kind: &'static str, name: &str| ConfigError::MissingReference {
        kind,
        name: name.to_string(),
        entity: entity.table_name.clone(),
    };
    if entity.column(&entity.pk_column).is_none() {
        return Err(missing("primary key", &entity.pk_column));
    }
    for f in &entity.filters {
        if entity.column(&f.column).is_none() {
            return Err(missing("filter column", &f.column));
        }
    }
    for o in &entity.order_by {
        if entity.column(&o.column).is_none() {
            return Err(missing("order column", &o.column));
        }
    }
    for key in entity.validation.keys() {
        if entity.column(key).is_none() {
            return Err(missing("validation column", key));
        }
    }
    let mut aliases = HashSet::new();
    for j in &entity.joins {
        if entity.column(&j.local_column).is_none() {
            return Err(missing("join column", &j.local_column));
        }
        if j.alias == crate::sql::MAIN_ALIAS || !aliases.insert(j.alias.as_str()) {
            return Err(ConfigError::DuplicateJoinAlias {
                alias: j.alias.clone(),
                entity: entity.table_name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{JoinSpec, Resource};

    #[test]
    fn standard_catalog_is_consistent() {
        validate(&Catalog::standard()).unwrap();
    }

    #[test]
    fn every_resource_resolves_by_path() {
        let catalog = Catalog::standard();
        for r in Resource::ALL {
            let e = catalog.entity_by_path(r.path_segment()).unwrap();
            assert_eq!(e.resource, r);
        }
        assert!(catalog.entity_by_path("owners").is_none());
    }

    #[test]
    fn rejects_filter_on_unknown_column() {
        let mut entity = Catalog::standard().entity(Resource::Pets).clone();
        entity.filters[0].column = "colour".into();
        let err = validate_entity(&entity).unwrap_err();
        assert!(matches!(err, ConfigError::MissingReference { kind: "filter column", .. }));
    }

    #[test]
    fn rejects_join_alias_clashing_with_main() {
        let mut entity = Catalog::standard().entity(Resource::MedicalRecords).clone();
        entity.joins.push(JoinSpec {
            table: "pets".into(),
            alias: "main".into(),
            local_column: "pet_id".into(),
            fields: Vec::new(),
        });
        assert!(matches!(
            validate_entity(&entity),
            Err(ConfigError::DuplicateJoinAlias { .. })
        ));
    }
}
