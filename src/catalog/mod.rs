//! Static resource catalog driving the SQL builder and the generic handlers.

mod definitions;
pub mod types;
pub mod validator;

pub use definitions::PET_STATUSES;
pub use types::*;
pub use validator::validate;

#[derive(Clone, Debug)]
pub struct Catalog {
    pets: EntityDef,
    adopters: EntityDef,
    shelters: EntityDef,
    adoptions: EntityDef,
    medical_records: EntityDef,
}

impl Catalog {
    pub fn standard() -> Self {
        Catalog {
            pets: definitions::pets(),
            adopters: definitions::adopters(),
            shelters: definitions::shelters(),
            adoptions: definitions::adoptions(),
            medical_records: definitions::medical_records(),
        }
    }

    pub fn entity(&self, resource: Resource) -> &EntityDef {
        match resource {
            Resource::Pets => &self.pets,
            Resource::Adopters => &self.adopters,
            Resource::Shelters => &self.shelters,
            Resource::Adoptions => &self.adoptions,
            Resource::MedicalRecords => &self.medical_records,
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDef> {
        Resource::ALL.into_iter().map(move |r| self.entity(r))
    }

    pub fn entity_by_path(&self, path: &str) -> Option<&EntityDef> {
        self.entities().find(|e| e.path_segment == path)
    }
}
