//! Resource routes under `/api`, one block per resource.

use crate::catalog::kinds::{Adopters, Adoptions, MedicalRecords, Pets, Shelters};
use crate::handlers::{adopters, adoptions, entity, pets, query, shelters, upload};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/pets", get(entity::list::<Pets>).post(pets::create))
        .route(
            "/pets/:id",
            get(entity::read::<Pets>).put(pets::update).delete(pets::delete),
        )
        .route("/pets/:id/image", post(pets::upload_image))
        .route("/adopters", get(entity::list::<Adopters>).post(entity::create::<Adopters>))
        .route(
            "/adopters/:id",
            get(entity::read::<Adopters>)
                .put(entity::update::<Adopters>)
                .delete(adopters::delete),
        )
        .route("/shelters", get(entity::list::<Shelters>).post(entity::create::<Shelters>))
        .route(
            "/shelters/:id",
            get(entity::read::<Shelters>)
                .put(entity::update::<Shelters>)
                .delete(shelters::delete),
        )
        .route("/shelters/:id/stats", get(shelters::stats))
        .route("/adoptions", get(entity::list::<Adoptions>).post(adoptions::adopt))
        .route(
            "/adoptions/:id",
            get(entity::read::<Adoptions>)
                .put(adoptions::update)
                .delete(adoptions::cancel),
        )
        .route(
            "/medical-records",
            get(entity::list::<MedicalRecords>).post(entity::create::<MedicalRecords>),
        )
        .route(
            "/medical-records/:id",
            get(entity::read::<MedicalRecords>)
                .put(entity::update::<MedicalRecords>)
                .delete(entity::delete::<MedicalRecords>),
        )
        .route("/query", post(query::run))
        .route("/upload", post(upload::upload))
        .with_state(state)
}
