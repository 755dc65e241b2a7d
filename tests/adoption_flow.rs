//! Database-backed checks of the adoption rules. Set TEST_DATABASE_URL to a disposable
//! PostgreSQL database to run them; without it every test returns immediately.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pet_adoption::service::console::{self, ConsoleOutcome};
use pet_adoption::service::{adopters, adoptions, pets, shelters};
use pet_adoption::{app, apply_migrations, AppError, AppState, Catalog, Resource, Settings};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const CONSOLE_TOKEN: &str = "flow-token";

async fn pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return None;
    };
    let pool = PgPoolOptions::new().max_connections(8).connect(&url).await.unwrap();
    apply_migrations(&pool).await.unwrap();
    Some(pool)
}

fn router(pool: &PgPool) -> Router {
    let settings = Settings {
        upload_dir: std::env::temp_dir().join("pet-adoption-flow-uploads"),
        sql_console_token: Some(CONSOLE_TOKEN.into()),
        ..Settings::default()
    };
    app(AppState::new(pool.clone(), settings))
}

async fn call(pool: &PgPool, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", CONSOLE_TOKEN));
    let req = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    read(router(pool).oneshot(req).await.unwrap()).await
}

async fn read(res: axum::response::Response) -> (StatusCode, Value) {
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn shelter(pool: &PgPool) -> i32 {
    sqlx::query_scalar("INSERT INTO shelters (name) VALUES ('Test Shelter') RETURNING id")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn pet(pool: &PgPool, shelter_id: i32, status: &str) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO pets (name, species, adoption_status, shelter_id) VALUES ('Rex', 'dog', $1, $2) RETURNING id",
    )
    .bind(status)
    .bind(shelter_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn adopter(pool: &PgPool) -> i32 {
    sqlx::query_scalar("INSERT INTO adopters (full_name, email) VALUES ('Ada', 'ada@example.com') RETURNING id")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn pet_status(pool: &PgPool, pet_id: i32) -> String {
    sqlx::query_scalar("SELECT adoption_status FROM pets WHERE id = $1")
        .bind(pet_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn adoption_count(pool: &PgPool, pet_id: i32) -> i64 {
    sqlx::query_scalar("SELECT count(*) FROM adoption_records WHERE pet_id = $1")
        .bind(pet_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn request(adopter_id: i32, pet_id: i32) -> adoptions::AdoptRequest {
    adoptions::AdoptRequest {
        adopter_id,
        pet_id,
        shelter_id: None,
        notes: Some("first visit".into()),
        adoption_date: None,
    }
}

#[tokio::test]
async fn adopting_marks_pet_adopted_and_cancel_restores_it() {
    let Some(pool) = pool().await else { return };
    let catalog = Catalog::standard();
    let entity = catalog.entity(Resource::Adoptions);
    let sid = shelter(&pool).await;
    let pid = pet(&pool, sid, "available").await;
    let aid = adopter(&pool).await;

    let record = adoptions::adopt(&pool, entity, request(aid, pid)).await.unwrap();
    assert_eq!(record["shelter_id"], json!(sid));
    assert_eq!(pet_status(&pool, pid).await, "adopted");

    let id = record["id"].as_i64().unwrap() as i32;
    let cancelled = adoptions::cancel(&pool, entity, id).await.unwrap();
    assert_eq!(cancelled.pet_id, pid);
    assert_eq!(pet_status(&pool, pid).await, "available");
    assert_eq!(adoption_count(&pool, pid).await, 0);

    let again = adoptions::cancel(&pool, entity, id).await.unwrap_err();
    assert!(matches!(again, AppError::NotFound(_)));
}

#[tokio::test]
async fn pending_pet_cannot_be_adopted() {
    let Some(pool) = pool().await else { return };
    let catalog = Catalog::standard();
    let sid = shelter(&pool).await;
    let pid = pet(&pool, sid, "pending").await;
    let aid = adopter(&pool).await;

    let err = adoptions::adopt(&pool, catalog.entity(Resource::Adoptions), request(aid, pid))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Pet is not available for adoption");
    assert_eq!(adoption_count(&pool, pid).await, 0);
    assert_eq!(pet_status(&pool, pid).await, "pending");
}

#[tokio::test]
async fn shelter_mismatch_and_unknown_adopter_are_rejected() {
    let Some(pool) = pool().await else { return };
    let catalog = Catalog::standard();
    let entity = catalog.entity(Resource::Adoptions);
    let sid = shelter(&pool).await;
    let other = shelter(&pool).await;
    let pid = pet(&pool, sid, "available").await;
    let aid = adopter(&pool).await;

    let mut req = request(aid, pid);
    req.shelter_id = Some(other);
    assert!(matches!(adoptions::adopt(&pool, entity, req).await, Err(AppError::BadRequest(_))));

    let missing = adoptions::adopt(&pool, entity, request(i32::MAX, pid)).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    assert_eq!(pet_status(&pool, pid).await, "available");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adoptions_of_one_pet_admit_exactly_one() {
    let Some(pool) = pool().await else { return };
    let catalog = Arc::new(Catalog::standard());
    let sid = shelter(&pool).await;
    let pid = pet(&pool, sid, "available").await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        let catalog = catalog.clone();
        let aid = adopter(&pool).await;
        handles.push(tokio::spawn(async move {
            adoptions::adopt(&pool, catalog.entity(Resource::Adoptions), request(aid, pid)).await
        }));
    }
    let mut ok = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => assert_eq!(e.status(), axum::http::StatusCode::BAD_REQUEST, "{e}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(adoption_count(&pool, pid).await, 1);
}

#[tokio::test]
async fn adopter_with_adoption_cannot_be_deleted() {
    let Some(pool) = pool().await else { return };
    let catalog = Catalog::standard();
    let sid = shelter(&pool).await;
    let pid = pet(&pool, sid, "available").await;
    let aid = adopter(&pool).await;
    adoptions::adopt(&pool, catalog.entity(Resource::Adoptions), request(aid, pid)).await.unwrap();

    let err = adopters::delete_adopter(&pool, catalog.entity(Resource::Adopters), aid)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete adopter with active adoptions");

    let lonely = adopter(&pool).await;
    adopters::delete_adopter(&pool, catalog.entity(Resource::Adopters), lonely).await.unwrap();
}

#[tokio::test]
async fn adopted_pet_cannot_be_deleted_or_reassigned() {
    let Some(pool) = pool().await else { return };
    let catalog = Catalog::standard();
    let pets_entity = catalog.entity(Resource::Pets);
    let sid = shelter(&pool).await;
    let pid = pet(&pool, sid, "available").await;
    let aid = adopter(&pool).await;
    adoptions::adopt(&pool, catalog.entity(Resource::Adoptions), request(aid, pid)).await.unwrap();

    let err = pets::delete_pet(&pool, pets_entity, pid).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete adopted pet");

    let body: HashMap<String, Value> = [
        ("name".to_string(), json!("Rex")),
        ("species".to_string(), json!("dog")),
        ("shelter_id".to_string(), json!(sid)),
        ("adoption_status".to_string(), json!("available")),
    ]
    .into_iter()
    .collect();
    assert!(matches!(
        pets::update_pet(&pool, pets_entity, pid, body).await,
        Err(AppError::Conflict(_))
    ));
    assert_eq!(pet_status(&pool, pid).await, "adopted");
}

#[tokio::test]
async fn deleting_shelter_removes_everything_that_references_it() {
    let Some(pool) = pool().await else { return };
    let catalog = Catalog::standard();
    let sid = shelter(&pool).await;
    let adopted = pet(&pool, sid, "available").await;
    let waiting = pet(&pool, sid, "pending").await;
    sqlx::query("INSERT INTO medical_records (pet_id, checkup_date) VALUES ($1, CURRENT_DATE)")
        .bind(waiting)
        .execute(&pool)
        .await
        .unwrap();
    let aid = adopter(&pool).await;
    adoptions::adopt(&pool, catalog.entity(Resource::Adoptions), request(aid, adopted)).await.unwrap();

    let removal = shelters::delete_shelter(&pool, catalog.entity(Resource::Shelters), sid).await.unwrap();
    assert_eq!(removal.pets_removed, 2);
    assert_eq!(removal.adoptions_removed, 1);
    assert_eq!(removal.medical_records_removed, 1);

    let left: i64 = sqlx::query_scalar("SELECT count(*) FROM pets WHERE shelter_id = $1")
        .bind(sid)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(left, 0);
    assert_eq!(adoption_count(&pool, adopted).await, 0);

    let gone = shelters::delete_shelter(&pool, catalog.entity(Resource::Shelters), sid).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn console_reports_rows_and_affected_counts() {
    let Some(pool) = pool().await else { return };
    let sid = shelter(&pool).await;

    let select = format!("SELECT id, name FROM shelters WHERE id = {}", sid);
    match console::execute(&pool, &select, 5_000).await.unwrap() {
        ConsoleOutcome::Rows { results, row_count } => {
            assert_eq!(row_count, 1);
            assert_eq!(results[0]["name"], "Test Shelter");
        }
        other => panic!("expected rows, got {:?}", other),
    }

    let update = format!("UPDATE shelters SET phone = '555' WHERE id = {}", sid);
    match console::execute(&pool, &update, 5_000).await.unwrap() {
        ConsoleOutcome::Affected { affected_rows, .. } => assert_eq!(affected_rows, 1),
        other => panic!("expected affected count, got {:?}", other),
    }

    let empty = console::execute(&pool, "   ", 5_000).await.unwrap_err();
    assert_eq!(empty.to_string(), "No query provided");
}

#[tokio::test]
async fn medical_records_round_trip_through_the_api() {
    let Some(pool) = pool().await else { return };
    let sid = shelter(&pool).await;
    let pid = pet(&pool, sid, "available").await;

    let (status, created) = call(
        &pool,
        "POST",
        "/api/medical-records",
        Some(json!({ "petId": pid, "checkupDate": "2024-03-04", "condition": "healthy", "vetName": "Dr. Lee" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let rid = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["checkup_date"], "2024-03-04");

    let (status, listed) = call(&pool, "GET", &format!("/api/medical-records?petId={}", pid), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["meta"]["count"], 1);
    assert_eq!(listed["data"][0]["pet_name"], "Rex");

    let (status, updated) = call(
        &pool,
        "PUT",
        &format!("/api/medical-records/{}", rid),
        Some(json!({ "petId": pid, "checkupDate": "2024-04-01", "treatment": "vaccine" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["checkup_date"], "2024-04-01");
    assert_eq!(updated["data"]["condition"], Value::Null);

    let (status, _) = call(&pool, "DELETE", &format!("/api/medical-records/{}", rid), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&pool, "GET", &format!("/api/medical-records/{}", rid), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &pool,
        "POST",
        "/api/medical-records",
        Some(json!({ "petId": i32::MAX, "checkupDate": "2024-03-04" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn editing_an_adoption_keeps_its_date_and_parties() {
    let Some(pool) = pool().await else { return };
    let sid = shelter(&pool).await;
    let pid = pet(&pool, sid, "available").await;
    let other_pet = pet(&pool, sid, "available").await;
    let aid = adopter(&pool).await;

    let (status, adopted) = call(
        &pool,
        "POST",
        "/api/adoptions",
        Some(json!({ "adopterId": aid, "petId": pid, "adoptionDate": "2020-01-15" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = adopted["data"]["id"].as_i64().unwrap();

    let (status, edited) = call(&pool, "PUT", &format!("/api/adoptions/{}", id), Some(json!({ "notes": "edited" }))).await;
    assert_eq!(status, StatusCode::OK, "{edited}");
    assert_eq!(edited["data"]["notes"], "edited");
    assert_eq!(edited["data"]["adoption_date"], "2020-01-15");
    assert_eq!(edited["data"]["pet_id"], json!(pid));

    let (status, _) = call(
        &pool,
        "PUT",
        &format!("/api/adoptions/{}", id),
        Some(json!({ "petId": other_pet, "notes": "moved" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, redated) = call(
        &pool,
        "PUT",
        &format!("/api/adoptions/{}", id),
        Some(json!({ "adopterId": aid, "adoptionDate": "2021-06-30" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(redated["data"]["adoption_date"], "2021-06-30");
    assert_eq!(redated["data"]["notes"], "edited");
}

#[tokio::test]
async fn pet_image_upload_sets_image_url() {
    let Some(pool) = pool().await else { return };
    let sid = shelter(&pool).await;
    let pid = pet(&pool, sid, "available").await;

    let multipart = |uri: String| {
        let boundary = "PETIMAGE";
        let payload = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"rex.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\nJPEGBYTES\r\n--{b}--\r\n",
            b = boundary
        );
        Request::post(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(payload))
            .unwrap()
    };

    let res = router(&pool).oneshot(multipart(format!("/api/pets/{}/image", pid))).await.unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::OK);
    let url = body["data"]["image_url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/") && url.ends_with("rex.jpg"));

    let stored: Option<String> = sqlx::query_scalar("SELECT image_url FROM pets WHERE id = $1")
        .bind(pid)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored.as_deref(), Some(url));

    let res = router(&pool).oneshot(multipart(format!("/api/pets/{}/image", i32::MAX))).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shelter_stats_count_pets_by_status() {
    let Some(pool) = pool().await else { return };
    let catalog = Catalog::standard();
    let sid = shelter(&pool).await;
    pet(&pool, sid, "available").await;
    pet(&pool, sid, "pending").await;
    let adopted = pet(&pool, sid, "available").await;
    let aid = adopter(&pool).await;
    adoptions::adopt(&pool, catalog.entity(Resource::Adoptions), request(aid, adopted)).await.unwrap();

    let (status, body) = call(&pool, "GET", &format!("/api/shelters/{}/stats", sid), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["total_pets"], 3);
    assert_eq!(stats["available"], 1);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["adopted"], 1);
    assert_eq!(stats["adoptions"], 1);

    let (status, _) = call(&pool, "GET", &format!("/api/shelters/{}/stats", i32::MAX), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn console_route_runs_statements_with_a_valid_token() {
    let Some(pool) = pool().await else { return };
    let sid = shelter(&pool).await;
    for age in [2, 3] {
        sqlx::query("INSERT INTO pets (name, species, age, shelter_id) VALUES ('Pip', 'cat', $1, $2)")
            .bind(age)
            .bind(sid)
            .execute(&pool)
            .await
            .unwrap();
    }

    let sql = format!("SELECT avg(age) AS avg_age, count(*) AS n FROM pets WHERE shelter_id = {}", sid);
    let (status, body) = call(&pool, "POST", "/api/query", Some(json!({ "query": sql }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["kind"], "rows");
    assert_eq!(body["data"]["results"][0]["avg_age"], json!(2.5));
    assert_eq!(body["data"]["results"][0]["n"], 2);

    let sql = format!("UPDATE pets SET gender = 'f' WHERE shelter_id = {}", sid);
    let (status, body) = call(&pool, "POST", "/api/query", Some(json!({ "query": sql }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "affected");
    assert_eq!(body["data"]["affected_rows"], 2);
}
