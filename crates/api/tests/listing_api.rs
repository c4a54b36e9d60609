//! Integration tests for listings, moderation, media, plans and favorites.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, approve, body_json, create_listing, delete_auth, get, get_auth, listing_body,
    post_json_auth, put_json_auth, register_token,
};
use serde_json::json;
use sqlx::PgPool;
use velvet_core::listing::ModerationStatus;
use velvet_db::models::listing::CreateListing;
use velvet_db::models::user::CreateUser;
use velvet_db::repositories::{ListingRepo, UserRepo};

/// Insert `count` approved listings straight into the database.
async fn seed_approved(pool: &PgPool, count: usize) {
    for i in 0..count {
        let user = UserRepo::create(
            pool,
            &CreateUser {
                email: format!("seed{i}@example.com"),
                password_hash: "$argon2id$placeholder".to_string(),
                role: "model".to_string(),
                phone: None,
                verification_token: None,
            },
        )
        .await
        .unwrap();
        let input = CreateListing {
            name: format!("Seed {i}"),
            age: 25,
            city: "moscow".to_string(),
            height: None,
            weight: None,
            bust_size: None,
            eye_color: None,
            hair_color: None,
            nationality: None,
            body_type: None,
            clothing_size: None,
            description: None,
            price: 5000,
            services: vec!["Massage".to_string()],
            phone: None,
        };
        let listing = ListingRepo::create(pool, user.id, &input).await.unwrap();
        ListingRepo::set_status(pool, listing.id, ModerationStatus::Approved)
            .await
            .unwrap();
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_model_creates_pending_listing(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (user_id, token) = register_token(app.clone(), "anna@example.com", "model").await;

    let json = create_listing(app, &token, listing_body(" Anna ", "moscow", 5000)).await;
    assert_eq!(json["name"], "Anna");
    assert_eq!(json["userId"], user_id);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["paymentPlan"], "none");
    assert_eq!(json["version"], 1);
    assert_eq!(json["reviewCount"], 0);
    assert_eq!(json["media"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_cannot_create_listing(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_token(app.clone(), "client@example.com", "client").await;

    let response = post_json_auth(
        app,
        "/api/v1/listings",
        listing_body("Anna", "moscow", 5000),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_listing_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_token(app.clone(), "anna@example.com", "model").await;
    create_listing(app.clone(), &token, listing_body("Anna", "moscow", 5000)).await;

    let response = post_json_auth(
        app,
        "/api/v1/listings",
        listing_body("Anna Two", "spb", 6000),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_listing_reports_fields(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_token(app.clone(), "anna@example.com", "model").await;

    let mut body = listing_body("Anna 2", "paris", 10);
    body["age"] = json!(17);
    let response = post_json_auth(app, "/api/v1/listings", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["age", "city", "name", "price"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pending_listing_hidden_until_approved(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, token) = register_token(app.clone(), "anna@example.com", "model").await;
    let id = create_listing(app.clone(), &token, listing_body("Anna", "moscow", 5000)).await["id"]
        .as_i64()
        .unwrap();

    let response = get(app.clone(), &format!("/api/v1/listings/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let page = body_json(get(app.clone(), "/api/v1/listings").await).await;
    assert_eq!(page["pagination"]["totalCount"], 0);

    // The owner still sees it.
    let response = get_auth(app.clone(), "/api/v1/me/listing", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "pending");

    let admin = admin_token(&pool, app.clone()).await;
    let queue = body_json(get_auth(app.clone(), "/api/v1/admin/listings", &admin).await).await;
    assert_eq!(queue["listings"][0]["id"], id);

    approve(app.clone(), &admin, id).await;

    let response = get(app.clone(), &format!("/api/v1/listings/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(get(app, "/api/v1/listings").await).await;
    assert_eq!(page["pagination"]["totalCount"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_moderation_requires_admin(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_token(app.clone(), "anna@example.com", "model").await;
    let id = create_listing(app.clone(), &token, listing_body("Anna", "moscow", 5000)).await["id"]
        .as_i64()
        .unwrap();

    let response = get_auth(app.clone(), "/api/v1/admin/listings", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        app,
        &format!("/api/v1/admin/listings/{id}/status"),
        json!({ "status": "approved" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_moderation_status_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, token) = register_token(app.clone(), "anna@example.com", "model").await;
    let id = create_listing(app.clone(), &token, listing_body("Anna", "moscow", 5000)).await["id"]
        .as_i64()
        .unwrap();
    let admin = admin_token(&pool, app.clone()).await;

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/admin/listings/{id}/status"),
        json!({ "status": "published" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get_auth(app, "/api/v1/admin/listings?status=bogus", &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_filters_and_paginates(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let admin = admin_token(&pool, app.clone()).await;

    let seeds = [
        ("anna@example.com", "Anna", "moscow", 5000),
        ("bella@example.com", "Bella", "spb", 8000),
        ("clara@example.com", "Clara", "moscow", 12000),
    ];
    for (email, name, city, price) in seeds {
        let (_, token) = register_token(app.clone(), email, "model").await;
        let id = create_listing(app.clone(), &token, listing_body(name, city, price)).await["id"]
            .as_i64()
            .unwrap();
        approve(app.clone(), &admin, id).await;
    }

    let page = body_json(get(app.clone(), "/api/v1/listings?city=moscow").await).await;
    let names: Vec<&str> = page["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Anna") && names.contains(&"Clara"));

    let page = body_json(get(app.clone(), "/api/v1/listings?minPrice=6000&maxPrice=9000").await).await;
    assert_eq!(page["pagination"]["totalCount"], 1);
    assert_eq!(page["listings"][0]["name"], "Bella");

    let page = body_json(get(app.clone(), "/api/v1/listings?keyword=CLA").await).await;
    assert_eq!(page["listings"][0]["name"], "Clara");

    // Malformed numbers are ignored rather than rejected.
    let response = get(app.clone(), "/api/v1/listings?minPrice=lots&page=x").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["pagination"]["totalCount"], 3);
    assert_eq!(page["pagination"]["page"], 1);

    let page = body_json(get(app, "/api/v1/listings?limit=2&page=2").await).await;
    assert_eq!(page["listings"].as_array().unwrap().len(), 1);
    assert_eq!(page["pagination"]["totalPages"], 2);
    assert_eq!(page["pagination"]["hasMore"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_checks_version_and_resets_status(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, token) = register_token(app.clone(), "anna@example.com", "model").await;
    let id = create_listing(app.clone(), &token, listing_body("Anna", "moscow", 5000)).await["id"]
        .as_i64()
        .unwrap();
    let admin = admin_token(&pool, app.clone()).await;
    approve(app.clone(), &admin, id).await;

    let uri = format!("/api/v1/listings/{id}");
    let response = put_json_auth(app.clone(), &uri, json!({ "version": 1, "price": 7000 }), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["price"], 7000);
    assert_eq!(json["version"], 2);
    assert_eq!(json["status"], "pending");

    let response = put_json_auth(app.clone(), &uri, json!({ "version": 1, "price": 9000 }), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Someone else's listing.
    let (_, other) = register_token(app.clone(), "other@example.com", "model").await;
    let response = put_json_auth(app, &uri, json!({ "version": 2, "price": 9000 }), &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_media_plan_and_delete(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_token(app.clone(), "anna@example.com", "model").await;
    let id = create_listing(app.clone(), &token, listing_body("Anna", "moscow", 5000)).await["id"]
        .as_i64()
        .unwrap();

    let media_uri = format!("/api/v1/listings/{id}/media");
    let first = body_json(
        post_json_auth(
            app.clone(),
            &media_uri,
            json!({ "kind": "image", "url": "https://cdn.example.com/a.jpg" }),
            &token,
        )
        .await,
    )
    .await;
    let second = body_json(
        post_json_auth(
            app.clone(),
            &media_uri,
            json!({ "kind": "video", "url": "https://cdn.example.com/b.mp4" }),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(first["position"], 0);
    assert_eq!(second["position"], 1);

    let response = post_json_auth(
        app.clone(),
        &media_uri,
        json!({ "kind": "audio", "url": "https://cdn.example.com/c.mp3" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mine = body_json(get_auth(app.clone(), "/api/v1/me/listing", &token).await).await;
    assert_eq!(mine["media"].as_array().unwrap().len(), 2);

    let media_id = first["id"].as_i64().unwrap();
    let response = delete_auth(app.clone(), &format!("{media_uri}/{media_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app.clone(), &format!("{media_uri}/{media_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let plan_uri = format!("/api/v1/listings/{id}/plan");
    let response = put_json_auth(app.clone(), &plan_uri, json!({ "plan": "VIP" }), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["paymentPlan"], "vip");
    let response = put_json_auth(app.clone(), &plan_uri, json!({ "plan": "gold" }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = delete_auth(app.clone(), &format!("/api/v1/listings/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get_auth(app, "/api/v1/me/listing", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_favorites_are_idempotent(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, model) = register_token(app.clone(), "anna@example.com", "model").await;
    let id = create_listing(app.clone(), &model, listing_body("Anna", "moscow", 5000)).await["id"]
        .as_i64()
        .unwrap();
    let admin = admin_token(&pool, app.clone()).await;
    let (_, client) = register_token(app.clone(), "client@example.com", "client").await;

    // Pending listings cannot be saved.
    let uri = format!("/api/v1/listings/{id}/favorite");
    let response = common::post_auth(app.clone(), &uri, &client).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    approve(app.clone(), &admin, id).await;
    for _ in 0..2 {
        let response = common::post_auth(app.clone(), &uri, &client).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let saved = body_json(get_auth(app.clone(), "/api/v1/me/favorites", &client).await).await;
    assert_eq!(saved["data"].as_array().unwrap().len(), 1);
    assert_eq!(saved["data"][0]["id"], id);

    for _ in 0..2 {
        let response = delete_auth(app.clone(), &uri, &client).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
    let saved = body_json(get_auth(app, "/api/v1/me/favorites", &client).await).await;
    assert_eq!(saved["data"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_twenty_five_listings_paginate(pool: PgPool) {
    seed_approved(&pool, 25).await;
    let app = common::build_test_app(pool);

    let first = body_json(get(app.clone(), "/api/v1/listings").await).await;
    assert_eq!(first["listings"].as_array().unwrap().len(), 20);
    assert_eq!(first["pagination"]["limit"], 20);
    assert_eq!(first["pagination"]["totalCount"], 25);
    assert_eq!(first["pagination"]["totalPages"], 2);
    assert_eq!(first["pagination"]["hasMore"], true);

    let second = body_json(get(app.clone(), "/api/v1/listings?page=2").await).await;
    assert_eq!(second["listings"].as_array().unwrap().len(), 5);
    assert_eq!(second["pagination"]["hasMore"], false);

    let beyond = body_json(get(app.clone(), "/api/v1/listings?page=3").await).await;
    assert!(beyond["listings"].as_array().unwrap().is_empty());
    assert_eq!(beyond["pagination"]["totalCount"], 25);

    let mut ids: Vec<i64> = first["listings"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second["listings"].as_array().unwrap())
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 25);

    let tens = body_json(get(app, "/api/v1/listings?limit=10&page=3").await).await;
    assert_eq!(tens["listings"].as_array().unwrap().len(), 5);
    assert_eq!(tens["pagination"]["totalPages"], 3);
    assert_eq!(tens["pagination"]["hasMore"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_viewing_a_listing_counts_once(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let admin = admin_token(&pool, app.clone()).await;
    let (_, token) = register_token(app.clone(), "anna@example.com", "model").await;
    let id = create_listing(app.clone(), &token, listing_body("Anna", "moscow", 5000)).await["id"]
        .as_i64()
        .unwrap();
    approve(app.clone(), &admin, id).await;

    let response = get(app.clone(), &format!("/api/v1/listings/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The counter is bumped off the request path.
    let mut views = 0;
    for _ in 0..50 {
        let mine = body_json(get_auth(app.clone(), "/api/v1/me/listing", &token).await).await;
        views = mine["views"].as_i64().unwrap();
        if views > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(views, 1);

    // Owner reads of their own listing do not count.
    let mine = body_json(get_auth(app, "/api/v1/me/listing", &token).await).await;
    assert_eq!(mine["views"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_my_listing_reports_rank_once_approved(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let admin = admin_token(&pool, app.clone()).await;

    let (_, anna) = register_token(app.clone(), "anna@example.com", "model").await;
    let anna_id = create_listing(app.clone(), &anna, listing_body("Anna", "moscow", 5000)).await
        ["id"]
        .as_i64()
        .unwrap();
    let mine = body_json(get_auth(app.clone(), "/api/v1/me/listing", &anna).await).await;
    assert!(mine["rank"].is_null());
    assert!(mine["media"].is_array());

    let (_, bella) = register_token(app.clone(), "bella@example.com", "model").await;
    let bella_id = create_listing(app.clone(), &bella, listing_body("Bella", "spb", 8000)).await
        ["id"]
        .as_i64()
        .unwrap();
    approve(app.clone(), &admin, anna_id).await;
    approve(app.clone(), &admin, bella_id).await;

    let (_, client) = register_token(app.clone(), "client@example.com", "client").await;
    let review = json!({ "rating": 5, "text": "A truly lovely evening" });
    let uri = format!("/api/v1/listings/{anna_id}/reviews");
    let response = post_json_auth(app.clone(), &uri, review, &client).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mine = body_json(get_auth(app.clone(), "/api/v1/me/listing", &anna).await).await;
    assert_eq!(mine["rank"], 1);
    let theirs = body_json(get_auth(app, "/api/v1/me/listing", &bella).await).await;
    assert_eq!(theirs["rank"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_service_tags_list_approved_offerings(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let admin = admin_token(&pool, app.clone()).await;

    let response = get(app.clone(), "/api/v1/listings/services").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));

    let mut bodies = [
        ("anna@example.com", listing_body("Anna", "moscow", 5000), true),
        ("bella@example.com", listing_body("Bella", "spb", 8000), true),
        ("clara@example.com", listing_body("Clara", "sochi", 9000), false),
    ];
    bodies[1].1["services"] = json!(["massage", "Aromatherapy"]);
    bodies[2].1["services"] = json!(["Secret"]);
    for (email, body, publish) in bodies {
        let (_, token) = register_token(app.clone(), email, "model").await;
        let id = create_listing(app.clone(), &token, body).await["id"]
            .as_i64()
            .unwrap();
        if publish {
            approve(app.clone(), &admin, id).await;
        }
    }

    let json = body_json(get(app, "/api/v1/listings/services").await).await;
    assert_eq!(json["data"], json!(["Aromatherapy", "Dinner", "Massage"]));
}
