//! Signup, session issuance and guard behavior.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::common::{create_user, TestClient, TestHarness};
use server_core::domains::users::Role;

#[tokio::test]
async fn signup_creates_a_student_account() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let tag = Uuid::new_v4();
    let (status, body) = client
        .post(
            "/signup",
            None,
            json!({
                "firebase_uid": format!("uid-{}", tag),
                "email": format!("student-{}@example.test", tag),
                "name": "Rafi",
                "role": "student"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "student");
    assert_eq!(body["name"], "Rafi");
}

#[tokio::test]
async fn signup_rejects_the_admin_role() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let tag = Uuid::new_v4();
    let (status, _) = client
        .post(
            "/signup",
            None,
            json!({
                "firebase_uid": format!("uid-{}", tag),
                "email": format!("sneaky-{}@example.test", tag),
                "name": "Sneaky",
                "role": "admin"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let email = format!("dup-{}@example.test", Uuid::new_v4());
    let body = |uid: &str| {
        json!({
            "firebase_uid": uid,
            "email": email,
            "name": "Dup",
            "role": "teacher"
        })
    };

    let (first, _) = client
        .post("/signup", None, body(&format!("uid-{}", Uuid::new_v4())))
        .await;
    assert_eq!(first, StatusCode::CREATED);

    let (second, _) = client
        .post("/signup", None, body(&format!("uid-{}", Uuid::new_v4())))
        .await;
    assert_eq!(second, StatusCode::CONFLICT);
}

#[tokio::test]
async fn token_exchange_issues_a_working_session() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let user = create_user(&harness.db_pool, Role::Teacher).await;
    harness.verifier.add_identity("fb-token", &user.firebase_uid);

    let (status, body) = client
        .post("/auth/token", None, json!({ "id_token": "fb-token" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], json!(user.id));

    // The minted session works against a protected endpoint.
    let session = body["token"].as_str().unwrap().to_string();
    let (me_status, me) = client.get("/users/me", Some(&session)).await;
    assert_eq!(me_status, StatusCode::OK);
    assert_eq!(me["id"], json!(user.id));

    // The verifier saw exactly the credential we sent.
    assert_eq!(harness.verifier.calls(), vec!["fb-token".to_string()]);
}

#[tokio::test]
async fn token_exchange_requires_a_credential() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let (status, _) = client.post("/auth/token", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .post("/auth/token", None, json!({ "id_token": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_credential_is_unauthorized() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let (status, _) = client
        .post("/auth/token", None, json!({ "id_token": "unknown" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_without_registration_is_not_found() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    harness.verifier.add_identity("orphan-token", "uid-without-profile");

    let (status, _) = client
        .post("/auth/token", None, json!({ "id_token": "orphan-token" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_token_and_bad_token_are_distinct_failures() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    // No credential at all: 401.
    let (status, _) = client.get("/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A malformed credential: 403.
    let (status, _) = client.get("/users/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn a_session_for_a_deleted_account_finds_no_profile() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    // A validly signed session whose user row no longer exists.
    let stale = harness.token_for_raw(Uuid::new_v4(), Role::Student);

    let (status, _) = client.get("/users/me", Some(&stale)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_endpoints_require_the_admin_role() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let student = create_user(&harness.db_pool, Role::Student).await;
    let admin = create_user(&harness.db_pool, Role::Admin).await;

    let (status, _) = client
        .get("/users", Some(&harness.token_for(&student)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = client.get("/users", Some(&harness.token_for(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn admin_can_change_a_role_and_delete_an_account() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let admin = create_user(&harness.db_pool, Role::Admin).await;
    let user = create_user(&harness.db_pool, Role::Student).await;
    let admin_token = harness.token_for(&admin);

    let (status, body) = client
        .patch(
            &format!("/admin/users/{}", user.id),
            Some(&admin_token),
            json!({ "role": "teacher" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "teacher");

    let (status, body) = client
        .delete(&format!("/admin/users/{}", user.id), Some(&admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    // Deleting again reports not found rather than silence.
    let (status, _) = client
        .delete(&format!("/admin/users/{}", user.id), Some(&admin_token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_manages_their_own_profile() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let user = create_user(&harness.db_pool, Role::Teacher).await;
    let token = harness.token_for(&user);

    let (status, body) = client
        .patch(
            "/users/me",
            Some(&token),
            json!({ "bio": "Ten years of tutoring", "location": "Sylhet" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "Ten years of tutoring");
    assert_eq!(body["location"], "Sylhet");
    // Untouched fields survive the partial update.
    assert_eq!(body["name"], json!(user.name));

    let (status, body) = client.delete("/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _) = client.get("/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_tutor_directory_redacts_contact_details() {
    let harness = TestHarness::new().await.unwrap();
    let client = TestClient::new(harness.app.clone());

    let teacher = create_user(&harness.db_pool, Role::Teacher).await;

    let (status, body) = client.get("/tutors/public", None).await;
    assert_eq!(status, StatusCode::OK);

    let entry = body
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == json!(teacher.id))
        .expect("teacher should be listed")
        .clone();
    assert_eq!(entry["name"], json!(teacher.name));
    assert!(entry.get("email").is_none());
    assert!(entry.get("phone").is_none());
}
