use serde_json::{
    json,
    Value,
};
use uuid::Uuid;

use crate::helpers::{
    seed_user,
    spawn_app,
    wait_for_audit_entry,
};

#[actix_rt::test]
async fn requests_without_a_caller_header_are_unauthorized() {
    let test_app = spawn_app().await;

    let response = test_app.get_anonymous("/users").await;

    assert_eq!(401, response.status().as_u16());
}

#[actix_rt::test]
async fn an_unknown_caller_identity_is_unauthorized() {
    let test_app = spawn_app().await;

    let response = test_app.get("/users", Uuid::new_v4()).await;

    assert_eq!(401, response.status().as_u16());
}

#[actix_rt::test]
async fn a_regular_caller_lists_only_himself() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;
    seed_user(&test_app.pool, "Arthur", false, false, false).await;

    let response = test_app.get("/users", caller).await;

    assert_eq!(200, response.status().as_u16());
    let page: Value = response.json().await.expect("invalid json body");
    assert_eq!(1, page["total_items"].as_u64().unwrap());
    assert_eq!(caller.to_string(), page["items"][0]["id"].as_str().unwrap());
}

#[actix_rt::test]
async fn a_super_caller_lists_every_user() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;
    seed_user(&test_app.pool, "Ursula", false, false, false).await;
    seed_user(&test_app.pool, "Arthur", false, false, false).await;

    let response = test_app.get("/users", caller).await;

    assert_eq!(200, response.status().as_u16());
    let page: Value = response.json().await.expect("invalid json body");
    assert_eq!(3, page["total_items"].as_u64().unwrap());
}

#[actix_rt::test]
async fn a_pending_super_grant_behaves_like_a_regular_caller() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Almost Root", true, true, false).await;
    seed_user(&test_app.pool, "Ursula", false, false, false).await;

    let response = test_app.get("/users", caller).await;

    assert_eq!(200, response.status().as_u16());
    let page: Value = response.json().await.expect("invalid json body");
    assert_eq!(1, page["total_items"].as_u64().unwrap());
    assert_eq!(caller.to_string(), page["items"][0]["id"].as_str().unwrap());
}

#[actix_rt::test]
async fn user_responses_never_leak_the_password_hash() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;

    let page: Value = test_app
        .get("/users", caller)
        .await
        .json()
        .await
        .expect("invalid json body");

    assert!(page["items"][0].get("password_hash").is_none());
}

#[actix_rt::test]
async fn creating_a_user_is_forbidden_for_a_regular_caller() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;

    let body = json!({
        "name": "Arthur",
        "email": "arthur@example.com",
        "password": "a long password",
    });
    let response = test_app.post_json("/users", &body, caller).await;

    assert_eq!(403, response.status().as_u16());
}

#[actix_rt::test]
async fn a_super_caller_creates_a_user() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;

    let body = json!({
        "name": "Arthur",
        "email": "arthur@example.com",
        "password": "a long password",
    });
    let response = test_app.post_json("/users", &body, caller).await;

    assert_eq!(201, response.status().as_u16());
    let created: Value = response.json().await.expect("invalid json body");
    assert_eq!("Arthur", created["name"].as_str().unwrap());

    let (email, hash): (String, String) =
        sqlx::query_as("SELECT email, password_hash FROM users WHERE name = 'Arthur'")
            .fetch_one(&test_app.pool)
            .await
            .expect("created user is missing from the store");
    assert_eq!("arthur@example.com", email);
    assert!(hash.starts_with("$argon2"));
}

#[actix_rt::test]
async fn an_invalid_payload_reports_every_rejected_field() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;

    let body = json!({
        "name": "Arthur",
        "email": "not-an-email",
        "password": "short",
    });
    let response = test_app.post_json("/users", &body, caller).await;

    assert_eq!(422, response.status().as_u16());
    let errors: Value = response.json().await.expect("invalid json body");
    assert_eq!(2, errors["errors"].as_array().unwrap().len());
}

#[actix_rt::test]
async fn reading_a_missing_user_is_not_found_for_a_super_caller() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;

    let response = test_app.get(&format!("/users/{}", Uuid::new_v4()), caller).await;

    assert_eq!(404, response.status().as_u16());
}

#[actix_rt::test]
async fn a_regular_caller_reading_another_user_is_forbidden() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;
    let other = seed_user(&test_app.pool, "Arthur", false, false, false).await;

    let response = test_app.get(&format!("/users/{}", other), caller).await;
    assert_eq!(403, response.status().as_u16());

    // Identity equality is checked before any load here, so even a
    // non-existent id stays forbidden rather than not-found.
    let response = test_app
        .get(&format!("/users/{}", Uuid::new_v4()), caller)
        .await;
    assert_eq!(403, response.status().as_u16());
}

#[actix_rt::test]
async fn a_regular_caller_reads_himself() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;

    let response = test_app.get(&format!("/users/{}", caller), caller).await;

    assert_eq!(200, response.status().as_u16());
    let page: Value = response.json().await.expect("invalid json body");
    assert_eq!("Ursula", page["items"][0]["name"].as_str().unwrap());
}

#[actix_rt::test]
async fn a_pending_password_change_blocks_gated_actions() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, true).await;

    let body = json!({
        "name": "Ursula",
        "email": "ursula@example.com",
    });
    let response = test_app
        .put_json(&format!("/users/{}", caller), &body, caller)
        .await;

    assert_eq!(403, response.status().as_u16());
}

#[actix_rt::test]
async fn changing_the_password_lifts_the_forced_reset() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, true).await;

    let body = json!({ "password": "a brand new password" });
    let response = test_app
        .post_json(&format!("/users/{}/password", caller), &body, caller)
        .await;
    assert_eq!(200, response.status().as_u16());

    let pending: (bool,) = sqlx::query_as("SELECT pending_password FROM users WHERE id = $1")
        .bind(caller)
        .fetch_one(&test_app.pool)
        .await
        .expect("caller is missing from the store");
    assert!(!pending.0);

    // the previously blocked action now goes through
    let body = json!({
        "name": "Ursula K.",
        "email": "ursula@example.com",
    });
    let response = test_app
        .put_json(&format!("/users/{}", caller), &body, caller)
        .await;
    assert_eq!(200, response.status().as_u16());
}

#[actix_rt::test]
async fn a_regular_caller_cannot_self_assign_privileges() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;

    let body = json!({
        "name": "Ursula",
        "email": "ursula@example.com",
        "is_super": true,
    });
    let response = test_app
        .put_json(&format!("/users/{}", caller), &body, caller)
        .await;

    assert_eq!(403, response.status().as_u16());
}

#[actix_rt::test]
async fn editing_a_missing_user_is_not_found() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;

    let body = json!({
        "name": "Nobody",
        "email": "nobody@example.com",
    });
    let response = test_app
        .put_json(&format!("/users/{}", Uuid::new_v4()), &body, caller)
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[actix_rt::test]
async fn promotion_requires_super_authority() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;
    let other = seed_user(&test_app.pool, "Arthur", false, false, false).await;

    let response = test_app
        .post_empty(&format!("/users/{}/promote", other), caller)
        .await;

    assert_eq!(403, response.status().as_u16());
}

#[actix_rt::test]
async fn self_promotion_is_a_bad_request_even_for_a_super_caller() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;

    let response = test_app
        .post_empty(&format!("/users/{}/promote", caller), caller)
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[actix_rt::test]
async fn promoting_a_missing_user_is_not_found() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;

    let response = test_app
        .post_empty(&format!("/users/{}/promote", Uuid::new_v4()), caller)
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[actix_rt::test]
async fn a_promoted_grant_stays_pending_until_confirmed() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;
    let other = seed_user(&test_app.pool, "Arthur", false, false, false).await;

    let response = test_app
        .post_empty(&format!("/users/{}/promote", other), caller)
        .await;
    assert_eq!(200, response.status().as_u16());

    let flags: (bool, bool) =
        sqlx::query_as("SELECT is_super, pending_confirm FROM users WHERE id = $1")
            .bind(other)
            .fetch_one(&test_app.pool)
            .await
            .expect("promoted user is missing from the store");
    assert!(flags.0);
    assert!(flags.1);
}

#[actix_rt::test]
async fn a_super_caller_removes_a_user_and_the_audit_log_records_it() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;
    let other = seed_user(&test_app.pool, "Arthur", false, false, false).await;

    let response = test_app.delete(&format!("/users/{}", other), caller).await;
    assert_eq!(204, response.status().as_u16());

    let gone: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(other)
        .fetch_optional(&test_app.pool)
        .await
        .expect("error querying users");
    assert!(gone.is_none());

    let (entity, actor_id) = wait_for_audit_entry(&test_app.pool, "was removed").await;
    assert!(entity.contains(&other.to_string()));
    assert!(entity.contains("Arthur"));
    assert_eq!(caller, actor_id);
}

#[actix_rt::test]
async fn a_regular_caller_removes_himself() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;

    let response = test_app.delete(&format!("/users/{}", caller), caller).await;
    assert_eq!(204, response.status().as_u16());

    let gone: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(caller)
        .fetch_optional(&test_app.pool)
        .await
        .expect("error querying users");
    assert!(gone.is_none());
}

#[actix_rt::test]
async fn a_regular_caller_removing_another_user_is_forbidden() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Ursula", false, false, false).await;
    let other = seed_user(&test_app.pool, "Arthur", false, false, false).await;

    let response = test_app.delete(&format!("/users/{}", other), caller).await;
    assert_eq!(403, response.status().as_u16());

    let still_there: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(other)
        .fetch_optional(&test_app.pool)
        .await
        .expect("error querying users");
    assert!(still_there.is_some());
}

#[actix_rt::test]
async fn a_super_caller_deactivates_and_reactivates_a_user() {
    let test_app = spawn_app().await;
    let caller = seed_user(&test_app.pool, "Root", true, false, false).await;
    let other = seed_user(&test_app.pool, "Arthur", false, false, false).await;

    let response = test_app
        .post_empty(&format!("/users/{}/deactivate", other), caller)
        .await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("invalid json body");
    assert_eq!(false, body["active"].as_bool().unwrap());

    let response = test_app
        .post_empty(&format!("/users/{}/activate", other), caller)
        .await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("invalid json body");
    assert_eq!(true, body["active"].as_bool().unwrap());
}
