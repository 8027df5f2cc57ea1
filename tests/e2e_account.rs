//! E2E tests for account endpoints

mod common;

use common::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn test_register_returns_user_without_password() {
    let server = TestServer::new().await;

    let user = server.register("alice", "password123").await;

    assert_eq!(user["username"], "alice");
    assert!(user["id"].is_string());
    assert_eq!(user["following"], json!([]));
    assert_eq!(user["followers_count"], 0);
    assert_eq!(user["following_count"], 0);
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_validation_errors() {
    let server = TestServer::new().await;
    server.register("alice", "password123").await;

    for body in [
        json!({ "username": "alice", "password": "password456" }),
        json!({ "username": "bob", "password": "short" }),
        json!({ "username": "   ", "password": "password123" }),
        json!({ "username": "bad name", "password": "password123" }),
        json!({ "password": "password123" }),
    ] {
        let response = server
            .client
            .post(server.url("/api/accounts/register"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "body: {body}");
        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string());
    }
}

#[tokio::test]
async fn test_login_success_and_token_reuse() {
    let server = TestServer::new().await;
    let user = server.register("alice", "password123").await;

    let response = server
        .client
        .post(server.url("/api/accounts/login"))
        .json(&json!({ "username": "alice", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user_id"], user["id"]);
    assert_eq!(body["token"].as_str().unwrap().len(), 40);

    let second = server.login("alice", "password123").await;
    assert_eq!(body["token"].as_str().unwrap(), second);
}

#[tokio::test]
async fn test_login_failures_use_login_envelope() {
    let server = TestServer::new().await;
    server.register("alice", "password123").await;

    let response = server
        .client
        .post(server.url("/api/accounts/login"))
        .json(&json!({ "username": "alice", "password": "wrongpassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Wrong credentials.");
    assert_eq!(body["success"], false);
    assert_eq!(body["errorcode"], 400);
    assert!(body["errors"]["non_field_errors"].is_array());

    let response = server
        .client
        .post(server.url("/api/accounts/login"))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"]["password"], json!(["This field is required."]));
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;

    let response = server
        .client
        .post(server.url("/api/accounts/logout"))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url("/api/accounts/users"))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let fresh = server.login("alice", "password123").await;
    assert_ne!(fresh, alice.token);
}

#[tokio::test]
async fn test_user_endpoints_require_authentication() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;

    let response = server
        .client
        .get(server.url("/api/accounts/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .get(server.url(&format!("/api/accounts/users/{}", alice.id)))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .get(server.url(&format!("/api/accounts/users/{}", alice.id)))
        .header("Authorization", format!("Token {}", alice.token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_list_users_with_search() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    server.register("bob", "password123").await;
    server.register("alicia", "password123").await;

    let response = server
        .client
        .get(server.url("/api/accounts/users?search=ali"))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["count"], 2);
    assert!(page["next"].is_null());
    assert!(page["previous"].is_null());
    assert_eq!(page["results"][0]["username"], "alice");
    assert_eq!(page["results"][1]["username"], "alicia");
}

#[tokio::test]
async fn test_follow_and_unfollow() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;

    // Self-follow
    let response = server.follow(&alice, &alice).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "You cannot follow yourself.");

    // First follow
    let response = server.follow(&alice, &bob).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "You are now following bob");

    // Second follow
    let response = server.follow(&alice, &bob).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "You are already following this user.");

    let response = server
        .client
        .get(server.url(&format!("/api/accounts/users/{}", alice.id)))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["following"], json!([bob.id.clone()]));
    assert_eq!(profile["following_count"], 1);

    let response = server
        .client
        .get(server.url(&format!("/api/accounts/users/{}", bob.id)))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["followers_count"], 1);

    // Unfollow twice
    let unfollow_url = server.url(&format!("/api/accounts/users/{}/unfollow", bob.id));
    let response = server
        .client
        .post(&unfollow_url)
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "You have unfollowed bob");

    let response = server
        .client
        .post(&unfollow_url)
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Missing target
    let response = server
        .client
        .post(server.url("/api/accounts/users/missing/follow"))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_update_user_is_self_only() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    let alice_url = server.url(&format!("/api/accounts/users/{}", alice.id));

    let response = server
        .client
        .patch(&alice_url)
        .bearer_auth(&bob.token)
        .json(&json!({ "username": "mallory" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .patch(&alice_url)
        .bearer_auth(&alice.token)
        .json(&json!({ "username": "alice2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice2");

    // PUT needs every field
    let response = server
        .client
        .put(&alice_url)
        .bearer_auth(&alice.token)
        .json(&json!({ "username": "alice3" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .put(&alice_url)
        .bearer_auth(&alice.token)
        .json(&json!({ "username": "alice3", "password": "anotherpassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    server.login("alice3", "anotherpassword").await;
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;

    let post = server.create_post(&alice, "Hello", "From alice").await;
    let post_id = post["id"].as_str().unwrap();
    let bob_post = server.create_post(&bob, "Hi", "From bob").await;
    let bob_post_id = bob_post["id"].as_str().unwrap();

    // Alice likes and comments on bob's post, and follows bob
    server
        .client
        .post(server.url(&format!("/api/posts/{bob_post_id}/like")))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    server
        .client
        .post(server.url("/api/comments"))
        .bearer_auth(&alice.token)
        .json(&json!({ "post": bob_post_id, "content": "nice" }))
        .send()
        .await
        .unwrap();
    server.follow(&alice, &bob).await;

    let alice_url = server.url(&format!("/api/accounts/users/{}", alice.id));
    let response = server
        .client
        .delete(&alice_url)
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .delete(&alice_url)
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // Alice's post is gone
    let response = server
        .client
        .get(server.url(&format!("/api/posts/{post_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Her like and comment are gone
    let response = server
        .client
        .get(server.url(&format!("/api/posts/{bob_post_id}")))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likes_count"], 0);
    assert_eq!(body["comments_count"], 0);

    // The follow edge is gone
    let response = server
        .client
        .get(server.url(&format!("/api/accounts/users/{}", bob.id)))
        .bearer_auth(&bob.token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["followers_count"], 0);

    // Her token no longer authenticates
    let response = server
        .client
        .get(server.url("/api/accounts/users"))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
