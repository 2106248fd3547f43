//! API integration tests
//!
//! These run against a live server with a seeded admin account
//! (admin/admin123). Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

/// Register a fresh user and return (token, user id)
async fn register_user(client: &Client) -> (String, i64) {
    let suffix = unique_suffix();
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": format!("reader{}", suffix),
            "email": format!("reader{}@example.org", suffix),
            "password": "secret-pass",
            "first_name": "Test",
            "last_name": "Reader"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse register response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let user_id = body["user"]["id"].as_i64().expect("No user id");
    (token, user_id)
}

/// Log in as the seeded admin and return a token
async fn admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin123"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Create a fresh available book as admin and return its id
async fn create_book(client: &Client, token: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Integration Test Book",
            "author": "Test Author",
            "isbn": format!("978-{}", unique_suffix()),
            "genre": "Testing"
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse book response");
    body["id"].as_i64().expect("No book id")
}

async fn get_book(client: &Client, book_id: i64) -> Value {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to fetch book");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse book")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_register_and_login() {
    let client = Client::new();
    let suffix = unique_suffix();
    let username = format!("reader{}", suffix);

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": &username,
            "email": format!("reader{}@example.org", suffix),
            "password": "secret-pass",
            "first_name": "Test",
            "last_name": "Reader"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": &username,
            "password": "secret-pass"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["username"].as_str(), Some(username.as_str()));
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/borrowings/my-books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_flow() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (token, _user_id) = register_user(&client).await;
    let book_id = create_book(&client, &admin).await;

    // Borrow flips the book unavailable
    let response = client
        .post(format!("{}/borrowings/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["borrowing"]["status"], "borrowed");
    assert!(body["borrowing"]["due_date"].is_string());
    let borrowing_id = body["borrowing"]["id"].as_i64().expect("No borrowing id");

    assert_eq!(get_book(&client, book_id).await["available"], false);

    // A second borrow of the same book fails and changes nothing
    let response = client
        .post(format!("{}/borrowings/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 409);
    assert_eq!(get_book(&client, book_id).await["available"], false);

    // Return restores availability and finalizes the loan
    let response = client
        .post(format!("{}/borrowings/return/{}", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["borrowing"]["status"], "returned");
    assert!(body["borrowing"]["returned_date"].is_string());

    assert_eq!(get_book(&client, book_id).await["available"], true);

    // A second return is rejected
    let response = client
        .post(format!("{}/borrowings/return/{}", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_borrow_unavailable_book_conflicts() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (first, _) = register_user(&client).await;
    let (second, _) = register_user(&client).await;
    let book_id = create_book(&client, &admin).await;

    let response = client
        .post(format!("{}/borrowings/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", first))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    // Someone else cannot borrow the same physical book
    let response = client
        .post(format!("{}/borrowings/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", second))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_borrow_unknown_book() {
    let client = Client::new();
    let (token, _) = register_user(&client).await;

    let response = client
        .post(format!("{}/borrowings/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": 999999999 }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_missing_body_fields_return_400() {
    let client = Client::new();
    let (token, _) = register_user(&client).await;

    // Borrow without a book_id
    let response = client
        .post(format!("{}/borrowings/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Expected a JSON error body");
    assert_eq!(body["error"], "validation_error");

    // Login without a password
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": "admin" }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Expected a JSON error body");
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_single_winner() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (first, _) = register_user(&client).await;
    let (second, _) = register_user(&client).await;
    let book_id = create_book(&client, &admin).await;

    let borrow = |token: String| {
        let client = client.clone();
        async move {
            client
                .post(format!("{}/borrowings/borrow", BASE_URL))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "book_id": book_id }))
                .send()
                .await
                .expect("Failed to send borrow request")
                .status()
                .as_u16()
        }
    };

    // Both requests race for the same book; the row lock must let exactly
    // one of them through.
    let (a, b) = tokio::join!(borrow(first), borrow(second));
    let mut statuses = [a, b];
    statuses.sort();
    assert_eq!(statuses, [201, 409]);

    assert_eq!(get_book(&client, book_id).await["available"], false);
}

#[tokio::test]
#[ignore]
async fn test_update_available_rejected_while_on_loan() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (token, _) = register_user(&client).await;
    let book_id = create_book(&client, &admin).await;

    let response = client
        .post(format!("{}/borrowings/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    // Forcing the flag back on while the loan is active is rejected
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "available": true }))
        .send()
        .await
        .expect("Failed to send update request");
    assert_eq!(response.status(), 409);
    assert_eq!(get_book(&client, book_id).await["available"], false);

    // Other fields stay editable during the loan
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "description": "Updated while on loan" }))
        .send()
        .await
        .expect("Failed to send update request");
    assert!(response.status().is_success());
    assert_eq!(get_book(&client, book_id).await["available"], false);
}

#[tokio::test]
#[ignore]
async fn test_get_borrowing_access_control() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (owner, _) = register_user(&client).await;
    let (stranger, _) = register_user(&client).await;
    let book_id = create_book(&client, &admin).await;

    let response = client
        .post(format!("{}/borrowings/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", owner))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let borrowing_id = body["borrowing"]["id"].as_i64().expect("No borrowing id");

    // Owner can read their loan
    let response = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", owner))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // A non-owning, non-admin user cannot
    let response = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", stranger))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    // Admin can
    let response = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_list_all_borrowings_requires_admin() {
    let client = Client::new();
    let (token, _) = register_user(&client).await;

    let response = client
        .get(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let admin = admin_token(&client).await;
    let response = client
        .get(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_my_books_lists_loans_newest_first() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (token, _) = register_user(&client).await;
    let first_book = create_book(&client, &admin).await;
    let second_book = create_book(&client, &admin).await;

    for book_id in [first_book, second_book] {
        let response = client
            .post(format!("{}/borrowings/borrow", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "book_id": book_id }))
            .send()
            .await
            .expect("Failed to send borrow request");
        assert_eq!(response.status(), 201);
    }

    let response = client
        .get(format!("{}/borrowings/my-books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let loans = body.as_array().expect("Expected an array");
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0]["book"]["id"].as_i64(), Some(second_book));
    assert_eq!(loans[1]["book"]["id"].as_i64(), Some(first_book));
}
