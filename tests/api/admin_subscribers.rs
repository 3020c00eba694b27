use crate::helpers::{random_email, spawn_app, submission};
use subscriber_api::utils::ResponseErrorMessage;

#[tokio::test]
async fn listing_subscribers_requires_credentials() {
    // Arrange
    let app = spawn_app().await;
    let test_cases = vec![
        (None, "no credentials"),
        (Some(("admin", "wrong-password")), "a wrong password"),
        (Some(("someone-else", "change-me-admin-password")), "a wrong username"),
    ];

    for (credentials, description) in test_cases {
        // Act
        let response = app.get_admin_subscribers(credentials).await;

        // Assert
        assert_eq!(
            response.status().as_u16(),
            401,
            "The admin listing was not rejected with {}.",
            description
        );
        assert_eq!(
            response.headers()["WWW-Authenticate"],
            r#"Basic realm="restricted", charset="UTF-8""#
        );
        let error: ResponseErrorMessage = response.json().await.unwrap();
        assert_eq!(error.error, "Unauthorized");
    }
}

#[tokio::test]
async fn a_malformed_authorization_header_is_rejected() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .api_client
        .get(&format!("{}/api/v1/admin/subscribers", &app.address))
        .header("Authorization", "Basic not-base64!")
        .send()
        .await
        .expect("Failed to execute request.");

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn an_empty_listing_has_a_zero_count() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get_admin_subscribers_as_admin().await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"subscribers": [], "count": 0}));
}

#[tokio::test]
async fn admins_see_every_subscriber_newest_first_with_raw_details() {
    // Arrange
    let app = spawn_app().await;
    let emails = vec![random_email(), random_email(), random_email()];
    for email in &emails {
        let response = app
            .api_client
            .post(&format!("{}/api/v1/subscribe", &app.address))
            .header("User-Agent", "admin-listing-test")
            .json(&submission(email))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status().as_u16(), 201);
    }

    // Act
    let response = app.get_admin_subscribers_as_admin().await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let subscribers = body["subscribers"].as_array().unwrap();
    assert_eq!(body["count"], 3);
    assert_eq!(subscribers.len(), 3);

    let listed: Vec<&str> = subscribers
        .iter()
        .map(|s| s["email"].as_str().unwrap())
        .collect();
    let newest_first: Vec<&str> = emails.iter().rev().map(String::as_str).collect();
    assert_eq!(listed, newest_first);

    for subscriber in subscribers {
        assert_eq!(subscriber["user_agent"], "admin-listing-test");
        assert_eq!(subscriber["ip_address"], "127.0.0.1");
        assert_eq!(subscriber["is_verified"], false);
        assert!(subscriber["email_hash"].is_string());
        assert!(subscriber["challenge_id"].is_string());
        assert!(subscriber["created_at"].is_string());
    }
}

#[tokio::test]
async fn the_admin_listing_fails_if_there_is_a_fatal_database_error() {
    // Arrange
    let app = spawn_app().await;

    // Sabotage the database
    sqlx::query("DROP TABLE subscribers;")
        .execute(&app.db_pool)
        .await
        .unwrap();

    // Act
    let response = app.get_admin_subscribers_as_admin().await;

    // Assert
    assert_eq!(response.status().as_u16(), 500);
}
