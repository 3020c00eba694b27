use crate::helpers::{random_email, spawn_app, submission};
use subscriber_api::utils::ResponseErrorMessage;

#[tokio::test]
async fn the_sixty_first_request_in_a_window_is_rejected() {
    // Arrange
    let app = spawn_app().await;
    for attempt in 1..=60 {
        let response = app.get_ping().await;
        assert_eq!(
            response.status().as_u16(),
            200,
            "Request {} was rejected before the limit was reached.",
            attempt
        );
    }

    // Act
    let response = app.post_subscribe(&submission(&random_email())).await;

    // Assert
    assert_eq!(response.status().as_u16(), 429);
    assert_eq!(response.headers()["Retry-After"], "60");
    assert_eq!(response.headers()["X-Content-Type-Options"], "nosniff");
    let error: ResponseErrorMessage = response.json().await.unwrap();
    assert_eq!(error.error, "Rate limit exceeded");
    assert_eq!(app.subscriber_count().await, 0);
}

#[tokio::test]
async fn addresses_are_limited_independently() {
    // Arrange
    let app = spawn_app().await;
    for _ in 0..61 {
        app.get_ping().await;
    }

    // Act
    let response = app
        .api_client
        .get(&format!("{}/ping", &app.address))
        .header("X-Real-IP", "203.0.113.50")
        .send()
        .await
        .expect("Failed to execute request.");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.get_ping().await.status().as_u16(), 429);
}
