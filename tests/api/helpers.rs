use chrono::Utc;
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use secrecy::{ExposeSecret, Secret};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::LazyLock;
use subscriber_api::configuration::get_configuration;
use subscriber_api::domain::compute_signature;
use subscriber_api::startup::{Application, get_connection_pool};
use subscriber_api::telemetry::{get_subscriber, init_subscriber};
use uuid::Uuid;

// Ensure that the `tracing` stack is only initialised once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub struct TestAdmin {
    pub username: String,
    pub password: String,
}

pub struct TestApp {
    pub address: String,
    pub db_pool: SqlitePool,
    pub db_path: PathBuf,
    pub hmac_secret: Secret<String>,
    pub admin: TestAdmin,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_subscribe<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/api/v1/subscribe", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_subscribe_raw(&self, body: impl Into<reqwest::Body>) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/api/v1/subscribe", &self.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_admin_subscribers(&self, credentials: Option<(&str, &str)>) -> reqwest::Response {
        let request = self
            .api_client
            .get(&format!("{}/api/v1/admin/subscribers", &self.address));
        let request = match credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        };
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn get_admin_subscribers_as_admin(&self) -> reqwest::Response {
        self.get_admin_subscribers(Some((self.admin.username.as_str(), self.admin.password.as_str())))
            .await
    }

    pub async fn get_ping(&self) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/ping", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn subscriber_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count subscribers.")
    }

    /// A signed payload the server will accept as of now.
    pub fn signed_submission(&self, email: &str) -> serde_json::Value {
        let timestamp = Utc::now().timestamp();
        let nonce = Uuid::new_v4().to_string();
        let signature = compute_signature(email, &nonce, timestamp, &self.hmac_secret);
        serde_json::json!({
            "email": email,
            "clientToken": "token",
            "clientNonce": nonce,
            "browserData": "{\"screen\":\"1920x1080\"}",
            "timestamp": timestamp,
            "clientHMAC": signature,
        })
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

/// An unsigned payload with a fresh timestamp.
pub fn submission(email: &str) -> serde_json::Value {
    serde_json::json!({
        "email": email,
        "browserData": "{}",
        "timestamp": Utc::now().timestamp(),
    })
}

pub fn random_email() -> String {
    SafeEmail().fake()
}

pub async fn spawn_app() -> TestApp {
    LazyLock::force(&TRACING);

    // Randomise configuration to ensure test isolation
    let db_path = std::env::temp_dir().join(format!("subscriber_api_{}.db", Uuid::new_v4()));
    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // Use a different database file for each test case
        c.database.path = db_path.to_string_lossy().into_owned();
        c.database.create_if_missing = true;
        // Use a random OS port
        c.application.port = 0;
        c
    };

    // Migrations run as part of the build
    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application.");
    let application_port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{}", application_port),
        db_pool: get_connection_pool(&configuration.database),
        db_path,
        hmac_secret: configuration.application.hmac_secret.clone(),
        admin: TestAdmin {
            username: configuration.admin.username.clone(),
            password: configuration.admin.password.expose_secret().clone(),
        },
        api_client: client,
    }
}
