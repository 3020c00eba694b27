use crate::authentication::reject_unauthorized_admins;
use crate::configuration::{DatabaseSettings, Settings};
use crate::middleware::{cors, enforce_rate_limit, security_headers};
use crate::rate_limiter::RateLimiter;
use crate::routes::{admin, health_check, subscribe};
use actix_web::dev::Server;
use actix_web::middleware::from_fn;
use actix_web::web::Data;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use secrecy::Secret;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);
        sqlx::migrate!("./migrations")
            .run(&connection_pool)
            .await
            .context("Failed to migrate the database.")?;

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}.", address))?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);

        let server = run(listener, connection_pool, configuration)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> SqlitePool {
    SqlitePoolOptions::new().connect_lazy_with(configuration.connect_options())
}

fn run(
    listener: TcpListener,
    db_pool: SqlitePool,
    configuration: Settings,
) -> Result<Server, anyhow::Error> {
    let db_pool = Data::new(db_pool);
    let hmac_secret = Data::new(HmacSecret(configuration.application.hmac_secret));
    let admin_settings = Data::new(configuration.admin);
    let submission_settings = Data::new(configuration.submission);
    // One limiter shared by every worker for the lifetime of the server.
    let rate_limiter = Data::new(RateLimiter::new(
        configuration.rate_limit.max_requests,
        configuration.rate_limit.window(),
    ));
    let trusted_origins = configuration.cors.trusted_origins;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(from_fn(enforce_rate_limit))
            .wrap(cors(&trusted_origins))
            .wrap(TracingLogger::default())
            .wrap(security_headers())
            .service(health_check::get)
            .service(
                web::scope("/api/v1")
                    .service(subscribe::post)
                    .service(
                        web::scope("/admin")
                            .wrap(from_fn(reject_unauthorized_admins))
                            .service(admin::subscribers::get),
                    ),
            )
            .app_data(db_pool.clone())
            .app_data(hmac_secret.clone())
            .app_data(admin_settings.clone())
            .app_data(submission_settings.clone())
            .app_data(rate_limiter.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

#[derive(Clone)]
pub struct HmacSecret(pub Secret<String>);
