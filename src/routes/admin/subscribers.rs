use crate::models::{AdminSubscriberAPI, Subscriber};
use crate::utils::e500;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, get, web};
use anyhow::Context;
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Serialize, Debug)]
pub struct SubscriberListing {
    pub subscribers: Vec<AdminSubscriberAPI>,
    pub count: usize,
}

#[get("/subscribers")]
#[tracing::instrument(name = "Listing all subscribers", skip(pool))]
pub async fn get(pool: web::Data<SqlitePool>) -> Result<HttpResponse, actix_web::Error> {
    let subscribers: Vec<AdminSubscriberAPI> = Subscriber::get_all(&pool)
        .await
        .context("Failed to fetch subscribers.")
        .map_err(e500)?
        .into_iter()
        .map(AdminSubscriberAPI::from)
        .collect();

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .json(SubscriberListing {
            count: subscribers.len(),
            subscribers,
        }))
}
