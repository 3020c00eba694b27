use actix_web::{HttpResponse, get};

#[get("/ping")]
pub async fn get() -> HttpResponse {
    HttpResponse::Ok().finish()
}
