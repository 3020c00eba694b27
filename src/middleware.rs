use crate::rate_limiter::{RateLimitDecision, RateLimiter};
use crate::utils::{ResponseErrorMessage, e500};
use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderName};
use actix_web::middleware::{DefaultHeaders, Next};
use actix_web::{HttpRequest, HttpResponse, web};

const DEFAULT_TRUSTED_ORIGINS: [&str; 3] = [
    "https://aynshteyn.dev",
    "http://localhost:3000",
    "http://127.0.0.1:3000",
];

pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "deny"))
        .add((header::X_XSS_PROTECTION, "1; mode=block"))
        .add((header::REFERRER_POLICY, "same-origin"))
        .add((
            header::CONTENT_SECURITY_POLICY,
            "default-src 'self'; frame-ancestors 'none'",
        ))
}

/// Falls back to the production site and local dev servers when no
/// origin is configured.
pub fn cors(trusted_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers(vec![header::LINK])
        .supports_credentials()
        .block_on_origin_mismatch(false)
        .max_age(300);

    if trusted_origins.is_empty() {
        DEFAULT_TRUSTED_ORIGINS
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    } else {
        trusted_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn peer_ip(req: &HttpRequest) -> Option<String> {
    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// Address the rate limiter counts against: `X-Real-IP` set by the
/// reverse proxy, else the transport peer.
pub fn rate_limit_key(req: &HttpRequest) -> String {
    header_value(req, "x-real-ip")
        .map(str::to_string)
        .or_else(|| peer_ip(req))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Address recorded with a submission: the client entry of
/// `X-Forwarded-For`, else the transport peer.
pub fn originating_address(req: &HttpRequest) -> String {
    header_value(req, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(|client| client.trim().to_string())
        .filter(|client| !client.is_empty())
        .or_else(|| peer_ip(req))
        .unwrap_or_default()
}

pub async fn enforce_rate_limit(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let limiter = req
        .app_data::<web::Data<RateLimiter>>()
        .cloned()
        .ok_or_else(|| e500("Rate limiter is not configured."))?;

    match limiter.check(&rate_limit_key(req.request())) {
        RateLimitDecision::Allowed => next.call(req).await.map(ServiceResponse::map_into_left_body),
        RateLimitDecision::Limited { retry_after } => {
            tracing::warn!(path = %req.path(), "Rate limit exceeded.");
            let response = HttpResponse::TooManyRequests()
                .insert_header((header::RETRY_AFTER, retry_after.as_secs().to_string()))
                .json(ResponseErrorMessage {
                    error: "Rate limit exceeded".to_string(),
                });
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}
