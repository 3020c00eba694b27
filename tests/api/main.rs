mod admin_subscribers;
mod helpers;
mod rate_limit;
