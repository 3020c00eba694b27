pub mod admin;
pub mod health_check;
pub mod subscribe;
