pub mod admin;
pub mod auth;
pub mod favorites;
pub mod listings;
pub mod reviews;
