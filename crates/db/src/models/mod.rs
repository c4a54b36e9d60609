//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Deserialize` create/update DTOs, validated with `validator` where the
//!   input comes straight from a request body

pub mod listing;
pub mod media;
pub mod review;
pub mod session;
pub mod user;
pub mod validation;
