//! Domain logic for the Velvet marketplace.
//!
//! Everything here is synchronous and free of I/O apart from the
//! [`storage`] adapters. The database and HTTP layers build on these types.

pub mod catalog;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod listing;
pub mod pagination;
pub mod rating;
pub mod roles;
pub mod storage;
pub mod types;
