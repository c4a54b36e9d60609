//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod favorite_repo;
pub mod listing_repo;
pub mod media_repo;
pub mod review_repo;
pub mod session_repo;
pub mod user_repo;

pub use favorite_repo::FavoriteRepo;
pub use listing_repo::ListingRepo;
pub use media_repo::MediaRepo;
pub use review_repo::ReviewRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
