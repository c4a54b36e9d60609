//! Jobs spawned next to the HTTP server.
//!
//! Each job loops until its [`CancellationToken`](tokio_util::sync::CancellationToken)
//! is cancelled at shutdown.

pub mod session_cleanup;
