//! Thin per-service wrappers that map business operations onto gateway pathnames.
//!
//! Each service owns a [`crate::client::Client`] and forwards to `request`/`request_json`; no
//! service adds signing or transport behavior of its own.

pub mod coin;
pub mod file;
pub mod user;

pub use coin::CoinService;
pub use file::FileService;
pub use user::UserService;
