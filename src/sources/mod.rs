//! Server implementations of the collaborator traits.
//!
//! # Feature Flags
//!
//! - `source-komga` - Enables the Komga source (default)
//!
//! Build without any server support (pagination core only):
//! ```bash
//! cargo build --no-default-features
//! ```
//!
//! # Available Sources
//!
//! - [`KomgaSource`] - Komga REST API (requires `source-komga` feature)

#[cfg(feature = "source-komga")]
pub mod komga;

#[cfg(feature = "source-komga")]
pub use komga::KomgaSource;
