//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts.
//!
//! - `HttpClient` using `reqwest`
//! - `SecureStore` as a user-only readable JSON file
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileSecureStore, ReqwestHttpClient};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let secure_store = FileSecureStore::in_data_dir()?;
//! ```

mod http;
mod secure_store;

pub use http::ReqwestHttpClient;
pub use secure_store::FileSecureStore;
