//! Inventory API client, shared by the CLI and anything else that runs a
//! stock check against the live store.
//!
//! Implements the engine's [`InventoryReader`](stockcheck_recon::InventoryReader)
//! and [`InventoryWriter`](stockcheck_recon::InventoryWriter) over HTTP.
//! No retries. No caching.

mod auth;
mod client;

pub use auth::{
    auth_file_path, delete_auth, load_auth, load_auth_from, save_auth, save_auth_to,
    AuthCredentials, DEFAULT_API_BASE,
};
pub use client::{parse_records, ClientError, InventoryClient};
