pub mod client;
#[cfg(feature = "test-utils")]
pub mod memory;
mod record;
pub mod store;

pub use client::{DbClient, DbError, Result};
pub use store::{SharedStore, Store};
