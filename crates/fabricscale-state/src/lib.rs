//! fabricscale-state — named record store for autoscaler status reports.
//!
//! Backed by [redb](https://docs.rs/redb). Records are small string maps
//! (a `data` section and an `annotations` section) addressed by
//! `{namespace}/{name}`, JSON-serialized into redb's `&[u8]` value column.
//!
//! # Concurrency
//!
//! Every record carries a `version` token that the store bumps on each
//! write. `update_record` only succeeds when the caller's token matches the
//! stored one, so a read-modify-write cycle that lost a race to another
//! writer gets [`StateError::Conflict`] instead of silently overwriting it.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::{RecordStore, StateStore};
pub use types::*;
