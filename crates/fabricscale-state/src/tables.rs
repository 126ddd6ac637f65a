//! redb table definitions for the record store.

use redb::TableDefinition;

/// Status records keyed by `{namespace}/{name}`.
pub const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");
