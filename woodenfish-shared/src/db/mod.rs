/// Database layer: connection pooling and schema migrations.
///
/// Table-level queries live next to their types in [`crate::models`].

pub mod migrations;
pub mod pool;
