/// Connection pool and schema migrations
///
/// Table access itself lives in [`crate::models`]; this module only owns the
/// `PgPool` lifecycle and the embedded migrator.

pub mod migrations;
pub mod pool;
