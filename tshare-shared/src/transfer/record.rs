/// Per-table hooks used by export and import
///
/// Every exported table implements [`TransferRecord`]: how to read all rows,
/// how to insert one row with every column verbatim, and which columns hold
/// references to other exported tables.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgConnection};
use uuid::Uuid;

/// Old-to-new primary key mapping, keyed by table
///
/// Filled while rows are inserted with regenerated ids. Rows inserted later
/// in dependency order look their foreign keys up here.
#[derive(Debug, Default)]
pub struct IdMap {
    ids: HashMap<&'static str, HashMap<Uuid, Uuid>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: &'static str, old: Uuid, new: Uuid) {
        self.ids.entry(table).or_default().insert(old, new);
    }

    pub fn get(&self, table: &str, old: Uuid) -> Option<Uuid> {
        self.ids.get(table).and_then(|m| m.get(&old)).copied()
    }

    /// Rewrites `id` if it points at a row re-keyed in this import
    ///
    /// References to rows outside the payload are left untouched.
    pub fn remap(&self, table: &str, id: &mut Uuid) {
        if let Some(new) = self.get(table, *id) {
            *id = new;
        }
    }

    pub fn remap_opt(&self, table: &str, id: &mut Option<Uuid>) {
        if let Some(id) = id.as_mut() {
            self.remap(table, id);
        }
    }

    pub fn len(&self, table: &str) -> usize {
        self.ids.get(table).map_or(0, HashMap::len)
    }
}

/// A row type that can be exported and imported
#[async_trait]
pub trait TransferRecord:
    Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + Sized
{
    /// SQL table name
    const TABLE: &'static str;

    /// Key under `data` in the export envelope
    const KEY: &'static str;

    fn id(&self) -> Uuid;

    fn set_id(&mut self, id: Uuid);

    /// Rewrites foreign key columns through `ids`
    fn remap_references(&mut self, ids: &IdMap);

    /// Reads every row of the table
    async fn fetch_all(conn: &mut PgConnection) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT * FROM {} ORDER BY id", Self::TABLE);
        sqlx::query_as::<_, Self>(&sql).fetch_all(&mut *conn).await
    }

    /// Inserts the row exactly as given, timestamps included
    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_map_remap() {
        let mut ids = IdMap::new();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        ids.insert("users", old, new);

        let mut id = old;
        ids.remap("users", &mut id);
        assert_eq!(id, new);

        // Same id under another table is not touched
        let mut other = old;
        ids.remap("projects", &mut other);
        assert_eq!(other, old);

        let mut outside = Uuid::new_v4();
        let before = outside;
        ids.remap("users", &mut outside);
        assert_eq!(outside, before);
    }

    #[test]
    fn test_id_map_remap_opt() {
        let mut ids = IdMap::new();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        ids.insert("scenes", old, new);

        let mut some = Some(old);
        ids.remap_opt("scenes", &mut some);
        assert_eq!(some, Some(new));

        let mut none: Option<Uuid> = None;
        ids.remap_opt("scenes", &mut none);
        assert_eq!(none, None);
        assert_eq!(ids.len("scenes"), 1);
        assert_eq!(ids.len("tags"), 0);
    }
}
