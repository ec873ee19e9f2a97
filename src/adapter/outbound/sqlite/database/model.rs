//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::documents;

/// Database row for a stored document (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = documents)]
pub struct NewDocumentRow {
    pub database_name: String,
    pub collection_name: String,
    /// The record as compact JSON text.
    pub body: String,
    pub inserted_at: String,
}

/// Database row for a stored document (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRow {
    pub id: Option<i32>,
    pub database_name: String,
    pub collection_name: String,
    pub body: String,
    pub inserted_at: String,
}
