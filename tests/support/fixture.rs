use std::fs;
use std::path::{Path, PathBuf};

use diesel::prelude::*;
use orderload::adapter::outbound::sqlite::database::connection::create_pool;
use orderload::adapter::outbound::sqlite::database::model::DocumentRow;
use orderload::adapter::outbound::sqlite::database::schema::documents;
use orderload::domain::settings::{
    BLOB_ACCOUNT_KEY_VAR, BLOB_ACCOUNT_NAME_VAR, BLOB_CONTAINER_VAR, COLLECTION_VAR, DATABASE_VAR,
    STORE_URL_VAR,
};
use serde_json::Value;
use tempfile::TempDir;

pub const CONTAINER: &str = "orders";
pub const DATABASE: &str = "shop";
pub const COLLECTION: &str = "orders";

/// Temporary blob root, SQLite database and config file.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("blobs").join(CONTAINER)).expect("create container");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn blob_root(&self) -> PathBuf {
        self.dir.path().join("blobs")
    }

    pub fn store_url(&self) -> String {
        format!("sqlite://{}", self.dir.path().join("orders.db").display())
    }

    /// Write `body` as `<container>/<object>`.
    pub fn put_blob(&self, object: &str, body: impl AsRef<[u8]>) {
        let path = self.blob_root().join(CONTAINER).join(object);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create blob dir");
        }
        fs::write(path, body).expect("write blob");
    }

    /// Write a config file reading blobs from the local root.
    pub fn write_config(&self, batch_size: usize) -> PathBuf {
        let path = self.dir.path().join("orderload.toml");
        let toml = format!(
            "[logging]\nlevel = \"warn\"\n\n[ingest]\nbatch_size = {batch_size}\ninvocation_timeout_secs = 10\nlocal_blob_root = \"{}\"\n",
            self.blob_root().display()
        );
        fs::write(&path, toml).expect("write config");
        path
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Every required setting pointing at this workspace.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        vec![
            (STORE_URL_VAR, self.store_url()),
            (DATABASE_VAR, DATABASE.to_string()),
            (COLLECTION_VAR, COLLECTION.to_string()),
            (BLOB_ACCOUNT_NAME_VAR, "devaccount".to_string()),
            (BLOB_ACCOUNT_KEY_VAR, "ZGV2a2V5".to_string()),
            (BLOB_CONTAINER_VAR, CONTAINER.to_string()),
        ]
    }

    /// Documents stored in the test collection, in insertion order.
    pub fn stored(&self) -> Vec<Value> {
        let pool = create_pool(&self.store_url()).expect("open sqlite");
        let mut conn = pool.get().expect("get sqlite connection");
        let exists: Vec<TableName> =
            diesel::sql_query("SELECT name FROM sqlite_master WHERE name = 'documents'")
                .load(&mut conn)
                .expect("query sqlite_master");
        if exists.is_empty() {
            return Vec::new();
        }
        documents::table
            .filter(documents::database_name.eq(DATABASE))
            .filter(documents::collection_name.eq(COLLECTION))
            .order(documents::id.asc())
            .select(DocumentRow::as_select())
            .load(&mut conn)
            .expect("load documents")
            .into_iter()
            .map(|row| serde_json::from_str(&row.body).expect("stored JSON"))
            .collect()
    }
}

#[derive(diesel::QueryableByName)]
struct TableName {
    #[allow(dead_code)]
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}

/// Event Grid delivery naming `object` in the test container.
pub fn event_json(object: &str) -> String {
    serde_json::json!([{
        "id": "evt-1",
        "eventType": "Microsoft.Storage.BlobCreated",
        "subject": format!("/blobServices/default/containers/{CONTAINER}/blobs/{object}"),
        "eventTime": "2026-01-01T00:00:00Z",
        "data": { "api": "PutBlob" }
    }])
    .to_string()
}
