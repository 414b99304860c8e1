//! MongoDB record sink
//!
//! Records are schemaless documents; one insert per destination.

use anyhow::Context;
use async_trait::async_trait;
use mongodb::Client;
use mongodb::bson::Document;
use serde_json::Value;

use hotelfeed_core::RecordSink;

pub struct MongoSink {
    collection: mongodb::Collection<Document>,
}

impl MongoSink {
    /// Connect and bind to the target collection. The driver connects
    /// lazily; a bad URI fails here, an unreachable server fails on the
    /// first insert.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("connecting to MongoDB")?;
        log::info!("using MongoDB collection {database}.{collection}");
        Ok(Self {
            collection: client.database(database).collection(collection),
        })
    }
}

/// Convert a JSON record into a BSON document. Only objects can be stored.
fn to_document(record: &Value) -> anyhow::Result<Document> {
    match record {
        Value::Object(_) => {
            mongodb::bson::to_document(record).context("converting record to BSON")
        }
        other => anyhow::bail!("record must be a JSON object, got {other}"),
    }
}

#[async_trait]
impl RecordSink for MongoSink {
    async fn insert(&self, record: &Value) -> anyhow::Result<()> {
        let document = to_document(record)?;
        self.collection
            .insert_one(document)
            .await
            .context("inserting record")?;
        Ok(())
    }
}
