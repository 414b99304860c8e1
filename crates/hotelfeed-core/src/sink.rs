//! Record sink boundary
//!
//! Workers hand finished records to a [`RecordSink`]; the binary decides
//! whether that is a real document store or the in-memory sink.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

/// Destination for normalized hotel records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn insert(&self, record: &Value) -> anyhow::Result<()>;
}

/// In-memory sink for tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn insert(&self, record: &Value) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_sink_keeps_insertion_order() {
        let sink = MemorySink::new();
        sink.insert(&json!({"HotelId": "100"})).await.unwrap();
        sink.insert(&json!({"HotelId": "200"})).await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["HotelId"], "100");
        assert_eq!(records[1]["HotelId"], "200");
    }
}
