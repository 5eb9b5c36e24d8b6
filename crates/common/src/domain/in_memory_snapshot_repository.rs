use crate::domain::{
    CreateTelemetryDocumentRepoInput, DomainError, DomainResult, MergeStateDocumentRepoInput,
    SnapshotRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
    Timestamp(DateTime<Utc>),
    Number(f64),
    Bytes(Vec<u8>),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDocument {
    pub fields: BTreeMap<String, SnapshotValue>,
}

impl SnapshotDocument {
    pub fn get(&self, field: &str) -> Option<&SnapshotValue> {
        self.fields.get(field)
    }
}

#[derive(Default)]
struct Documents {
    by_path: HashMap<String, SnapshotDocument>,
    journal: Vec<String>,
    merges_offline: bool,
}

/// In-memory implementation of SnapshotRepository keyed by document path
pub struct InMemorySnapshotRepository {
    documents: Arc<RwLock<Documents>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Documents::default())),
        }
    }

    pub async fn document(&self, path: &str) -> Option<SnapshotDocument> {
        self.documents.read().await.by_path.get(path).cloned()
    }

    /// Paths of successful writes, in the order they were committed.
    pub async fn journal(&self) -> Vec<String> {
        self.documents.read().await.journal.clone()
    }

    /// Make merge writes fail as unavailable while telemetry creates keep working.
    pub async fn fail_merges(&self, offline: bool) {
        self.documents.write().await.merges_offline = offline;
    }

    /// Set a single field directly, as another writer sharing the store would.
    pub async fn seed_field(&self, path: &str, field: &str, value: SnapshotValue) {
        let mut documents = self.documents.write().await;
        documents
            .by_path
            .entry(path.to_string())
            .or_default()
            .fields
            .insert(field.to_string(), value);
    }
}

impl Default for InMemorySnapshotRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn create_telemetry_document(
        &self,
        input: CreateTelemetryDocumentRepoInput,
    ) -> DomainResult<()> {
        let path = input.path();
        let mut documents = self.documents.write().await;
        if documents.by_path.contains_key(&path) {
            return Err(DomainError::SnapshotConflict(path));
        }

        let mut fields = BTreeMap::new();
        fields.insert(
            "timestamp".to_string(),
            SnapshotValue::Timestamp(input.sample.timestamp),
        );
        for (name, value) in input.sample.measurements() {
            fields.insert(name.to_string(), SnapshotValue::Number(value));
        }

        documents
            .by_path
            .insert(path.clone(), SnapshotDocument { fields });
        documents.journal.push(path);
        Ok(())
    }

    async fn merge_state_document(&self, input: MergeStateDocumentRepoInput) -> DomainResult<()> {
        let path = input.path();
        let mut documents = self.documents.write().await;
        if documents.merges_offline {
            return Err(DomainError::SnapshotUnavailable(anyhow::anyhow!(
                "merge into {} failed: store offline",
                path
            )));
        }

        let document = documents.by_path.entry(path.clone()).or_default();
        document.fields.insert(
            "timestamp".to_string(),
            SnapshotValue::Timestamp(input.timestamp),
        );
        document
            .fields
            .insert("data".to_string(), SnapshotValue::Bytes(input.data));
        documents.journal.push(path);
        Ok(())
    }
}
