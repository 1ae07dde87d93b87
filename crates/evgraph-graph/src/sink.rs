//! Graph sink: transactional batch writes and batched reset.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{BoltType, Query, Txn};
use tracing::{debug, info, warn};

use evgraph_core::registry::model::{EventEntity, UserEntity, EVENT_LABEL, USER_LABEL};
use evgraph_core::{EvgraphError, GraphBatch, Relationship, RelationshipKind};

use crate::{GraphClient, GraphCounts};

/// Nodes deleted per reset iteration unless configured otherwise.
pub const DEFAULT_RESET_BATCH_SIZE: usize = 10_000;

/// Rows per `UNWIND` statement when writing a batch.
pub const DEFAULT_WRITE_CHUNK_SIZE: usize = 1_000;

/// What a batch write put into the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub users: usize,
    pub events: usize,
    pub relationships: usize,
}

/// Outcome of a reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetSummary {
    pub total_deleted: usize,
    /// Non-empty delete batches.
    pub batches: usize,
}

/// Destination of graph batches.
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Persist every node and relationship of `batch`, all or nothing.
    async fn write_batch(&self, batch: &GraphBatch) -> Result<WriteSummary>;

    /// Delete up to `limit` nodes with their relationships; returns how many went.
    async fn delete_batch(&self, limit: usize) -> Result<usize>;

    /// Delete whatever is left.
    async fn clear_all(&self) -> Result<()>;

    /// Current node and relationship counts.
    async fn counts(&self) -> Result<GraphCounts>;

    /// Create whatever constraints the store wants before a write.
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }
}

/// Clear the graph in bounded batches.
///
/// Calls `on_progress` with the running total after every non-empty batch,
/// stops at the first empty one, then issues a final catch-all clear.
pub async fn reset<S, F>(sink: &S, batch_size: usize, mut on_progress: F) -> Result<ResetSummary>
where
    S: GraphSink + ?Sized,
    F: FnMut(usize) + Send,
{
    if batch_size == 0 {
        return Err(EvgraphError::config("reset batch size must be at least 1").into());
    }

    info!(batch_size, "Resetting graph");
    let mut summary = ResetSummary::default();

    loop {
        let deleted = sink
            .delete_batch(batch_size)
            .await
            .context("Failed to delete node batch")?;
        if deleted == 0 {
            break;
        }
        summary.total_deleted += deleted;
        summary.batches += 1;
        debug!(deleted, total = summary.total_deleted, "Deleted node batch");
        on_progress(summary.total_deleted);
    }

    sink.clear_all().await.context("Failed to clear remaining graph state")?;

    info!(
        total_deleted = summary.total_deleted,
        batches = summary.batches,
        "Graph reset complete"
    );
    Ok(summary)
}

/// [`GraphSink`] backed by a Neo4j database.
#[derive(Clone)]
pub struct Neo4jSink {
    client: GraphClient,
    chunk_size: usize,
}

impl Neo4jSink {
    pub fn new(client: GraphClient) -> Self {
        Self::with_chunk_size(client, DEFAULT_WRITE_CHUNK_SIZE)
    }

    pub fn with_chunk_size(client: GraphClient, chunk_size: usize) -> Self {
        Self {
            client,
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl GraphSink for Neo4jSink {
    async fn write_batch(&self, batch: &GraphBatch) -> Result<WriteSummary> {
        let mut txn = self.client.start_txn().await?;

        match write_in_txn(&mut txn, batch, self.chunk_size).await {
            Ok(summary) => {
                txn.commit().await.context("Failed to commit graph batch")?;
                info!(
                    users = summary.users,
                    events = summary.events,
                    relationships = summary.relationships,
                    "Graph batch committed"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "Graph batch write failed, rolling back");
                let rollback = txn.rollback().await.context("Failed to roll back graph batch");
                Err(keep_write_error(e, rollback))
            }
        }
    }

    async fn delete_batch(&self, limit: usize) -> Result<usize> {
        let query = Query::new(
            "MATCH (n) WITH n LIMIT $limit DETACH DELETE n RETURN count(n) AS deleted".to_string(),
        )
        .param("limit", limit as i64);

        let deleted: i64 = self.client.query_scalar(query, "deleted").await?.unwrap_or(0);
        Ok(deleted.max(0) as usize)
    }

    async fn clear_all(&self) -> Result<()> {
        self.client
            .execute(Query::new("MATCH (n) DETACH DELETE n".to_string()))
            .await
    }

    async fn counts(&self) -> Result<GraphCounts> {
        self.client.get_counts().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        crate::schema::initialize_schema(&self.client).await
    }
}

/// The write error is what the caller sees; a failed rollback is only logged.
fn keep_write_error(write_err: anyhow::Error, rollback: Result<()>) -> anyhow::Error {
    if let Err(rollback_err) = rollback {
        warn!(error = %format!("{rollback_err:#}"), "Rollback of failed graph batch also failed");
    }
    write_err
}

async fn write_in_txn(
    txn: &mut Txn,
    batch: &GraphBatch,
    chunk_size: usize,
) -> Result<WriteSummary> {
    let users: Vec<HashMap<String, BoltType>> = batch.users.iter().map(user_row).collect();
    for chunk in users.chunks(chunk_size) {
        let query = Query::new(user_upsert()).param("rows", chunk.to_vec());
        txn.run(query).await.context("Failed to write user nodes")?;
    }

    let events: Vec<HashMap<String, BoltType>> = batch.events.iter().map(event_row).collect();
    for chunk in events.chunks(chunk_size) {
        let query = Query::new(event_upsert()).param("rows", chunk.to_vec());
        txn.run(query).await.context("Failed to write event nodes")?;
    }

    for kind in RelationshipKind::ALL {
        let rows: Vec<HashMap<String, BoltType>> = batch
            .relationships
            .iter()
            .filter(|rel| rel.kind == kind)
            .map(relationship_row)
            .collect();
        for chunk in rows.chunks(chunk_size) {
            let query = Query::new(relationship_merge(kind)).param("rows", chunk.to_vec());
            txn.run(query)
                .await
                .with_context(|| format!("Failed to write {} relationships", kind))?;
        }
        debug!(kind = %kind, count = rows.len(), "Wrote relationships");
    }

    Ok(WriteSummary {
        users: batch.users.len(),
        events: batch.events.len(),
        relationships: batch.relationships.len(),
    })
}

fn user_upsert() -> String {
    format!(
        "UNWIND $rows AS row
         MERGE (u:{USER_LABEL} {{id: row.id}})
         SET u.company_id = row.company_id"
    )
}

fn event_upsert() -> String {
    format!(
        "UNWIND $rows AS row
         MERGE (e:{EVENT_LABEL} {{id: row.id}})
         SET e.event_name = row.event_name,
             e.date = row.date,
             e.step_id = row.step_id,
             e.environment_id = row.environment_id"
    )
}

fn relationship_merge(kind: RelationshipKind) -> String {
    format!(
        "UNWIND $rows AS row
         MATCH (s:{source} {{id: row.source}})
         MATCH (t:{target} {{id: row.target}})
         MERGE (s)-[:{rel}]->(t)",
        source = kind.source_label(),
        target = kind.target_label(),
        rel = kind.as_str(),
    )
}

fn user_row(user: &UserEntity) -> HashMap<String, BoltType> {
    let mut row = HashMap::new();
    row.insert("id".to_string(), user.id.as_str().into());
    row.insert("company_id".to_string(), user.company_id.as_str().into());
    row
}

fn event_row(event: &EventEntity) -> HashMap<String, BoltType> {
    let mut row = HashMap::new();
    row.insert("id".to_string(), event.id.as_str().into());
    row.insert("event_name".to_string(), event.event_name.as_str().into());
    row.insert("date".to_string(), event.date.as_str().into());
    row.insert("step_id".to_string(), event.step_id.as_str().into());
    row.insert("environment_id".to_string(), event.environment_id.as_str().into());
    row
}

fn relationship_row(rel: &Relationship) -> HashMap<String, BoltType> {
    let mut row = HashMap::new();
    row.insert("source".to_string(), rel.source.as_str().into());
    row.insert("target".to_string(), rel.target.as_str().into());
    row
}
