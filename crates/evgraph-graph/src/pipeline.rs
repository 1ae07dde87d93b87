//! Event-log to Neo4j load pipeline.
//!
//! extract (CSV) -> normalize -> build batch -> [reset] -> [schema] -> write.
//! Everything before the first graph call is in-memory, so a bad source never
//! leaves the graph half-modified. The reset runs before the schema step so
//! constraints are created on an empty graph.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use evgraph_core::record::source::read_csv_path;
use evgraph_core::{build_batch, normalize, GraphBatch, NormalizeOutcome, RawRecord};

use crate::sink::{reset, GraphSink, ResetSummary, WriteSummary, DEFAULT_RESET_BATCH_SIZE};

/// Options of a load run.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Clear the graph before writing.
    pub reset_first: bool,
    pub reset_batch_size: usize,
    /// Ask the sink to set up its schema before writing.
    pub ensure_schema: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            reset_first: false,
            reset_batch_size: DEFAULT_RESET_BATCH_SIZE,
            ensure_schema: true,
        }
    }
}

/// Counters of a prepared (not yet written) batch.
#[derive(Debug, Clone, Default)]
pub struct PrepareStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub non_submit: usize,
    pub duplicates: usize,
    pub incomplete: usize,
}

impl From<&NormalizeOutcome> for PrepareStats {
    fn from(outcome: &NormalizeOutcome) -> Self {
        Self {
            rows_read: outcome.total,
            rows_kept: outcome.records.len(),
            non_submit: outcome.non_submit,
            duplicates: outcome.duplicates,
            incomplete: outcome.incomplete,
        }
    }
}

/// Result of a load run.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    pub stats: PrepareStats,
    pub nodes: usize,
    pub relationships: usize,
    pub emitted_relationships: usize,
    pub identity_conflicts: usize,
    pub reset: Option<ResetSummary>,
    /// `None` when the batch was empty and nothing was written.
    pub written: Option<WriteSummary>,
}

/// Normalize raw rows and derive the graph batch, without touching the graph.
pub fn prepare_batch(raw: Vec<RawRecord>) -> Result<(PrepareStats, GraphBatch)> {
    let outcome = normalize(raw).context("Failed to normalize event log")?;
    let stats = PrepareStats::from(&outcome);
    let batch = build_batch(&outcome.records).context("Failed to derive graph batch")?;
    Ok((stats, batch))
}

/// Read a CSV export and prepare its graph batch.
pub fn prepare_path(path: &Path) -> Result<(PrepareStats, GraphBatch)> {
    let raw = read_csv_path(path).context("Failed to read event log")?;
    prepare_batch(raw)
}

/// Run the full pipeline for a CSV export.
pub async fn run_pipeline<S>(sink: &S, path: &Path, options: &LoadOptions) -> Result<LoadResult>
where
    S: GraphSink + ?Sized,
{
    info!(path = %path.display(), "Starting load");
    let raw = read_csv_path(path).context("Failed to read event log")?;
    load_records(sink, raw, options).await
}

/// Run the pipeline for rows that have already been read.
pub async fn load_records<S>(
    sink: &S,
    raw: Vec<RawRecord>,
    options: &LoadOptions,
) -> Result<LoadResult>
where
    S: GraphSink + ?Sized,
{
    let (stats, batch) = prepare_batch(raw)?;

    let mut result = LoadResult {
        stats,
        nodes: batch.node_count(),
        relationships: batch.relationships.len(),
        emitted_relationships: batch.emitted_relationships,
        identity_conflicts: batch.identity_conflicts,
        ..Default::default()
    };

    if options.reset_first {
        result.reset = Some(reset(sink, options.reset_batch_size, |_| {}).await?);
    }

    if options.ensure_schema {
        sink.ensure_schema().await.context("Failed to initialize graph schema")?;
    }

    if batch.is_empty() {
        info!("No submit records to load, skipping graph write");
        return Ok(result);
    }

    result.written = Some(sink.write_batch(&batch).await.context("Failed to write graph batch")?);

    info!(
        nodes = result.nodes,
        relationships = result.relationships,
        "Load complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::tests::MemorySink;
    use crate::GraphCounts;

    fn raw(function: &str, event: &str, user: &str, invited: &str) -> RawRecord {
        RawRecord {
            function_name: Some(function.to_string()),
            id: Some(event.to_string()),
            added_at_utc: Some("2023-03-01T10:15:30Z".to_string()),
            environment_id: Some("env-1".to_string()),
            event_name: Some("Approve".to_string()),
            user_id: Some(user.to_string()),
            flow_id: Some("flow-1".to_string()),
            flow_origin_id: Some("origin-1".to_string()),
            company_id: Some("C1".to_string()),
            resource_id: Some("res-1".to_string()),
            step_id: Some("step-1".to_string()),
            invited_entity_id: Some(invited.to_string()),
            invited_entity_company_id: Some("C2".to_string()),
        }
    }

    #[tokio::test]
    async fn test_load_writes_deduplicated_batch() {
        let sink = MemorySink::default();
        let rows = vec![
            raw("submit", "E1", "U1", "U2"),
            raw("submit", "E1", "U1", "U2"),
            raw("submit", "E2", "U1", "U2"),
            raw("view", "E3", "U3", "U4"),
        ];

        let result = load_records(&sink, rows, &LoadOptions::default()).await.unwrap();

        assert_eq!(result.stats.rows_read, 4);
        assert_eq!(result.stats.non_submit, 1);
        assert_eq!(result.stats.duplicates, 1);
        assert_eq!(result.nodes, 4);
        // raised x2, submitted_to x2, invited x1
        assert_eq!(result.relationships, 5);
        assert_eq!(
            result.written,
            Some(WriteSummary { users: 2, events: 2, relationships: 5 })
        );
        assert_eq!(sink.writes.lock().unwrap().len(), 1);
        assert_eq!(*sink.schema_calls.lock().unwrap(), 1);
        assert!(result.reset.is_none());
        assert_eq!(
            sink.counts().await.unwrap(),
            GraphCounts { nodes: 4, relationships: 5 }
        );
    }

    #[tokio::test]
    async fn test_empty_input_is_a_no_op_write() {
        let sink = MemorySink::default();
        let rows = vec![raw("view", "E1", "U1", "U2")];

        let result = load_records(&sink, rows, &LoadOptions::default()).await.unwrap();

        assert_eq!(result.nodes, 0);
        assert_eq!(result.relationships, 0);
        assert!(result.written.is_none());
        assert!(sink.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_first_clears_before_write() {
        let sink = MemorySink::with_nodes(42);
        let options = LoadOptions {
            reset_first: true,
            reset_batch_size: 20,
            ensure_schema: false,
        };

        let result = load_records(&sink, vec![raw("submit", "E1", "U1", "U2")], &options)
            .await
            .unwrap();

        assert_eq!(result.reset, Some(ResetSummary { total_deleted: 42, batches: 3 }));
        assert_eq!(*sink.nodes.lock().unwrap(), 3);
        assert_eq!(*sink.schema_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_runs_before_schema() {
        // Leftover duplicate nodes would break the uniqueness constraints.
        let sink = MemorySink {
            strict_schema: true,
            ..MemorySink::with_nodes(4)
        };
        let options = LoadOptions {
            reset_first: true,
            reset_batch_size: 3,
            ensure_schema: true,
        };

        let result = load_records(&sink, vec![raw("submit", "E1", "U1", "U2")], &options)
            .await
            .unwrap();

        assert_eq!(
            sink.calls(),
            vec!["delete", "delete", "delete", "clear", "schema", "write"]
        );
        assert_eq!(result.reset, Some(ResetSummary { total_deleted: 4, batches: 2 }));
        assert_eq!(*sink.nodes.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_schema_failure_without_reset_leaves_graph() {
        let sink = MemorySink {
            strict_schema: true,
            ..MemorySink::with_nodes(4)
        };

        let rows = vec![raw("submit", "E1", "U1", "U2")];
        let err = load_records(&sink, rows, &LoadOptions::default()).await.unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to initialize graph schema"));
        assert_eq!(sink.calls(), vec!["schema"]);
        assert_eq!(*sink.nodes.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_bad_timestamp_never_touches_graph() {
        let sink = MemorySink::with_nodes(7);
        let mut bad = raw("submit", "E1", "U1", "U2");
        bad.added_at_utc = Some("not-a-date".to_string());
        let options = LoadOptions {
            reset_first: true,
            ..Default::default()
        };

        assert!(load_records(&sink, vec![bad], &options).await.is_err());
        assert_eq!(*sink.nodes.lock().unwrap(), 7);
        assert_eq!(*sink.delete_calls.lock().unwrap(), 0);
        assert_eq!(*sink.schema_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let sink = MemorySink::default();
        let err = run_pipeline(&sink, Path::new("/nonexistent/events.csv"), &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Source unavailable"));
        assert!(sink.writes.lock().unwrap().is_empty());
    }
}
