//! Terminal output formatting.

use colored::Colorize;
use evgraph_core::{GraphBatch, RelationshipKind};
use evgraph_graph::{LoadResult, PrepareStats};

/// Print normalization counters.
pub fn print_prepare_stats(stats: &PrepareStats) {
    println!("{}", "Source rows".bold());
    println!("  Read:        {}", stats.rows_read);
    println!("  Kept:        {}", stats.rows_kept.to_string().green());
    println!("  Not submit:  {}", stats.non_submit.to_string().dimmed());
    println!("  Duplicates:  {}", stats.duplicates.to_string().dimmed());
    println!("  Incomplete:  {}", stats.incomplete.to_string().dimmed());
}

/// Print node and relationship counts of a derived batch.
pub fn print_batch_summary(batch: &GraphBatch) {
    println!("\n{}", "Derived graph".bold());
    println!("  Users:         {}", batch.users.len().to_string().cyan());
    println!("  Events:        {}", batch.events.len().to_string().cyan());
    for kind in RelationshipKind::ALL {
        let count = batch.relationships.iter().filter(|r| r.kind == kind).count();
        println!("  {:<14} {}", format!("{}:", kind), count.to_string().cyan());
    }
    if batch.emitted_relationships > batch.relationships.len() {
        println!(
            "  {}",
            format!(
                "({} duplicate relationships collapsed)",
                batch.emitted_relationships - batch.relationships.len()
            )
            .dimmed()
        );
    }
    print_conflicts(batch.identity_conflicts);
}

/// Print the outcome of a load.
pub fn print_load_result(result: &LoadResult) {
    print_prepare_stats(&result.stats);

    if let Some(reset) = &result.reset {
        println!(
            "\n{} {} nodes in {} batches",
            "Reset:".bold(),
            reset.total_deleted,
            reset.batches
        );
    }

    match &result.written {
        Some(written) => {
            println!("\n{}", "Load complete:".green().bold());
            println!("  Users:         {}", written.users);
            println!("  Events:        {}", written.events);
            println!("  Relationships: {}", written.relationships);
        }
        None => println!("\n{}", "No submit records found, nothing written.".dimmed()),
    }
    print_conflicts(result.identity_conflicts);
}

fn print_conflicts(conflicts: usize) {
    if conflicts > 0 {
        println!(
            "  {} {} conflicting attribute values for repeated ids, last seen kept",
            "warning:".yellow().bold(),
            conflicts
        );
    }
}
