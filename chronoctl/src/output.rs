//! Output formatting utilities for chronoctl

use crate::cli::OutputFormat;
use chronofact_core::errors::CoreError;
use colored::*;
use serde_json::Value;
use tabled::{Table, Tabled};

/// Print a JSON value honoring the selected format. Table formatting is left
/// to format-specific callers; this is the fallback used when a payload has
/// no bespoke table rendering.
pub fn display_value(value: &Value, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()));
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let json = serde_json::to_string_pretty(value).map_err(|e| CoreError::Internal(format!("failed to serialize output: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

pub fn display_health(healthy: bool, status: &str, detail: &str) {
    if healthy {
        println!("{}", "chronofact is healthy".green().bold());
        println!("Status: {}", status.green());
    } else {
        println!("{}", "chronofact health check failed".red().bold());
        println!("Error: {}", detail.red());
    }
}

pub fn display_episode_added(episode_name: &str, group_id: &str, message: &str, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            println!("{}", "Episode queued".green().bold());
            println!("{:<15} {}", "Name:".bold(), episode_name);
            println!("{:<15} {}", "Group:".bold(), group_id);
            println!("{:<15} {}", "Message:".bold(), message);
            Ok(())
        }
        _ => display_value(&serde_json::json!({"episode_name": episode_name, "group_id": group_id, "message": message}), format),
    }
}

#[derive(Tabled)]
struct SearchResultRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

pub fn display_search_results(search_type: &str, results: &[Value], format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            if results.is_empty() {
                println!("No {search_type} found");
                return Ok(());
            }

            let rows: Vec<SearchResultRow> = results
                .iter()
                .enumerate()
                .map(|(i, r)| SearchResultRow { index: i + 1, score: format_score(r), summary: format_summary(search_type, r) })
                .collect();

            println!("{}", Table::new(rows));
            Ok(())
        }
        _ => display_value(&serde_json::json!({"search_type": search_type, "results": results}), format),
    }
}

fn format_score(result: &Value) -> String {
    result.get("score").and_then(Value::as_f64).map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".to_string())
}

fn format_summary(search_type: &str, result: &Value) -> String {
    match search_type {
        "facts" => result.get("edge").and_then(|e| e.get("fact")).and_then(Value::as_str).unwrap_or("-").to_string(),
        "nodes" => result.get("node").and_then(|n| n.get("name")).and_then(Value::as_str).unwrap_or("-").to_string(),
        "episodes" => result.get("name").and_then(Value::as_str).unwrap_or("-").to_string(),
        _ => "-".to_string(),
    }
}

pub fn display_fact_updated(old_uuid: &str, new_uuid: &str, fact: &str, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            println!("{}", "Fact updated".green().bold());
            println!("{:<15} {}", "Old edge:".bold(), old_uuid);
            println!("{:<15} {}", "New edge:".bold(), new_uuid);
            println!("{:<15} {}", "Fact:".bold(), fact);
            Ok(())
        }
        _ => display_value(&serde_json::json!({"old_uuid": old_uuid, "new_uuid": new_uuid, "fact": fact}), format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_summary_falls_back_to_dash_for_unknown_type() {
        assert_eq!(format_summary("bogus", &serde_json::json!({})), "-");
    }

    #[test]
    fn format_summary_reads_fact_text() {
        let result = serde_json::json!({"edge": {"fact": "service X depends on Y"}});
        assert_eq!(format_summary("facts", &result), "service X depends on Y");
    }

    #[test]
    fn format_score_handles_missing_score() {
        assert_eq!(format_score(&serde_json::json!({})), "-");
    }
}
