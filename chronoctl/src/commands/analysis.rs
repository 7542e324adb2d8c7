//! Causality and recurrence analytics command implementations

use crate::cli::{AnalysisCommands, OutputFormat};
use crate::client::ChronofactClient;
use crate::config::ChronoctlConfig;
use crate::output;
use chronofact_core::errors::CoreError;
use serde_json::Value;
use tracing::info;

pub async fn handle_analysis_command(command: AnalysisCommands, config: &ChronoctlConfig, format: &OutputFormat) -> Result<(), CoreError> {
    let client = ChronofactClient::new(config.clone())?;
    let group_ids = config.default_group_id.clone();

    let (path, label) = match &command {
        AnalysisCommands::Timeline { component, category } => {
            let mut qs = query_string(&group_ids);
            append(&mut qs, "component", component.as_deref());
            append(&mut qs, "category", category.as_deref());
            (format!("/graph/analysis/causality-timeline{qs}"), "causality timeline")
        }
        AnalysisCommands::Recurring { min_occurrences, similarity_threshold, use_llm } => {
            let mut qs = query_string(&group_ids);
            append(&mut qs, "min_occurrences", Some(&min_occurrences.to_string()));
            append(&mut qs, "similarity_threshold", Some(&similarity_threshold.to_string()));
            append(&mut qs, "use_llm", Some(&use_llm.to_string()));
            (format!("/graph/analysis/recurring-incidents{qs}"), "recurring incidents")
        }
        AnalysisCommands::ComponentImpact { min_incidents, category_filter, component_filter } => {
            let mut qs = query_string(&group_ids);
            append(&mut qs, "min_incidents", Some(&min_incidents.to_string()));
            append(&mut qs, "category_filter", category_filter.as_deref());
            append(&mut qs, "component_filter", component_filter.as_deref());
            (format!("/graph/analysis/component-impact{qs}"), "component impact")
        }
        AnalysisCommands::ComponentSeverity { min_incidents, component_filter } => {
            let mut qs = query_string(&group_ids);
            append(&mut qs, "min_incidents", Some(&min_incidents.to_string()));
            append(&mut qs, "component_filter", component_filter.as_deref());
            (format!("/graph/analysis/component-severity{qs}"), "component severity")
        }
        AnalysisCommands::FlowMetrics { min_flow_count, category_filter } => {
            let mut qs = query_string(&group_ids);
            append(&mut qs, "min_flow_count", Some(&min_flow_count.to_string()));
            append(&mut qs, "category_filter", category_filter.as_deref());
            (format!("/graph/analysis/flow-metrics{qs}"), "flow metrics")
        }
    };

    info!("Running {} analysis", label);

    let response = client.get(&path).await?;
    let data: Value = client.handle_response(response).await?;

    output::display_value(&data, format)
}

fn query_string(group_ids: &Option<String>) -> String {
    match group_ids {
        Some(ids) => format!("?group_ids={ids}"),
        None => String::new(),
    }
}

fn append(qs: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        let separator = if qs.is_empty() { '?' } else { '&' };
        qs.push(separator);
        qs.push_str(key);
        qs.push('=');
        qs.push_str(&urlencoding_lite(value));
    }
}

/// Minimal query-value escaping; chronofact's analysis filters are plain
/// identifiers/booleans/numbers so full percent-encoding isn't warranted.
fn urlencoding_lite(value: &str) -> String {
    value.replace(' ', "%20").replace('&', "%26")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_is_empty_without_group_ids() {
        assert_eq!(query_string(&None), "");
    }

    #[test]
    fn append_uses_ampersand_after_first_param() {
        let mut qs = "?a=1".to_string();
        append(&mut qs, "b", Some("2"));
        assert_eq!(qs, "?a=1&b=2");
    }
}
