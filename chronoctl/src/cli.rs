//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chronoctl")]
#[command(about = "chronofact knowledge graph control tool")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// chronofact API endpoint URL
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    /// Default group_id (namespace)
    #[arg(short, long, global = true)]
    pub group_id: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check service health
    Health,
    /// Submit an episode for ingestion
    Ingest {
        /// Episode name
        #[arg(short, long)]
        name: String,
        /// Episode content (raw text, JSON blob, or message text)
        #[arg(short, long)]
        content: String,
        /// Episode source kind
        #[arg(short, long, value_enum, default_value = "text")]
        source: EpisodeSourceArg,
        /// Source description
        #[arg(long)]
        source_description: Option<String>,
        /// Source URL
        #[arg(long)]
        source_url: Option<String>,
        /// Episode UUID (for idempotent retries)
        #[arg(long)]
        uuid: Option<uuid::Uuid>,
    },
    /// Search facts, nodes, or episodes
    Search {
        /// Query text
        query: String,
        /// What to search
        #[arg(short = 't', long, value_enum, default_value = "facts")]
        search_type: SearchTypeArg,
        /// Maximum results
        #[arg(short, long, default_value = "10")]
        max_results: usize,
        /// Restrict to entity type labels
        #[arg(long)]
        entity_type: Vec<String>,
        /// Re-rank by graph distance from this node
        #[arg(long)]
        center_node_uuid: Option<uuid::Uuid>,
    },
    /// Fact operations
    Facts {
        #[command(subcommand)]
        command: FactsCommands,
    },
    /// Causality and recurrence analytics
    Analysis {
        #[command(subcommand)]
        command: AnalysisCommands,
    },
}

#[derive(Subcommand)]
pub enum FactsCommands {
    /// Correct/replace a fact, expiring the old edge and chaining citations
    Update {
        /// UUID of the current edge to correct
        uuid: uuid::Uuid,
        /// New fact text
        #[arg(short, long)]
        fact: String,
        /// New source node UUID, if it changed
        #[arg(long)]
        source_node_uuid: Option<uuid::Uuid>,
        /// New target node UUID, if it changed
        #[arg(long)]
        target_node_uuid: Option<uuid::Uuid>,
        /// Why this fact is being corrected
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AnalysisCommands {
    /// Causality timeline across episodes
    Timeline {
        #[arg(long)]
        component: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Recurring incident clusters
    Recurring {
        #[arg(long, default_value = "2")]
        min_occurrences: usize,
        #[arg(long, default_value = "0.75")]
        similarity_threshold: f32,
        #[arg(long)]
        use_llm: bool,
    },
    /// Component impact / contribution-rate breakdown
    ComponentImpact {
        #[arg(long, default_value = "2")]
        min_incidents: usize,
        #[arg(long)]
        category_filter: Option<String>,
        #[arg(long)]
        component_filter: Option<String>,
    },
    /// Component severity breakdown
    ComponentSeverity {
        #[arg(long, default_value = "2")]
        min_incidents: usize,
        #[arg(long)]
        component_filter: Option<String>,
    },
    /// CVR-style funnel metrics
    FlowMetrics {
        #[arg(long, default_value = "2")]
        min_flow_count: usize,
        #[arg(long)]
        category_filter: Option<String>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum EpisodeSourceArg {
    Text,
    Json,
    Message,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum SearchTypeArg {
    Facts,
    Nodes,
    Episodes,
}

#[derive(clap::ValueEnum, Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}
