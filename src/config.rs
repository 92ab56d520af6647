use std::path::PathBuf;

use clap::Parser;

use crate::chart::LabelPolicy;

pub const DEFAULT_DATASET: &str = "usda_food_access_sample.csv";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Food desert analysis dashboard for census tract data.
///
/// The assistant's API key is entered in the window and never read from the
/// command line or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "insight-bridge", version, about)]
pub struct Args {
    /// Tract dataset (.csv, .tsv, .json or .parquet).
    #[arg(default_value = DEFAULT_DATASET)]
    pub data: PathBuf,

    /// Chat-completion endpoint (any OpenAI-compatible server).
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Model name sent with each question.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Upper bound on the answer length, in tokens.
    #[arg(long, default_value_t = 500)]
    pub max_tokens: u32,

    /// Give up on the assistant after this many seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Label pie wedges only with the categories present.
    #[arg(long)]
    pub corrected_labels: bool,
}

impl Args {
    pub fn assistant(&self) -> AssistantConfig {
        AssistantConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn label_policy(&self) -> LabelPolicy {
        if self.corrected_labels {
            LabelPolicy::Corrected
        } else {
            LabelPolicy::Compatible
        }
    }
}

/// Settings for the chat-completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["insight-bridge"]);
        assert_eq!(args.data, PathBuf::from(DEFAULT_DATASET));
        assert_eq!(args.assistant(), AssistantConfig::default());
        assert_eq!(args.label_policy(), LabelPolicy::Compatible);
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "insight-bridge",
            "tracts.parquet",
            "--model",
            "gpt-4o-mini",
            "--endpoint",
            "http://localhost:11434/v1/chat/completions",
            "--corrected-labels",
        ]);
        assert_eq!(args.data, PathBuf::from("tracts.parquet"));
        assert_eq!(args.assistant().model, "gpt-4o-mini");
        assert!(args.assistant().endpoint.starts_with("http://localhost"));
        assert_eq!(args.label_policy(), LabelPolicy::Corrected);
    }

    #[test]
    fn parser_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
