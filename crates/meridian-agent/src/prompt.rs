// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt loading.

use meridian_config::model::AgentConfig;
use tracing::{info, warn};

/// Loads the system prompt from config.
///
/// Priority: `system_prompt_file` > inline `system_prompt` > built-in
/// economist prompt. An unreadable or empty file falls through.
pub async fn load_system_prompt(config: &AgentConfig) -> String {
    if let Some(path) = &config.system_prompt_file {
        match tokio::fs::read_to_string(path).await {
            Ok(content) if !content.trim().is_empty() => {
                info!(path = path.as_str(), "loaded system prompt from file");
                return content.trim().to_string();
            }
            Ok(_) => warn!(path = path.as_str(), "system prompt file is empty, falling back"),
            Err(e) => warn!(
                path = path.as_str(),
                error = %e,
                "failed to read system prompt file, falling back"
            ),
        }
    }

    if let Some(prompt) = &config.system_prompt
        && !prompt.trim().is_empty()
    {
        return prompt.clone();
    }

    default_prompt(&config.name)
}

fn default_prompt(name: &str) -> String {
    format!(
        "You are {name}, an economist answering questions with public statistics. \
Use the data tools to fetch figures from the World Bank, the IMF, FAOSTAT, UN Comtrade \
and Our World in Data instead of relying on memory. Prefer ISO3 country codes in tool \
arguments. Cite the source and year of every figure, say when data is missing or \
estimated, and keep answers concise."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn default_prompt_names_the_agent() {
        let config = AgentConfig {
            name: "meridian-test".to_string(),
            ..Default::default()
        };
        let prompt = load_system_prompt(&config).await;
        assert!(prompt.starts_with("You are meridian-test, an economist"));
    }

    #[tokio::test]
    async fn inline_prompt_wins_over_default() {
        let config = AgentConfig {
            system_prompt: Some("Inline prompt.".to_string()),
            ..Default::default()
        };
        assert_eq!(load_system_prompt(&config).await, "Inline prompt.");
    }

    #[tokio::test]
    async fn file_prompt_wins_over_inline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  From file.  ").unwrap();
        let config = AgentConfig {
            system_prompt: Some("Inline prompt.".to_string()),
            system_prompt_file: Some(file.path().to_string_lossy().to_string()),
            ..Default::default()
        };
        assert_eq!(load_system_prompt(&config).await, "From file.");
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_inline() {
        let config = AgentConfig {
            system_prompt: Some("Inline prompt.".to_string()),
            system_prompt_file: Some("/nonexistent/meridian/prompt.md".to_string()),
            ..Default::default()
        };
        assert_eq!(load_system_prompt(&config).await, "Inline prompt.");
    }
}
