//! `config` subcommands.

use std::io::Write;

use agent_config::{ConfigStore, PromptConfig};
use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ConfigCommand;
use crate::commands::load_session;

/// Runs one `config` action, writing human output to `out`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written. `set` refuses to
/// run on a malformed file so the file is never overwritten by accident.
pub async fn run(store: &ConfigStore, action: ConfigCommand, out: &mut impl Write) -> Result<()> {
    match action {
        ConfigCommand::Show { json } => {
            let config = load_session(store).await?;
            if json {
                let text = serde_json::to_string_pretty(&config)
                    .context("failed to encode configuration")?;
                writeln!(out, "{text}")?;
            } else {
                write_entries(&config, out)?;
            }
        }
        ConfigCommand::Set { key, value } => {
            let mut config = store.load_or_default().await.with_context(|| {
                format!("refusing to edit {}", store.path().display())
            })?;
            config.set_field(key, value);
            store.save(&config).await?;
            info!(%key, "configuration field updated");
            writeln!(out, "{key} updated in {}", store.path().display())?;
        }
        ConfigCommand::Reset => {
            store.save(&PromptConfig::default()).await?;
            writeln!(out, "{} reset to defaults", store.path().display())?;
        }
        ConfigCommand::Path => {
            writeln!(out, "{}", store.path().display())?;
        }
    }
    Ok(())
}

fn write_entries(config: &PromptConfig, out: &mut impl Write) -> std::io::Result<()> {
    for (key, value) in config.entries() {
        writeln!(out, "{key}: {value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    async fn run_to_string(store: &ConfigStore, action: ConfigCommand) -> Result<String> {
        let mut out = Vec::new();
        run(store, action, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn set_saves_and_show_reflects_it() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("prompts.json"));

        run_to_string(
            &store,
            ConfigCommand::Set {
                key: "editor.role".parse().unwrap(),
                value: "Copy Chief".into(),
            },
        )
        .await
        .unwrap();

        let shown = run_to_string(&store, ConfigCommand::Show { json: false }).await.unwrap();
        assert!(shown.contains("editor.role: Copy Chief\n"));
        assert!(shown.starts_with("planner.role: Content Planner\n"));
        assert_eq!(shown.lines().count(), 12);

        let saved = store.load().await.unwrap().unwrap();
        assert_eq!(saved.get("editor.role").unwrap(), "Copy Chief");
    }

    #[tokio::test]
    async fn show_json_is_loadable() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("prompts.json"));

        let json = run_to_string(&store, ConfigCommand::Show { json: true }).await.unwrap();
        let parsed: PromptConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, PromptConfig::default());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn malformed_file_is_shown_as_defaults_but_not_edited() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompts.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::new(&path);

        let shown = run_to_string(&store, ConfigCommand::Show { json: false }).await.unwrap();
        assert!(shown.contains("writer.role: Content Writer"));

        let err = run_to_string(
            &store,
            ConfigCommand::Set {
                key: "tasks.plan".parse().unwrap(),
                value: "x".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(format!("{err:#}").contains("malformed configuration"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn reset_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompts.json");
        std::fs::write(&path, r#"{"planner": {"role": "Someone"}}"#).unwrap();
        let store = ConfigStore::new(&path);

        run_to_string(&store, ConfigCommand::Reset).await.unwrap();

        assert_eq!(store.load().await.unwrap().unwrap(), PromptConfig::default());
    }
}
