//! Command line definition.

use std::path::PathBuf;

use agent_config::{DEFAULT_CONFIG_PATH, FieldKey, Temperature};
use agent_telemetry::tracing_support::Verbosity;
use clap::{ArgAction, Args, Parser, Subcommand};

/// Generate research articles from transcripts.
#[derive(Debug, Parser)]
#[command(name = "article-generator", author, version, about, long_about = None)]
pub struct Cli {
    /// Prompt configuration file
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Action to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Logging verbosity selected by `-v`/`-q`.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::new(self.verbose, self.quiet)
    }
}

/// Top-level actions.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect or edit the prompt configuration
    Config {
        /// Configuration action
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Generate an article from a transcript
    Generate(GenerateArgs),
}

/// `config` subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show {
        /// Print as JSON instead of `key: value` lines
        #[arg(long)]
        json: bool,
    },
    /// Set one field (e.g. `writer.goal`) and save
    Set {
        /// Dotted field key
        key: FieldKey,
        /// New value
        value: String,
    },
    /// Overwrite the file with the built-in defaults
    Reset,
    /// Print the configuration file path
    Path,
}

/// Arguments of the generate action.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Transcript text file
    #[arg(long, value_name = "FILE")]
    pub transcript: Option<PathBuf>,

    /// Sampling temperature shared by all agents (0.0 to 1.0)
    #[arg(long, default_value_t = Temperature::DEFAULT)]
    pub temperature: Temperature,

    /// Session-only field edit, repeatable
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub sets: Vec<(FieldKey, String)>,

    /// Persist the `--set` edits before generating
    #[arg(long)]
    pub save: bool,

    /// Write the article to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Never ask for the API key on the terminal
    #[arg(long)]
    pub no_prompt: bool,
}

fn parse_assignment(raw: &str) -> Result<(FieldKey, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim().parse::<FieldKey>().map_err(|err| err.to_string())?;
    Ok((key, value.to_owned()))
}

#[cfg(test)]
mod tests {
    use agent_config::AgentField;
    use agent_primitives::{AgentRole, TaskKind};
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_edits() {
        let cli = Cli::try_parse_from([
            "article-generator",
            "--config",
            "custom.json",
            "generate",
            "--transcript",
            "talk.txt",
            "--temperature",
            "0.2",
            "--set",
            "writer.goal=Write tersely",
            "--set",
            "tasks.edit=Proofread=carefully",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("custom.json"));
        assert_eq!(cli.verbosity(), Verbosity::new(2, false));
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.temperature.value(), 0.2);
        assert_eq!(
            args.sets,
            vec![
                (FieldKey::Agent(AgentRole::Writer, AgentField::Goal), "Write tersely".to_owned()),
                (FieldKey::Task(TaskKind::Edit), "Proofread=carefully".to_owned()),
            ]
        );
    }

    #[test]
    fn defaults_apply() {
        let cli = Cli::try_parse_from(["article-generator", "generate"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(args.transcript.is_none());
        assert_eq!(args.temperature, Temperature::DEFAULT);
    }

    #[test]
    fn rejects_out_of_range_temperature_and_unknown_keys() {
        assert!(Cli::try_parse_from(["article-generator", "generate", "--temperature", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["article-generator", "generate", "--set", "critic.role=x"]).is_err());
        assert!(Cli::try_parse_from(["article-generator", "config", "set", "tasks.review", "x"]).is_err());
        assert!(Cli::try_parse_from(["article-generator", "-q", "-v", "config", "path"]).is_err());
    }
}
