//! Terminal input for the interactive credential source.

use std::io;

use agent_config::Prompter;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Prompts on stderr and reads one line from stdin.
///
/// Input is echoed; pipe the key in or set `AZURE_OPENAI_API_KEY` to keep it
/// off the screen.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn prompt_secret(&self, message: &str) -> io::Result<String> {
        let mut stderr = tokio::io::stderr();
        stderr.write_all(message.as_bytes()).await?;
        stderr.flush().await?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }
}
