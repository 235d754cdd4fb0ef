//! Interactive confirmation on the terminal.

use async_trait::async_trait;
use campus_sync::ConfirmationGate;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes` declines.
pub struct TerminalPrompt;

#[async_trait]
impl ConfirmationGate for TerminalPrompt {
    async fn confirm(&self, message: &str) -> bool {
        let mut stderr = tokio::io::stderr();
        if stderr
            .write_all(format!("{} [y/N] ", message).as_bytes())
            .await
            .is_err()
        {
            return false;
        }
        let _ = stderr.flush().await;

        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut answer).await {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
