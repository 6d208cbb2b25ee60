//! Line-oriented console on stdin/stdout (or any async reader/writer).

use anyhow::Context;
use configurator_core::CommandSender;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::application::console::{execute, parse_line, ConsoleError, ConsoleOutcome};
use crate::application::session::Harness;

const PROMPT: &[u8] = b"> ";

/// Reads commands from `input` until `quit` or end of input, writing results
/// to `output`.  Command failures are reported and the loop continues.
///
/// # Errors
///
/// Returns an error only if reading `input` or writing `output` fails.
pub async fn run_console<S, R, W>(
    harness: &mut Harness<S>,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    S: CommandSender,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT).await.context("console write failed")?;
        output.flush().await.context("console flush failed")?;

        let Some(line) = lines.next_line().await.context("console read failed")? else {
            info!("console input closed");
            break;
        };

        let reply = match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => match execute(harness, command).await {
                Ok(ConsoleOutcome::Output(text)) => text,
                Ok(ConsoleOutcome::Quit) => break,
                Err(e) => {
                    warn!("console command failed: {e}");
                    format!("error: {e}")
                }
            },
            Err(ConsoleError::Usage(text)) => text,
            Err(e) => format!("error: {e}"),
        };

        output.write_all(reply.as_bytes()).await.context("console write failed")?;
        if !reply.ends_with('\n') {
            output.write_all(b"\n").await.context("console write failed")?;
        }
    }

    output.flush().await.context("console flush failed")?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::tests::RecordingSender;
    use configurator_core::DispatchOptions;
    use tokio::io::BufReader;

    async fn run(input: &str) -> (String, RecordingSender) {
        let sender = RecordingSender::default();
        let mut harness = Harness::new(sender.clone(), DispatchOptions::default());
        let mut output = Vec::new();

        run_console(&mut harness, BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        (String::from_utf8(output).unwrap(), sender)
    }

    #[tokio::test]
    async fn test_console_sends_commands_until_quit() {
        // Arrange / Act
        let (output, sender) = run("trigger\nquit\ntrigger\n").await;

        // Assert
        assert_eq!(sender.names(), vec!["elfsquad.triggerConfigurationUpdated"]);
        assert!(output.contains("sent elfsquad.triggerConfigurationUpdated"));
    }

    #[tokio::test]
    async fn test_console_stops_at_end_of_input() {
        let (_output, sender) = run("remove-linked --id lc-1").await;
        assert_eq!(sender.names(), vec!["elfsquad.removeLinkedConfiguration"]);
    }

    #[tokio::test]
    async fn test_console_reports_bad_command_and_continues() {
        let (output, sender) = run("bogus\ntrigger\n").await;

        assert!(output.contains("bogus"));
        assert_eq!(sender.names().len(), 1);
    }

    #[tokio::test]
    async fn test_console_skips_blank_lines() {
        let (output, sender) = run("\n   \nnodes\n").await;

        assert!(sender.names().is_empty());
        assert!(output.contains("Select a node"));
    }

    #[tokio::test]
    async fn test_console_reports_missing_image_file() {
        let (output, sender) = run("image --file /definitely/not/here.png\n").await;

        assert!(output.contains("error:"));
        assert!(sender.names().is_empty());
    }
}
