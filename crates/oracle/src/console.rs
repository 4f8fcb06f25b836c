// In crates/oracle/src/console.rs

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::{Error, OracleTransport, Result};

/// A line holding only this marker ends a pasted reply.
pub const END_OF_REPLY: &str = ".";

/// Manual relay: the prompt is shown to an operator, who pastes it into the
/// advisory service and pastes the reply back, ending it with a line that
/// holds only `.`.
pub struct ConsoleRelay<R, W> {
    input: R,
    output: W,
}

impl ConsoleRelay<BufReader<Stdin>, Stdout> {
    /// A relay over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> ConsoleRelay<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Drops whatever was typed before the prompt was shown, so leftovers
    /// from an earlier paste never answer this prompt.
    async fn discard_pending_input(&mut self) -> Result<()> {
        loop {
            // A zero timeout only returns data that is already available.
            let pending = match tokio::time::timeout(Duration::ZERO, self.input.fill_buf()).await {
                Ok(buf) => buf?.len(),
                Err(_) => 0,
            };
            if pending == 0 {
                return Ok(());
            }
            tracing::debug!(bytes = pending, "Discarding input typed before the prompt.");
            self.input.consume(pending);
        }
    }

    /// Reads lines up to the end marker or end of input. Leading blank lines
    /// are skipped; blank lines inside the reply are kept.
    async fn read_reply(&mut self) -> Result<String> {
        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                if lines.is_empty() {
                    return Err(Error::InputClosed);
                }
                break;
            }
            let text = line.trim_end_matches(['\r', '\n']);
            if text.trim() == END_OF_REPLY {
                break;
            }
            if lines.is_empty() && text.trim().is_empty() {
                continue;
            }
            lines.push(text.to_string());
        }

        Ok(lines.join("\n").trim().to_string())
    }
}

#[async_trait]
impl<R, W> OracleTransport for ConsoleRelay<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "Console"
    }

    async fn send_prompt(&mut self, prompt: &str) -> Result<String> {
        self.discard_pending_input().await?;

        let banner = format!(
            "\n----- PROMPT -----\n{}\n------------------\nPaste the reply, then a line with only '{}':\n",
            prompt, END_OF_REPLY
        );
        self.output.write_all(banner.as_bytes()).await?;
        self.output.flush().await?;

        let reply = self.read_reply().await?;
        tracing::debug!(chars = reply.len(), "Received reply from console.");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, DuplexStream};
    use tokio::task::JoinHandle;

    type PipedRelay = ConsoleRelay<BufReader<DuplexStream>, DuplexStream>;

    /// Plays the operator: waits for each prompt to be shown, then types the
    /// next scripted chunk. Returns everything the relay printed.
    fn operator(script: Vec<&'static str>) -> (PipedRelay, JoinHandle<String>) {
        let (mut keyboard, relay_input) = tokio::io::duplex(4096);
        let (relay_output, mut screen) = tokio::io::duplex(4096);

        let handle = tokio::spawn(async move {
            let mut shown = String::new();
            let mut buf = [0u8; 1024];
            for (i, chunk) in script.into_iter().enumerate() {
                while shown.matches("Paste the reply").count() <= i {
                    let n = screen.read(&mut buf).await.unwrap();
                    shown.push_str(&String::from_utf8_lossy(&buf[..n]));
                }
                keyboard.write_all(chunk.as_bytes()).await.unwrap();
            }
            shown
        });

        (ConsoleRelay::new(BufReader::new(relay_input), relay_output), handle)
    }

    #[tokio::test]
    async fn multi_line_reply_is_read_as_one_block() {
        let (mut relay, operator) = operator(vec!["\nBased on the data I would say\n\nHOLD\n.\n"]);

        let reply = relay.send_prompt("What now for PETR4.SA?").await.unwrap();

        assert_eq!(reply, "Based on the data I would say\n\nHOLD");
        assert!(operator.await.unwrap().contains("What now for PETR4.SA?"));
    }

    #[tokio::test]
    async fn leftovers_never_answer_the_next_prompt() {
        let (mut relay, operator) = operator(vec![
            "Based on the data I would say\nHOLD\n.\nSELL\n",
            "BUY\n.\n",
        ]);

        let first = relay.send_prompt("PETR4.SA").await.unwrap();
        let second = relay.send_prompt("VALE3.SA").await.unwrap();

        assert_eq!(first, "Based on the data I would say\nHOLD");
        assert_eq!(second, "BUY");
        operator.await.unwrap();
    }

    #[tokio::test]
    async fn closed_input_is_a_transport_failure() {
        let input: &[u8] = b"";
        let mut relay = ConsoleRelay::new(input, Vec::new());
        let err = relay.send_prompt("anything").await.unwrap_err();
        assert!(matches!(err, Error::InputClosed));

        // Input typed ahead of the prompt is discarded as well.
        let input: &[u8] = b"HOLD\n.\n";
        let mut relay = ConsoleRelay::new(input, Vec::new());
        let err = relay.send_prompt("anything").await.unwrap_err();
        assert!(matches!(err, Error::InputClosed));
    }

    #[tokio::test]
    async fn bare_end_marker_is_an_empty_reply() {
        let (mut relay, operator) = operator(vec![".\n"]);
        assert_eq!(relay.send_prompt("anything").await.unwrap(), "");
        operator.await.unwrap();
    }
}
