// In crates/oracle/src/lib.rs

use async_trait::async_trait;

pub mod console;
pub mod error;
pub mod file_relay;
pub mod http;
pub mod stability;

// Re-export public types
pub use console::ConsoleRelay;
pub use error::{Error, Result};
pub use file_relay::FileRelay;
pub use http::ChatCompletionsClient;

/// The universal interface for reaching the advisory oracle.
///
/// A transport turns one prompt into one free-text reply. The call may block
/// for as long as the oracle needs (a person typing, a model generating);
/// any timeout policy belongs to the implementation, never to the caller.
#[async_trait]
pub trait OracleTransport: Send {
    /// The name of the transport (e.g., "Console", "ChatCompletions").
    fn name(&self) -> &'static str;

    /// Prepares the transport before the first prompt of a batch.
    async fn start_session(&mut self) -> Result<()> {
        Ok(())
    }

    /// Sends a prompt and waits for the complete reply.
    async fn send_prompt(&mut self, prompt: &str) -> Result<String>;

    /// Releases whatever `start_session` acquired.
    async fn stop_session(&mut self) -> Result<()> {
        Ok(())
    }
}
