// In app/src/transport_factory.rs

use anyhow::{anyhow, Result};
use app_config::{OracleSettings, OracleTransportKind};
use oracle::{ChatCompletionsClient, ConsoleRelay, FileRelay, OracleTransport};

/// Creates the oracle transport selected in the settings.
///
/// `console` relays through stdin/stdout, `file` through the configured
/// prompt and response files, `http` through a chat-completions endpoint.
pub fn create_transport(settings: &OracleSettings) -> Result<Box<dyn OracleTransport>> {
    let transport: Box<dyn OracleTransport> = match settings.transport {
        OracleTransportKind::Console => Box::new(ConsoleRelay::stdio()),
        OracleTransportKind::File => Box::new(FileRelay::new(&settings.file)),
        OracleTransportKind::Http => {
            let http = settings
                .http
                .as_ref()
                .ok_or_else(|| anyhow!("oracle.transport is \"http\" but [oracle.http] is missing"))?;
            Box::new(ChatCompletionsClient::new(http)?)
        }
    };

    tracing::info!(transport = transport.name(), "Oracle transport selected.");
    Ok(transport)
}
