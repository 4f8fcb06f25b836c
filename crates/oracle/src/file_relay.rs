// In crates/oracle/src/file_relay.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use app_config::FileRelaySettings;
use async_trait::async_trait;

use crate::stability::wait_until_stable;
use crate::{OracleTransport, Result};

/// Relay through two files: the prompt is written to `prompt_path` for an
/// external agent (a person, a browser script) and the reply is picked up
/// from `response_path` once its contents stop changing.
#[derive(Debug, Clone)]
pub struct FileRelay {
    prompt_path: PathBuf,
    response_path: PathBuf,
    poll_interval: Duration,
    max_polls: u32,
}

impl FileRelay {
    pub fn new(settings: &FileRelaySettings) -> Self {
        Self {
            prompt_path: PathBuf::from(&settings.prompt_path),
            response_path: PathBuf::from(&settings.response_path),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            max_polls: settings.max_polls,
        }
    }

    pub fn prompt_path(&self) -> &Path {
        &self.prompt_path
    }

    pub fn response_path(&self) -> &Path {
        &self.response_path
    }
}

/// Writes `prompt` to `path`, creating parent directories as needed.
pub async fn save_prompt(path: &Path, prompt: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, prompt).await?;
    Ok(())
}

async fn read_if_present(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl OracleTransport for FileRelay {
    fn name(&self) -> &'static str {
        "FileRelay"
    }

    async fn send_prompt(&mut self, prompt: &str) -> Result<String> {
        // A reply left over from an earlier run must not answer this prompt.
        remove_if_present(&self.response_path).await?;
        save_prompt(&self.prompt_path, prompt).await?;

        tracing::info!(
            prompt = %self.prompt_path.display(),
            response = %self.response_path.display(),
            "Prompt written; waiting for reply file."
        );

        let response_path = self.response_path.clone();
        let reply = wait_until_stable(
            || read_if_present(&response_path),
            self.poll_interval,
            self.max_polls,
        )
        .await?;

        remove_if_present(&self.response_path).await?;
        Ok(reply.trim().to_string())
    }
}
