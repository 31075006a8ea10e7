//! `rembg` command line adapter

use crate::domain::engines::EngineError;
use crate::infra::process::run_tool;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::process::Command;

const TOOL: &str = "rembg";

#[derive(Debug, Clone)]
pub struct RembgCli {
    bin: String,
    model: String,
    timeout: Duration,
    ready: Arc<AtomicBool>,
}

impl RembgCli {
    pub fn new(bin: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            model: model.into(),
            timeout,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Fetch the model ahead of the first request
    ///
    /// On failure the adapter stays not-ready and requests get 503.
    pub async fn warm_up(&self) -> Result<(), EngineError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("d").arg(&self.model);

        run_tool(cmd, TOOL, self.timeout).await?;
        self.ready.store(true, Ordering::Release);
        tracing::info!(model = %self.model, "Background removal model ready");
        Ok(())
    }

    pub async fn remove_background(&self, input: &Path, output: &Path) -> Result<(), EngineError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("i")
            .arg("-m")
            .arg(&self.model)
            .arg(input)
            .arg(output);

        run_tool(cmd, TOOL, self.timeout).await?;

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(EngineError::Output {
                tool: TOOL.to_string(),
                message: format!("no output written to {}", output.display()),
            });
        }
        Ok(())
    }
}
