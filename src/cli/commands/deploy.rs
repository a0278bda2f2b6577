//! `pmg deploy`: run a deploy by hand
//!
//! Goes through the same controller as a webhook delivery, so the result is
//! identical to pushing the repository.

use anyhow::Result;

use crate::cli::Output;
use crate::config::Settings;
use crate::hook::{SshHookController, WebhookPayload};

/// Execute the deploy command
pub async fn execute(settings: &Settings, repository: &str, output: &Output) -> Result<()> {
    let payload = WebhookPayload::new(repository)?;

    for warning in settings.validate()? {
        output.warning(&warning);
    }

    output.step(&format!("Deploying {}", payload.full_name()));
    let controller = SshHookController::from_settings(settings);
    controller.handle_payload(&payload).await;

    output.success("Deploy finished, per-server results are in the log");
    Ok(())
}
