//! `pmg classify`: dry run of a push

use anyhow::Result;

use crate::cli::Output;
use crate::config::Settings;
use crate::hook::{SshHookController, WebhookPayload};

/// Execute the classify command
pub async fn execute(settings: &Settings, repository: &str, output: &Output) -> Result<()> {
    let payload = WebhookPayload::new(repository)?;
    let controller = SshHookController::from_settings(settings);
    let classification = controller.classify(payload.full_name()).await?;

    output.header(&format!("📦 {}", payload.full_name()));

    if !classification.diagnostics.is_empty() {
        output.category("Diagnostics");
        for diagnostic in &classification.diagnostics {
            output.warning(&diagnostic.to_string());
        }
    }

    if classification.is_empty() {
        output.blank_line();
        output.info("Nothing to deploy");
        return Ok(());
    }

    output.category("Deploys");
    for trigger in &classification.triggers {
        output.key_value(
            &format!("{}:", trigger.category()),
            &trigger.command(&controller.targets().r10k),
            true,
        );
    }

    output.category("Puppet servers");
    if controller.targets().hosts.is_empty() {
        output.warning("No puppet servers configured");
    }
    for host in &controller.targets().hosts {
        output.list_item(host);
    }

    Ok(())
}
