//! `pmg hook`: run the webhook API

use anyhow::Result;
use std::sync::Arc;

use crate::cli::Output;
use crate::config::Settings;
use crate::hook::SshHookController;
use crate::server;

/// Execute the hook command
pub async fn execute(mut settings: Settings, listen: Option<String>, output: &Output) -> Result<()> {
    if let Some(listen) = listen {
        settings.hook.listen = listen;
    }

    for warning in settings.validate()? {
        tracing::warn!("{warning}");
    }
    let addr = settings.listen_addr()?;

    output.step(&format!(
        "Deploying to {} puppet server(s), repositories under {}",
        settings.hook.puppetservers.len(),
        settings.hook.githome.display()
    ));

    let controller = Arc::new(SshHookController::from_settings(&settings));
    server::serve(addr, controller).await
}
