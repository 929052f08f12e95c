use readmegen_core::event::clean_model_output;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::gemini;
use tokio::sync::mpsc;

use crate::prelude::*;

fn create_client(api_key: &str) -> Result<gemini::Client> {
    gemini::Client::builder()
        .api_key(api_key)
        .build()
        .map_err(|e| eyre!("Failed to create Gemini client: {}", e))
}

/// Spawn the detached generation task for one request.
///
/// The task builds its own backend client, performs exactly one generation
/// call, and then closes both channels. Non-empty output arrives as a single
/// cleaned chunk on the first channel; any failure arrives as a single report
/// on the second. No retries.
pub fn spawn_generation(
    api_key: String,
    model: String,
    system_instruction: String,
    user_prompt: String,
) -> (mpsc::Receiver<String>, mpsc::Receiver<Report>) {
    let (chunk_tx, chunk_rx) = mpsc::channel::<String>(4);
    let (error_tx, error_rx) = mpsc::channel::<Report>(1);

    tokio::spawn(async move {
        let client = match create_client(&api_key) {
            Ok(client) => client,
            Err(err) => {
                log::error!("Failed to create Gemini client: {err}");
                let _ = error_tx.send(err).await;
                return;
            }
        };

        let agent = client
            .agent(&model)
            .preamble(&system_instruction)
            .build();

        match agent.prompt(&user_prompt).await {
            Ok(response) => {
                let clean = clean_model_output(&response);
                if !clean.is_empty() {
                    let _ = chunk_tx.send(clean).await;
                }
            }
            Err(err) => {
                log::error!("Generate content error: {err}");
                let _ = error_tx
                    .send(eyre!("Model generation failed: {}", err))
                    .await;
            }
        }
    });

    (chunk_rx, error_rx)
}
