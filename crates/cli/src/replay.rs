use luasense_api::models::{CompletionRequest, DocumentId};
use luasense_core::ServiceConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Text typed since the last `:` or `.` on the current line.
fn text_after_keyword(prefix: &str) -> &str {
    let line = prefix.rsplit('\n').next().unwrap_or(prefix);
    match line.rfind([':', '.']) {
        Some(pos) => &line[pos + 1..],
        None => "",
    }
}

pub async fn run(
    config: ServiceConfig,
    file: PathBuf,
    delay_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&file)?;
    let (service, mut rx) = luasense_runtime::build_default_service(&config)?;
    let document = DocumentId::new(file.display().to_string());
    service.open_document(document.clone());

    let mut keystrokes = 0u64;
    let mut last_generation = 0;
    for (index, ch) in text.char_indices() {
        let end = index + ch.len_utf8();
        let prefix: Arc<str> = Arc::from(&text[..end]);
        let request = CompletionRequest::new(prefix.clone(), end)
            .with_constant(ch == '.')
            .with_function_parameters(ch == '(' || ch == ',')
            .with_text_after_keyword(text_after_keyword(&prefix));
        last_generation = service.request(&document, request);
        keystrokes += 1;

        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    if keystrokes == 0 {
        println!("Nothing to replay: {} is empty.", file.display());
        return Ok(());
    }

    let mut runs = std::collections::BTreeSet::new();
    loop {
        let Ok(Some(notification)) = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await
        else {
            return Err("timed out waiting for the final keystroke's events".into());
        };
        runs.insert(notification.generation);
        println!("{}", serde_json::to_string(&notification)?);
        if notification.generation == last_generation {
            // The rest of the final run's events are already queued.
            while let Ok(next) = rx.try_recv() {
                println!("{}", serde_json::to_string(&next)?);
            }
            break;
        }
    }

    info!(
        "Replayed {} keystrokes; {} runs emitted events",
        keystrokes,
        runs.len()
    );
    eprintln!("{} keystrokes, {} runs emitted events", keystrokes, runs.len());
    Ok(())
}
