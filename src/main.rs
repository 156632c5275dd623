use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use taskmirror::coordinator::{ConsumerMessage, Coordinator};
use taskmirror::remote::HttpTaskService;

/// Default remote API base URL; override with TASKMIRROR_API_URL.
const DEFAULT_API_URL: &str = "https://a.wunderlist.com/api/v1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let api_url =
        std::env::var("TASKMIRROR_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

    eprintln!("taskmirror v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Remote API: {}", api_url);
    eprintln!("   Send JSON messages on stdin; events are emitted on stdout.\n");

    // Credentials arrive in the CONFIG message, so the service is built
    // when the consumer configures us, not at startup.
    let factory_url = api_url.clone();
    let (coordinator, inbox) = Coordinator::new(Box::new(move |config| {
        Arc::new(HttpTaskService::new(
            factory_url.clone(),
            config.access_token.clone(),
            config.client_id.clone(),
        ))
    }));

    let mut events = coordinator.subscribe();
    let coordinator_task = tokio::spawn(coordinator.run());

    // Outbound: coordinator events → stdout, one JSON object per line.
    let writer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => println!("{json}"),
                    Err(e) => tracing::error!(error = %e, "Failed to serialize event"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Consumer lagged behind event broadcast");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            }
        }
    });

    // Inbound: stdin lines → consumer messages.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ConsumerMessage>(line) {
            Ok(message) => {
                if inbox.send(message).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed consumer message"),
        }
    }

    drop(inbox);
    coordinator_task.await?;
    writer.abort();
    Ok(())
}
