//! Scripted end-to-end harness for the chat session pipeline.
//!
//! Drives the full model-check → send → translate → summarize flow
//! against the simulated capability host, with indicatif progress bars
//! for the (simulated) model downloads. Useful as a smoke check and as
//! a reference for wiring a real frontend.

use glossa::capability::sim::SimulatedHost;
use glossa::{
    Availability, CapabilityKind, ChatEvent, ChatSession, GlossaConfig, Language, MessageStore,
    ModelStatus, ModelTracker, Role,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glossa=info")),
        )
        .init();

    println!("glossa harness v{}", env!("CARGO_PKG_VERSION"));

    // Every capability needs a (simulated) download first.
    let host = SimulatedHost::with_availability(Availability::AfterDownload);
    let store = Arc::new(MessageStore::in_memory()?);
    let tracker = ModelTracker::new(Arc::new(host.clone()));

    let bars = spawn_progress_bars(&tracker);

    let (mut session, mut events) = ChatSession::new(
        store,
        tracker,
        Arc::new(host.clone()),
        GlossaConfig::default(),
    );
    session.init().await;
    bars.clear()?;

    for kind in CapabilityKind::ALL {
        let state = session
            .tracker()
            .model_state(kind)
            .map(|s| format!("{:?}", s.status()))
            .unwrap_or_else(|| "unchecked".to_owned());
        println!("  {kind}: {state}");
    }

    // Send flow: short greeting, then a message long enough to summarize.
    session.send("Hello world, the weather is nice today").await?;

    let long_text = "The quick brown fox jumps over the lazy dog and then \
        the dog chases the fox around the field for the rest of the \
        afternoon while the farmer watches from the porch and wonders \
        when the two of them will finally tire themselves out.";
    session.send(long_text).await?;

    let user_messages: Vec<String> = session
        .messages()
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.id.clone())
        .collect();
    let [greeting_id, long_id] = user_messages.as_slice() else {
        anyhow::bail!("expected two user messages");
    };
    let greeting_id = greeting_id.clone();
    let long_id = long_id.clone();

    // Translate the greeting, and show the same-language rejection.
    session.translate(&greeting_id, Language::Spanish).await?;
    session.translate(&greeting_id, Language::English).await?;

    // Stream a summary of the long message.
    session.summarize(&long_id).await?;

    println!("\n--- transcript ---");
    for message in session.messages() {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        println!("[{role}] {}", message.content);
    }

    println!("\n--- notices ---");
    while let Ok(event) = events.try_recv() {
        if let ChatEvent::Notice(notice) = event {
            println!("{:?}: {}", notice.level, notice.text);
        }
    }

    Ok(())
}

/// One progress bar per capability, driven by tracker subscriptions.
fn spawn_progress_bars(tracker: &ModelTracker) -> MultiProgress {
    let bars = MultiProgress::new();
    let style = ProgressStyle::with_template(
        "{prefix:>12} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    for kind in CapabilityKind::ALL {
        let bar = bars.add(ProgressBar::new(0));
        bar.set_style(style.clone());
        bar.set_prefix(kind.as_str());

        tracker.subscribe(kind, move |state| match state.status() {
            ModelStatus::Downloading => {
                if let Some(progress) = state.progress() {
                    bar.set_length(progress.total);
                    bar.set_position(progress.loaded);
                }
            }
            ModelStatus::Ready => bar.finish_with_message("ready"),
            ModelStatus::Unavailable => bar.finish_with_message("unavailable"),
        });
    }
    bars
}
