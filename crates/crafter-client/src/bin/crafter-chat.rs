//! # crafter-chat
//!
//! Terminal front end for the guided dialog. Reads answers from stdin, shows
//! the assistant's replies and topic progress, and once the conversation is
//! complete can generate, print and export the summary.
//!
//! Commands: `/reset`, `/summary`, `/quit`.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crafter_client::{
    ClientConfig, ConversationBackend, ConversationTracker, HttpBackend, SubmitOutcome,
    SummaryEditor,
};
use crafter_shared::{Message, VideoConceptSummary, CATALOG};

fn print_message(message: &Message) {
    let speaker = if message.is_user() { "You" } else { "AI" };
    println!("{speaker}: {}\n", message.content);
}

fn print_progress<B: ConversationBackend>(tracker: &ConversationTracker<B>) {
    let topic = tracker.current_topic_index();
    println!(
        "[topic {}/{}: {}]",
        topic + 1,
        CATALOG.len(),
        CATALOG[topic].category
    );
}

fn print_list(label: &str, items: &[String]) {
    println!("{label}:");
    for item in items {
        println!("  - {item}");
    }
}

fn print_summary(summary: &VideoConceptSummary) {
    println!("=== {} ===", summary.video_title_suggestion);
    println!("Core concept: {}", summary.core_concept);
    println!("Audience: {}", summary.target_audience.description);
    print_list("Takeaways", &summary.target_audience.key_takeaways);
    print_list("Key messages", &summary.key_messages);
    println!("Style: {}", summary.visual_elements.style);
    println!("Mood: {}", summary.visual_elements.mood_tone);
    println!("Palette: {}", summary.visual_elements.color_palette);
    print_list("Imagery", &summary.visual_elements.imagery_suggestions);
    println!("Outline:");
    for (i, part) in summary.content_structure_outline.iter().enumerate() {
        println!("  {}. {}: {}", i + 1, part.section, part.description);
    }
    if let Some(notes) = summary.meaningful_notes() {
        println!("Notes: {notes}");
    }
    println!();
}

async fn summarize(tracker: &mut ConversationTracker<HttpBackend>) -> anyhow::Result<()> {
    let summary = tracker.generate_summary().await?;
    print_summary(&summary);

    let editor = SummaryEditor::new(tracker.session_id().clone(), summary);
    println!("{}", editor.status_line());
    if let Some(problem) = editor.duration_error() {
        println!("Note: {problem}");
    }

    let bytes = tracker
        .backend()
        .summary_pdf(editor.summary())
        .await
        .context("failed to export PDF")?;
    let path = format!("{}.pdf", editor.summary().file_stem());
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to write {path}"))?;
    println!("Saved {path}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("crafter_client=debug,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // -----------------------------------------------------------------------
    // 2. Connect to the server
    // -----------------------------------------------------------------------
    let config = ClientConfig::from_env();
    info!(server = %config.server_url, "Using ConceptCrafter server");
    let mut tracker = ConversationTracker::new(HttpBackend::new(config.server_url));

    for message in tracker.messages() {
        print_message(message);
    }

    // -----------------------------------------------------------------------
    // 3. Read answers until EOF or /quit
    // -----------------------------------------------------------------------
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/reset" => {
                tracker.reset();
                println!("--- new conversation ---\n");
                for message in tracker.messages() {
                    print_message(message);
                }
                continue;
            }
            "/summary" => {
                if let Err(e) = summarize(&mut tracker).await {
                    println!("Could not generate summary: {e:#}\n");
                }
                continue;
            }
            _ => {}
        }

        match tracker.submit(&line).await {
            Ok(outcome) => {
                if let Some(reply) = tracker.messages().last() {
                    print_message(reply);
                }
                match outcome {
                    SubmitOutcome::Replied => print_progress(&tracker),
                    SubmitOutcome::Completed => {
                        println!("Conversation complete. Type /summary for the summary.\n")
                    }
                    SubmitOutcome::SafetyBlocked => {
                        println!("This conversation is blocked. Type /reset to start over.\n")
                    }
                    SubmitOutcome::Failed(_) => {}
                }
            }
            Err(e) => println!("{e}\n"),
        }
    }

    Ok(())
}
