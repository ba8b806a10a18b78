use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use citemark::{Citation, RenderTree};
use studio::{MessageId, Script, StreamEvent, Studio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::config::{Config, read_source};

/// Interactive loop: each stdin line is sent to the studio and the reply is
/// printed as it streams. `/new` starts a fresh conversation.
pub fn run(script_path: &Path, config: &Config) -> i32 {
    let script = match read_source(script_path)
        .map_err(|e| e.to_string())
        .and_then(|text| Script::from_toml(&text).map_err(|e| e.to_string()))
    {
        Ok(script) => script,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: cannot start runtime: {}", e);
            return 1;
        }
    };

    let studio = Studio::new(script, config.studio.clone());
    runtime.block_on(chat_loop(studio))
}

async fn chat_loop(studio: Studio) -> i32 {
    let mut events = studio.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return 0,
            Err(e) => {
                eprintln!("error: cannot read stdin: {}", e);
                return 1;
            }
        };

        match line.trim() {
            "" => {}
            "/new" => {
                let id = studio.new_conversation("New conversation").await;
                eprintln!("started {}", id);
            }
            text => match studio.send(text).await {
                Ok(reply) => {
                    print_reply(&mut events, reply).await;
                    print_sources(&studio, reply).await;
                }
                Err(e) => eprintln!("error: {}", e),
            },
        }
        prompt();
    }
}

fn prompt() {
    eprint!("> ");
    let _ = std::io::stderr().flush();
}

/// Print chunks for `reply` until it finishes or is cancelled.
async fn print_reply(events: &mut broadcast::Receiver<StreamEvent>, reply: MessageId) {
    let mut out = std::io::stdout();
    loop {
        match events.recv().await {
            Ok(StreamEvent::Chunk { message_id, text }) if message_id == reply => {
                let _ = write!(out, "{}", text);
                let _ = out.flush();
            }
            Ok(StreamEvent::Finished { message_id } | StreamEvent::Cancelled { message_id })
                if message_id == reply =>
            {
                let _ = writeln!(out);
                return;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "chat output lagged behind the stream");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn print_sources(studio: &Studio, reply: MessageId) {
    let Some(message) = studio.message(reply).await else {
        return;
    };
    let tree = citemark::render(&message.content, &message.citations);
    for citation in cited_sources(&tree) {
        println!(
            "  [{}] {} {}",
            citation.id, citation.document_title, citation.section
        );
    }
}

/// Resolved citations in order of first appearance, each listed once.
fn cited_sources(tree: &RenderTree) -> Vec<&Citation> {
    let mut seen = BTreeSet::new();
    tree.citations()
        .into_iter()
        .filter_map(|chip| chip.citation())
        .filter(|citation| seen.insert(citation.id.clone()))
        .collect()
}
