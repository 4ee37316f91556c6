use std::io::BufRead;
use std::time::Instant;

use neuri::api::ApiClient;
use neuri::config::NeuriConfig;
use neuri::voice::{InboundEvent, SdkError, VoiceScreen, VoiceSdk};
use serde::Deserialize;

/// A replay line: either an SDK event or something the user did on screen.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Event(InboundEvent),
    Action(UserAction),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum UserAction {
    RemoveSuggestion { ui_id: String },
    CompleteTask { ui_id: String },
    SetEnabled { ui_id: String, enabled: bool },
    FocusLost,
}

/// Stand-in SDK for replays: commands are logged, events come from the file.
struct ReplaySdk;

impl VoiceSdk for ReplaySdk {
    async fn start(&mut self, assistant_id: &str) -> Result<(), SdkError> {
        log::info!("replay: start({})", assistant_id);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SdkError> {
        log::info!("replay: stop()");
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), SdkError> {
        log::info!("replay: set_muted({})", muted);
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) -> Result<(), SdkError> {
        log::info!("replay: set_paused({})", paused);
        Ok(())
    }
}

fn install_logger(config: &NeuriConfig) {
    // Logs go to the systemd user journal (`journalctl --user -t neuri-replay -f`).
    // Wrapper filters: neuri crate at info/debug (per config), everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            let target = metadata.target();
            if target.starts_with("neuri") {
                let max = if neuri::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    neuri::set_debug_logging(config.debug_logging);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(j) => j.with_syslog_identifier("neuri-replay".to_string()),
        Err(e) => {
            eprintln!("Journal unavailable, logging disabled: {}", e);
            return;
        }
    };
    if let Err(e) = log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })) {
        eprintln!("Failed to install logger: {}", e);
        return;
    }
    // Global max must be Debug so neuri debug logs can pass through when toggled
    log::set_max_level(log::LevelFilter::Debug);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = NeuriConfig::load();
    install_logger(&config);

    let args: Vec<String> = std::env::args().collect();
    let dispatch = args.iter().any(|a| a == "--dispatch");
    let Some(path) = args.iter().skip(1).find(|a| !a.starts_with("--")) else {
        eprintln!("usage: neuri-replay <events.jsonl> [--dispatch]");
        std::process::exit(2);
    };

    let file = std::fs::File::open(path)?;
    let mut screen = VoiceScreen::new(ReplaySdk, &config);
    screen.mount().await;

    for (n, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: ReplayLine = match serde_json::from_str(&line) {
            Ok(l) => l,
            Err(e) => {
                log::warn!("Skipping line {}: {}", n + 1, e);
                continue;
            }
        };
        match parsed {
            ReplayLine::Event(event) => {
                let created = screen.dispatch(&event, chrono::Utc::now(), Instant::now());
                for item in created {
                    println!("+ {} {}", item.kind.as_str(), item.ui_id);
                }
            }
            ReplayLine::Action(action) => {
                let r = screen.reconciler_mut();
                let applied = match &action {
                    UserAction::RemoveSuggestion { ui_id } => r.remove_suggestion(ui_id),
                    UserAction::CompleteTask { ui_id } => r.complete_task(ui_id),
                    UserAction::SetEnabled { ui_id, enabled } => r.set_enabled(ui_id, *enabled),
                    UserAction::FocusLost => {
                        r.on_focus_lost();
                        true
                    }
                };
                if !applied {
                    println!("! {:?} had no effect", action);
                }
            }
        }
    }

    let r = screen.reconciler();
    println!("\n=== Tasks ({}) ===", r.tasks().len());
    for t in r.tasks() {
        println!("  [{}] {} ({})", t.id, t.title, t.date);
    }
    println!("=== Routines ({}) ===", r.routines().len());
    for rt in r.routines() {
        println!("  [{}] {} {} {}", rt.id, rt.emoji, rt.title, rt.frequency);
    }
    println!("=== Notes ({}) ===", r.notes().len());
    for note in r.notes() {
        println!("  [{}] {}", note.id, note.title);
        for line in &note.body {
            println!("      {}", line);
        }
    }
    println!("=== Reminders ({}) ===", r.reminders().len());
    for rem in r.reminders() {
        println!("  [{}] {} at {} on {}", rem.id, rem.title, rem.time, rem.date);
    }
    println!("=== Tool responses ({}) ===", r.tool_responses().len());
    for resp in r.tool_responses().iter() {
        println!("  {} - {}", resp.timestamp, resp.kind.as_deref().unwrap_or("?"));
    }
    println!("\nCall state: {:?}", screen.call().state());

    if dispatch && !r.outbox().is_empty() {
        let client = ApiClient::from_config(&config)?;
        let report = screen.flush(&client).await;
        println!(
            "Backend calls: {} succeeded, {} failed",
            report.succeeded, report.failed
        );
    }

    screen.unmount().await;
    Ok(())
}
