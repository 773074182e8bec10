//! Interactive tab-chat command implementation.
//!
//! Models browser tabs as sessions: each opened URL gets its own chat, and
//! switching tabs swaps the whole conversation in and out, exactly as the
//! session controller does for a real side panel.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use glimpse::config::{Config, SettingsStore};
use glimpse::content::{HttpContentProvider, PageTarget};
use glimpse::llm::GeminiProvider;
use glimpse::prompt::Verbosity;
use glimpse::session::{
    NoticeLevel, OperationGuard, Sender, SessionController, SessionStore, UiEvent, ui_channel,
};

struct Tab {
    key: String,
    url: String,
}

pub async fn run(config_path: &str, api_key_override: Option<String>) -> Result<()> {
    let mut config = Config::load(config_path)?;
    config.chat.apply_env();
    if let Some(key) = api_key_override {
        config.chat.api_key = key;
    }

    let settings = SettingsStore::new(config.chat.clone());
    let (events, mut events_rx) = ui_channel();
    let client = reqwest::Client::new();
    let controller = SessionController::new(
        SessionStore::new(),
        OperationGuard::new(),
        Arc::new(GeminiProvider::new(client.clone())),
        Arc::new(HttpContentProvider::new(client)),
        settings.clone(),
        events,
    );

    let mut tabs: Vec<Tab> = Vec::new();

    println!("Glimpse tab chat (Ctrl+C or /quit to exit)");
    println!("Commands: /open <url>  /tabs  /switch <n>  /summarize  /cancel  /close <n>  /verbosity <tier>");
    println!("Anything else is a follow-up question about the summarized page.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input == "/exit" || input == "/quit" {
            break;
        }

        if let Some(url) = input.strip_prefix("/open ") {
            let url = url.trim().to_string();
            let key = format!("tab_{}", Uuid::new_v4().simple());
            controller
                .activate(&key, PageTarget::new(url.clone()))
                .await;
            tabs.push(Tab { key, url });
            println!("Opened tab {} - use /summarize to start", tabs.len());
        } else if input == "/tabs" {
            let current = controller.current_key().await;
            if tabs.is_empty() {
                println!("No open tabs. Use /open <url> first.");
            }
            for (i, tab) in tabs.iter().enumerate() {
                let marker = if current.as_deref() == Some(&tab.key) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {} {}", i + 1, tab.url);
            }
        } else if let Some(n) = input.strip_prefix("/switch ") {
            match parse_tab_index(n, &tabs) {
                Some(i) => {
                    let target = PageTarget::new(tabs[i].url.clone());
                    controller.activate(&tabs[i].key, target).await;
                    println!("Switched to tab {}", i + 1);
                    print_history(&controller, &tabs[i].key).await;
                }
                None => println!("No such tab. Use /tabs to list them."),
            }
        } else if input == "/summarize" {
            let Some(key) = controller.current_key().await else {
                println!("No active tab. Use /open <url> first.");
                continue;
            };
            // failures surface through the notice drain below
            if controller.summarize(&key).await.is_ok() {
                print_last_reply(&controller, &key).await;
            }
        } else if input == "/cancel" {
            if let Some(key) = controller.current_key().await {
                controller.cancel(&key).await;
                println!("Cancelled. The page will need to be summarized again.");
            }
        } else if let Some(n) = input.strip_prefix("/close ") {
            match parse_tab_index(n, &tabs) {
                Some(i) => {
                    let tab = tabs.remove(i);
                    controller.close(&tab.key).await;
                    println!("Closed tab {}", i + 1);
                }
                None => println!("No such tab. Use /tabs to list them."),
            }
        } else if let Some(tier) = input.strip_prefix("/verbosity ") {
            match tier.trim().parse::<Verbosity>() {
                Ok(verbosity) => {
                    settings.update(|s| s.verbosity = verbosity).await;
                    config.chat.verbosity = verbosity;
                    if let Err(e) = config.save(config_path) {
                        println!("! could not save settings: {e}");
                    }
                    println!("Verbosity set to {verbosity}");
                }
                Err(e) => println!("! {e}"),
            }
        } else if input.starts_with('/') {
            println!("Unknown command: {input}");
        } else {
            let Some(key) = controller.current_key().await else {
                println!("No active tab. Use /open <url> first.");
                continue;
            };
            if !controller.has_page(&key).await {
                println!("Nothing summarized yet. Use /summarize first.");
                continue;
            }
            if controller.ask(&key, input).await.is_ok() {
                print_last_reply(&controller, &key).await;
            }
        }

        drain_notices(&mut events_rx);
    }

    Ok(())
}

fn parse_tab_index(raw: &str, tabs: &[Tab]) -> Option<usize> {
    let n: usize = raw.trim().parse().ok()?;
    (n >= 1 && n <= tabs.len()).then(|| n - 1)
}

async fn print_last_reply(controller: &SessionController, key: &str) {
    if let Some(message) = controller
        .history(key)
        .await
        .iter()
        .rev()
        .find(|m| m.sender == Sender::Assistant)
    {
        println!();
        println!("{}", message.text);
        println!();
    }
}

async fn print_history(controller: &SessionController, key: &str) {
    for message in controller.history(key).await {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "assistant",
        };
        println!("[{who}] {}", message.text);
    }
}

/// Print any pending error notices; other UI events are already reflected in
/// what the loop prints.
fn drain_notices(events_rx: &mut UnboundedReceiver<UiEvent>) {
    while let Ok(event) = events_rx.try_recv() {
        if let UiEvent::Notice { level, text } = event {
            match level {
                NoticeLevel::Error => println!("! {text}"),
                NoticeLevel::Info => println!("{text}"),
            }
        }
    }
}
