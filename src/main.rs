use std::error::Error;
use std::sync::Arc;

use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::presenter::{DisplayState, Presenter};
use crate::sentiment::{Classifier, SentimentClient};

mod api;
mod config;
mod presenter;
mod sentiment;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 1️⃣ Load config
    let cfg = Config::from_env()?;

    // Logging
    simple_logger::SimpleLogger::new()
        .with_level(cfg.log_level)
        .init()?;

    // 2️⃣ Build the client for the configured backend
    let classifier: Arc<dyn Classifier> = Arc::new(SentimentClient::from_config(&cfg)?);

    // 3️⃣ Serve the HTTP API, or read from the terminal
    match &cfg.serve_addr {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("API listening on {}", listener.local_addr()?);
            axum::serve(listener, api::create_router(classifier)).await?;
        }
        None => {
            let args: Vec<String> = std::env::args().skip(1).collect();
            if args.is_empty() {
                run_terminal(classifier).await?;
            } else {
                run_once(classifier, &args.join(" ")).await;
            }
        }
    }

    Ok(())
}

async fn run_terminal(classifier: Arc<dyn Classifier>) -> anyhow::Result<()> {
    let mut presenter = Presenter::new(classifier);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Enter text to analyze (Ctrl-C cancels a request or quits, Ctrl-D quits):");
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        if let Err(e) = presenter.submit(&line) {
            println!("{}", e);
            continue;
        }
        render(presenter.state(), presenter.button_label());

        let state = presenter
            .wait_or_cancel(tokio::signal::ctrl_c())
            .await
            .clone();
        if state == DisplayState::Idle {
            println!("Cancelled");
            continue;
        }
        render(&state, presenter.button_label());
    }

    Ok(())
}

/// Classifies text given on the command line and prints the final state.
async fn run_once(classifier: Arc<dyn Classifier>, text: &str) {
    let mut presenter = Presenter::new(classifier);
    if let Err(e) = presenter.submit(text) {
        println!("{}", e);
        return;
    }
    let state = presenter.wait().await.clone();
    render(&state, presenter.button_label());
}

fn render(state: &DisplayState, button: &str) {
    println!("[{}] {}  ({})", state.background(), state.label(), button);
    if let Some(notice) = state.notice() {
        println!("! {}", notice);
    }
}
