use anyhow::Context;
use dsn_client::app::{App, AppEvent, AppState, Command};
use dsn_client::config::Config;
use dsn_client::ledger::EthLedger;
use dsn_client::provider::RpcProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_owned());
    let config = Config::load(&PathBuf::from(&config_path))?;

    let provider = Arc::new(RpcProvider::connect(&config.rpc_url)?);
    let binding = config.binding()?;
    let ledger = Arc::new(EthLedger::new(&binding, provider.client()));

    let app = App::new(provider, Some(ledger));
    let commands = app.command_sender();
    let mut events = app.event_receiver();
    let app_task = tokio::spawn(app.run());

    // Minimal text shell: every typed line is composed and submitted,
    // state snapshots and notices are printed as they arrive.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        select! {
            event = events.recv() => {
                match event {
                    Ok(AppEvent::State(state)) => render(&state),
                    Ok(AppEvent::Notice(notice)) => println!("! {}", notice),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            line = lines.next_line() => {
                match line.context("reading stdin")? {
                    Some(line) => {
                        commands.send(Command::SetComposingText(line)).await?;
                        commands.send(Command::Submit).await?;
                    }
                    None => {
                        commands.send(Command::Shutdown).await?;
                        break;
                    }
                }
            }
        }
    }

    app_task.await?;
    Ok(())
}

fn render(state: &AppState) {
    if state.loading {
        println!("loading ledger data...");
        return;
    }
    match state.account {
        Some(account) => println!("account: {:?}", account),
        None => println!("account: none"),
    }
    if state.is_submitting {
        println!("posting...");
        return;
    }
    if state.feed.is_empty() {
        println!("no posts yet");
    }
    for post in &state.feed {
        println!("[{}] {:?}: {}", post.timestamp, post.author, post.content);
    }
}
