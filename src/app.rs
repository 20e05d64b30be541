use super::error::ClientError;
use super::feed;
use super::ledger::{Ledger, Post};
use super::provider::{ProviderEvent, SigningProvider};
use super::session::{Session, SessionChange};
use super::submitter;
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::select;
use tokio::sync::{broadcast, mpsc};

/// Intents accepted from the presentation shell.
#[derive(Debug)]
pub enum Command {
    /// (Re)establish the provider session and pull the feed.
    Connect,
    /// Replace the composing buffer.
    SetComposingText(String),
    /// Submit the composing buffer as a new post.
    Submit,
    Shutdown,
}

/// Snapshot of everything the presentation shell renders. Emitted after
/// every observable mutation.
#[derive(Debug, Clone)]
pub struct AppState {
    pub account: Option<ethers::types::Address>,
    pub loading: bool,
    pub feed: Vec<Post>,
    pub composing_text: String,
    pub is_submitting: bool,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    State(AppState),
    /// User-visible feedback for a failure caught at this boundary.
    Notice(String),
}

/// The application actor. Owns the session, the in-memory feed and the
/// composing state; `run` processes shell intents and provider-pushed
/// events one at a time, so feed mutations are synchronous once remote
/// data is in hand.
pub struct App {
    session: Session,
    ledger: Option<Arc<dyn Ledger>>,

    feed: Vec<Post>,
    composing_text: String,
    is_submitting: bool,
    loading: bool,

    command_sender: mpsc::Sender<Command>,
    command_receiver: mpsc::Receiver<Command>,
    event_sender: broadcast::Sender<AppEvent>,
}

impl App {
    pub fn new(provider: Arc<dyn SigningProvider>, ledger: Option<Arc<dyn Ledger>>) -> Self {
        let (command_sender, command_receiver) = mpsc::channel(10);
        let (event_sender, _) = broadcast::channel(20);

        Self {
            session: Session::new(provider),
            ledger,
            feed: Vec::new(),
            composing_text: String::new(),
            is_submitting: false,
            loading: true,
            command_sender,
            command_receiver,
            event_sender,
        }
    }

    pub fn command_sender(&self) -> mpsc::Sender<Command> {
        self.command_sender.clone()
    }

    pub fn event_receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.event_sender.subscribe()
    }

    /// Runs until shutdown. The provider event subscription lives exactly
    /// as long as this loop; dropping it on return is the unsubscription.
    pub async fn run(mut self) {
        let mut provider_events = self.session.subscribe();

        self.startup().await;

        loop {
            select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(Command::Shutdown) | None => return,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                event = provider_events.recv() => {
                    match event {
                        Ok(event) => self.handle_provider_event(event).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("(app) provider events lagged, skipped {}", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => return,
                    }
                }
            }
        }
    }

    /// Mount flow: connect the session, then pull the full feed once.
    /// Loading clears even when connect fails; the failure becomes a
    /// notice, never a fault.
    async fn startup(&mut self) {
        self.loading = true;
        self.emit_state();

        match self.session.connect().await {
            Ok(_) => self.reload_feed().await,
            Err(e) => {
                error!("(app) connect failed: {}", e);
                self.notice(e.user_message());
            }
        }

        self.loading = false;
        self.emit_state();
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect => self.startup().await,
            Command::SetComposingText(text) => {
                self.composing_text = text;
                self.emit_state();
            }
            Command::Submit => self.submit().await,
            Command::Shutdown => {}
        }
    }

    async fn handle_provider_event(&mut self, event: ProviderEvent) {
        match self.session.apply_event(&event) {
            SessionChange::Reset => {
                // Chain switched: everything derived from the old chain is
                // stale. Discard and restart from connect.
                self.feed.clear();
                self.is_submitting = false;
                self.loading = true;
                self.emit_state();
                self.startup().await;
            }
            SessionChange::AccountSwitched(_) => {
                // The feed is attributable to the ledger, not the viewer.
                self.emit_state();
            }
            SessionChange::Disconnected => {
                self.notice(ClientError::NoActiveAccount.user_message());
                self.emit_state();
            }
        }
    }

    /// Replaces the feed with ledger truth. On failure the prior feed
    /// stays authoritative.
    async fn reload_feed(&mut self) {
        let ledger = match self.ledger.clone() {
            Some(ledger) => ledger,
            None => {
                self.notice(ClientError::NoBinding.user_message());
                return;
            }
        };
        match feed::reload(ledger.as_ref()).await {
            Ok(feed) => self.feed = feed,
            Err(e) => {
                error!("(app) feed reload failed: {}", e);
                self.notice(e.user_message());
            }
        }
    }

    async fn submit(&mut self) {
        if self.is_submitting {
            // Advisory debounce only; the shell should have disabled the
            // control already.
            debug!("(app) submission already in flight, dropping intent");
            return;
        }
        let ledger = match self.ledger.clone() {
            Some(ledger) => ledger,
            None => {
                self.notice(ClientError::NoBinding.user_message());
                return;
            }
        };

        self.is_submitting = true;
        self.emit_state();

        let result = submitter::submit(&mut self.session, ledger.as_ref(), &self.composing_text).await;
        self.is_submitting = false;

        match result {
            Ok(post) => {
                // Optimistic prepend; a later reload replaces the whole
                // feed with ledger truth.
                self.feed.insert(0, post);
                self.composing_text.clear();
            }
            Err(e) => {
                error!("(app) submission failed: {}", e);
                // The typed content stays in the buffer for retry.
                self.notice(e.user_message());
            }
        }
        self.emit_state();
    }

    fn snapshot(&self) -> AppState {
        AppState {
            account: self.session.account(),
            loading: self.loading,
            feed: self.feed.clone(),
            composing_text: self.composing_text.clone(),
            is_submitting: self.is_submitting,
        }
    }

    fn emit_state(&self) {
        if self.event_sender.send(AppEvent::State(self.snapshot())).is_err() {
            debug!("(app) no state subscribers");
        }
    }

    fn notice(&self, message: String) {
        if self.event_sender.send(AppEvent::Notice(message)).is_err() {
            debug!("(app) no notice subscribers");
        }
    }
}
