//! Client for an append-only ledger of social posts hosted by a deployed
//! contract, mediated by an external signing provider.
//!
//! The core is the synchronization and submission controller: session
//! binding against the provider, full feed reconstruction from the
//! indexed read path, and optimistic post submission. Rendering is an
//! external collaborator that talks to [`app::App`] over channels.

pub mod app;
pub mod config;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod provider;
pub mod session;
pub mod submitter;
pub mod testing;

pub use app::{App, AppEvent, AppState, Command};
pub use error::ClientError;
pub use ledger::{ContractBinding, EthLedger, Ledger, Post, SubmitReceipt};
pub use provider::{ProviderEvent, RpcProvider, SigningProvider};
