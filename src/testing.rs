//! In-memory provider and ledger doubles for tests. Not wired into any
//! production path; integration tests under `tests/` drive the app actor
//! against these.

use super::error::ClientError;
use super::ledger::{Ledger, Post, SubmitReceipt};
use super::provider::{ProviderEvent, SigningProvider};
use async_trait::async_trait;
use ethers::types::{Address, U256};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Signing provider double. Accounts, chain and sequence number are plain
/// in-memory values; pushed events go out over the same broadcast channel
/// shape the real provider uses.
pub struct MockProvider {
    accounts: Mutex<Vec<Address>>,
    chain: Mutex<U256>,
    sequence: Mutex<U256>,
    sequence_reads: AtomicUsize,
    unavailable: AtomicBool,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockProvider {
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(accounts),
            chain: Mutex::new(U256::one()),
            sequence: Mutex::new(U256::zero()),
            sequence_reads: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            events,
        }
    }

    /// Pushes a wallet-style event to all subscribers.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub fn set_sequence(&self, sequence: U256) {
        *self.sequence.lock().unwrap() = sequence;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// How many times a sequence number was read from this provider.
    pub fn sequence_reads(&self) -> usize {
        self.sequence_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SigningProvider for MockProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ClientError::ProviderUnavailable("no provider".to_owned()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<U256, ClientError> {
        Ok(*self.chain.lock().unwrap())
    }

    async fn sequence_number(&self, _account: Address) -> Result<U256, ClientError> {
        self.sequence_reads.fetch_add(1, Ordering::SeqCst);
        Ok(*self.sequence.lock().unwrap())
    }

    fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// Ledger double: remote truth is a vector of `(author, content,
/// timestamp)` rows, indexed 1-based on read like the contract getter.
pub struct MockLedger {
    rows: Mutex<Vec<(Address, String, u64)>>,
    submissions: Mutex<Vec<(String, Address, U256)>>,
    fail_reads: AtomicBool,
    reject_submit: AtomicBool,
    fail_submit: AtomicBool,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Seeds `count` remote posts authored by `0xaa..aa`.
    pub fn seeded(count: u64) -> Self {
        let rows = (1..=count)
            .map(|i| (Address::repeat_byte(0xaa), format!("post {}", i), 100 + i))
            .collect();
        Self::with_rows(rows)
    }

    fn with_rows(rows: Vec<(Address, String, u64)>) -> Self {
        Self {
            rows: Mutex::new(rows),
            submissions: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            reject_submit: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
        }
    }

    /// Appends a remote post behind the client's back, as another writer
    /// would.
    pub fn push_row(&self, author: Address, content: &str, timestamp: u64) {
        self.rows
            .lock()
            .unwrap()
            .push((author, content.to_owned(), timestamp));
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Next submissions are declined by the signer.
    pub fn set_reject_submit(&self, reject: bool) {
        self.reject_submit.store(reject, Ordering::SeqCst);
    }

    /// Next submissions fail at broadcast/execution.
    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    /// Every `(content, signer, sequence)` triple that reached the write
    /// path, in order.
    pub fn submissions(&self) -> Vec<(String, Address, U256)> {
        self.submissions.lock().unwrap().clone()
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn read_count(&self) -> Result<u64, ClientError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClientError::RemoteRead("read failed".to_owned()));
        }
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    async fn read_post(&self, index: u64) -> Result<Post, ClientError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClientError::RemoteRead("read failed".to_owned()));
        }
        let rows = self.rows.lock().unwrap();
        let (author, content, timestamp) = rows
            .get(index as usize - 1)
            .cloned()
            .ok_or_else(|| ClientError::RemoteRead(format!("no post at index {}", index)))?;
        Ok(Post {
            author,
            content,
            timestamp,
            index: Some(index),
        })
    }

    async fn submit_post(
        &self,
        content: &str,
        signer: Address,
        sequence: U256,
    ) -> Result<SubmitReceipt, ClientError> {
        self.submissions
            .lock()
            .unwrap()
            .push((content.to_owned(), signer, sequence));
        if self.reject_submit.load(Ordering::SeqCst) {
            return Err(ClientError::UserRejected);
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(ClientError::SubmissionFailed("reverted".to_owned()));
        }
        let mut rows = self.rows.lock().unwrap();
        let timestamp = 1_000 + rows.len() as u64;
        rows.push((signer, content.to_owned(), timestamp));
        Ok(SubmitReceipt::default())
    }
}
