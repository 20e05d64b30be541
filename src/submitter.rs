use super::error::ClientError;
use super::ledger::{Ledger, Post};
use super::session::Session;
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Runs one post-creation attempt end to end: validate, re-authorize, read
/// a fresh sequence number, submit, and on success synthesize the
/// optimistic post for the caller to prepend to its feed.
///
/// The sequence number is read from the provider at the moment of
/// submission, never from a cache, so a stale number cannot replay. The
/// optimistic post carries the submitting account, the trimmed content and
/// a wall-clock timestamp, and no ledger index; it is not reconciled
/// against a later reload.
pub async fn submit(
    session: &mut Session,
    ledger: &dyn Ledger,
    content: &str,
) -> Result<Post, ClientError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ClientError::EmptyContent);
    }
    if session.account().is_none() {
        return Err(ClientError::NoActiveAccount);
    }

    // Re-authorization is idempotent when already authorized.
    let signer = session.connect().await?;
    let sequence = session.sequence_number().await?;

    let receipt = ledger.submit_post(content, signer, sequence).await?;
    info!(
        "(submit) post accepted in transaction {:?}",
        receipt.transaction_hash
    );

    Ok(Post {
        author: signer,
        content: content.to_owned(),
        timestamp: unix_now(),
        index: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLedger, MockProvider};
    use ethers::types::{Address, U256};
    use std::sync::Arc;

    fn connected_session(provider: Arc<MockProvider>) -> Session {
        let mut session = Session::new(provider);
        // connect() is async; seed the account through the event path
        // the provider would otherwise push.
        session.apply_event(&crate::provider::ProviderEvent::AccountsChanged(vec![
            Address::repeat_byte(2),
        ]));
        session
    }

    #[tokio::test]
    async fn content_is_trimmed_before_submission() {
        let provider = Arc::new(MockProvider::with_accounts(vec![Address::repeat_byte(2)]));
        let mut session = connected_session(provider);
        let ledger = MockLedger::new();

        let post = submit(&mut session, &ledger, "  hello  ").await.unwrap();
        assert_eq!(post.content, "hello");
        assert_eq!(post.index, None);
        assert_eq!(ledger.submissions()[0].0, "hello");
    }

    #[tokio::test]
    async fn empty_content_never_reaches_the_ledger() {
        let provider = Arc::new(MockProvider::with_accounts(vec![Address::repeat_byte(2)]));
        let mut session = connected_session(provider);
        let ledger = MockLedger::new();

        let result = submit(&mut session, &ledger, "   \t  ").await;
        assert!(matches!(result, Err(ClientError::EmptyContent)));
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test]
    async fn missing_account_fails_fast() {
        let provider = Arc::new(MockProvider::with_accounts(vec![]));
        let mut session = Session::new(provider);
        let ledger = MockLedger::new();

        let result = submit(&mut session, &ledger, "hello").await;
        assert!(matches!(result, Err(ClientError::NoActiveAccount)));
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test]
    async fn sequence_number_is_read_fresh_each_attempt() {
        let provider = Arc::new(MockProvider::with_accounts(vec![Address::repeat_byte(2)]));
        let mut session = connected_session(provider.clone());
        let ledger = MockLedger::new();

        submit(&mut session, &ledger, "one").await.unwrap();
        provider.set_sequence(U256::from(7));
        submit(&mut session, &ledger, "two").await.unwrap();

        let submissions = ledger.submissions();
        assert_eq!(submissions[0].2, U256::zero());
        assert_eq!(submissions[1].2, U256::from(7));
        assert_eq!(provider.sequence_reads(), 2);
    }

    #[tokio::test]
    async fn rejection_propagates_unchanged() {
        let provider = Arc::new(MockProvider::with_accounts(vec![Address::repeat_byte(2)]));
        let mut session = connected_session(provider);
        let ledger = MockLedger::new();
        ledger.set_reject_submit(true);

        let result = submit(&mut session, &ledger, "hello").await;
        assert!(matches!(result, Err(ClientError::UserRejected)));
    }
}
