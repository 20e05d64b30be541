use thiserror::Error;

/// Failure taxonomy for the client core.
///
/// Every variant is caught at the component boundary that produced it and
/// converted into user-visible feedback; nothing here is allowed to escape
/// to the presentation layer as an uncaught fault.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No signing provider could be reached at all.
    #[error("signing provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// The user declined the authorization or signature prompt.
    #[error("request was declined by the signer")]
    UserRejected,
    /// A write was attempted with no authorized account.
    #[error("no active account")]
    NoActiveAccount,
    /// No contract binding is configured for the current chain.
    #[error("no contract binding")]
    NoBinding,
    /// A read against the remote ledger failed.
    #[error("remote read failed: {0}")]
    RemoteRead(String),
    /// Broadcast or execution of a submitted operation failed.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    /// Post content was empty after trimming. Pure input validation,
    /// never reaches the network.
    #[error("post content is empty")]
    EmptyContent,
}

impl ClientError {
    /// Message shown to the user when this failure surfaces at the shell
    /// boundary. Rejection and validation get dedicated wording since they
    /// are expected user actions, not system faults.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::ProviderUnavailable(_) => {
                "No signing provider found. Install or enable a wallet to continue.".to_owned()
            }
            ClientError::UserRejected => {
                "The transaction was declined. Please try again.".to_owned()
            }
            ClientError::NoActiveAccount => {
                "No account is connected. Connect your wallet first.".to_owned()
            }
            ClientError::NoBinding => {
                "No ledger contract is configured on this chain.".to_owned()
            }
            ClientError::EmptyContent => {
                "Please enter a post before submitting.".to_owned()
            }
            ClientError::RemoteRead(_) | ClientError::SubmissionFailed(_) => {
                "The operation failed. Check the logs for details.".to_owned()
            }
        }
    }
}
