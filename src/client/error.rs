use core::fmt;

use solana_pubkey::Pubkey;

use crate::error::EscrowError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientError {
    /// The ledger failed to accept or confirm the transaction
    Submission(String),
    /// The program rejected the transaction with one of its own errors
    Rejected(EscrowError),
    /// No escrow record is stored at the address
    EscrowNotFound(Pubkey),
    /// Record bytes could not be decoded
    Layout(EscrowError),
    /// A post-condition did not hold after confirmation
    Verification(&'static str),
    /// Two roles of an account list resolved to the same address
    DuplicateAccount(&'static str),
    /// A system or token instruction could not be built
    Instruction(String),
}

impl ClientError {
    /// Map a custom program error code reported by the ledger
    pub fn from_program_code(code: u32) -> Self {
        match EscrowError::from_code(code) {
            Some(error) => Self::Rejected(error),
            None => Self::Submission(format!("custom program error: {code:#x}")),
        }
    }
}

impl From<EscrowError> for ClientError {
    fn from(e: EscrowError) -> Self {
        Self::Layout(e)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submission(reason) => write!(f, "transaction submission failed: {reason}"),
            Self::Rejected(error) => write!(f, "escrow program rejected the transaction: {error}"),
            Self::EscrowNotFound(address) => write!(f, "could not find escrow account {address}"),
            Self::Layout(error) => write!(f, "could not decode escrow account: {error}"),
            Self::Verification(what) => write!(f, "post-condition failed: {what}"),
            Self::DuplicateAccount(role) => write!(f, "{role} must be a distinct account"),
            Self::Instruction(reason) => write!(f, "could not build instruction: {reason}"),
        }
    }
}

impl std::error::Error for ClientError {}
