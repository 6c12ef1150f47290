//! Client orchestration: builds the escrow transactions, submits them
//! through a [`Ledger`] and checks the resulting ledger state.

pub mod error;
pub mod escrow;
pub mod instruction;
pub mod ledger;

pub use error::ClientError;
pub use escrow::{CancelParams, EscrowClient, ExchangeParams, ExchangeReceipt, InitEscrowParams};
pub use instruction::{find_escrow_authority, CancelAccounts, ExchangeAccounts, InitEscrowAccounts};
pub use ledger::Ledger;
