use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

use crate::client::error::ClientError;

/// Capabilities the escrow client needs from a ledger connection.
///
/// Transport, key custody and confirmation polling live behind this trait.
/// `submit_transaction` returns once the transaction is confirmed, or the
/// error that prevented it.
pub trait Ledger {
    /// Submit `instructions` as one atomic transaction signed by `signers`
    fn submit_transaction(
        &mut self,
        instructions: &[Instruction],
        signers: &[Pubkey],
    ) -> Result<(), ClientError>;

    /// Raw data of the account, `None` when it does not exist
    fn get_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError>;

    /// Token amount held by a token account
    fn get_token_balance(&self, address: &Pubkey) -> Result<u64, ClientError>;

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, ClientError>;
}

impl<L: Ledger + ?Sized> Ledger for &mut L {
    fn submit_transaction(
        &mut self,
        instructions: &[Instruction],
        signers: &[Pubkey],
    ) -> Result<(), ClientError> {
        (**self).submit_transaction(instructions, signers)
    }

    fn get_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        (**self).get_account(address)
    }

    fn get_token_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        (**self).get_token_balance(address)
    }

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, ClientError> {
        (**self).minimum_balance_for_rent_exemption(data_len)
    }
}
