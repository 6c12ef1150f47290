use pinocchio::{
    account_info::AccountInfo,
    instruction::Seed,
    pubkey::{find_program_address, Pubkey},
    seeds,
};

use crate::{error::EscrowError, ESCROW_SEED};

/// Proof that an account is the program-derived authority of the escrow
/// program.
///
/// The only way to obtain one is [`EscrowAuthority::resolve`], which derives
/// the canonical address and rejects any other key. Transfers out of a temp
/// token account are signed with [`EscrowAuthority::signer_seeds`].
pub struct EscrowAuthority<'a> {
    account: &'a AccountInfo,
    bump: [u8; 1],
}

impl<'a> EscrowAuthority<'a> {
    /// Canonical address and bump of the authority for `program_id`
    #[inline(always)]
    pub fn derive(program_id: &Pubkey) -> (Pubkey, u8) {
        find_program_address(&[ESCROW_SEED], program_id)
    }

    pub fn resolve(account: &'a AccountInfo, program_id: &Pubkey) -> Result<Self, EscrowError> {
        let (address, bump) = Self::derive(program_id);
        if account.key() != &address {
            return Err(EscrowError::AuthorizationFailure);
        }
        Ok(Self {
            account,
            bump: [bump],
        })
    }

    #[inline(always)]
    pub fn account(&self) -> &'a AccountInfo {
        self.account
    }

    pub fn signer_seeds(&self) -> [Seed<'_>; 2] {
        seeds!(ESCROW_SEED, &self.bump)
    }
}
