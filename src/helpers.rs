use pinocchio::{
    account_info::AccountInfo,
    program_error::ProgramError,
    pubkey::Pubkey,
    sysvars::rent::Rent,
    ProgramResult,
};

use crate::{error::EscrowError, state::Escrow};

/// SPL Token Account size
pub const TOKEN_ACCOUNT_SIZE: usize = 165;

/// Signer account helper
pub struct SignerAccount;

impl SignerAccount {
    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if !account.is_signer() {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Ok(())
    }
}

/// Writable account helper
pub struct WritableAccount;

impl WritableAccount {
    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if !account.is_writable() {
            return Err(ProgramError::InvalidArgument);
        }
        Ok(())
    }
}

/// Token program helper
pub struct TokenProgram;

impl TokenProgram {
    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if account.key() != &pinocchio_token::ID {
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }
}

/// Token account interface helper
pub struct TokenAccountInterface;

impl TokenAccountInterface {
    /// Check that account is an SPL token account
    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if !account.is_owned_by(&pinocchio_token::ID) {
            return Err(ProgramError::IncorrectProgramId);
        }
        if account.data_len() != TOKEN_ACCOUNT_SIZE {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(())
    }
}

/// Escrow record account helper
pub struct EscrowAccount;

impl EscrowAccount {
    /// Check that storage for a new record is in place: owned by us, sized
    /// for the layout and rent exempt
    pub fn check_storage(
        account: &AccountInfo,
        program_id: &Pubkey,
        rent: &Rent,
    ) -> Result<(), ProgramError> {
        if !account.is_owned_by(program_id) {
            return Err(ProgramError::InvalidAccountOwner);
        }
        if account.data_len() != Escrow::LEN {
            return Err(EscrowError::MalformedLayout.into());
        }
        if !rent.is_exempt(account.lamports(), account.data_len()) {
            return Err(EscrowError::NotRentExempt.into());
        }
        Ok(())
    }

    /// Check that a live record can be read from the account. A closed
    /// record is reassigned away from the program and has no data.
    pub fn check_live(account: &AccountInfo, program_id: &Pubkey) -> Result<(), ProgramError> {
        if !account.is_owned_by(program_id) || account.data_is_empty() {
            return Err(EscrowError::NotInitialized.into());
        }
        Ok(())
    }

    /// Close the record account and transfer its lamports to destination
    pub fn close(account: &AccountInfo, destination: &AccountInfo) -> ProgramResult {
        let account_lamports = account.lamports();

        {
            let mut destination_lamports = destination.try_borrow_mut_lamports()?;
            *destination_lamports = destination_lamports
                .checked_add(account_lamports)
                .ok_or(EscrowError::AmountOverflow)?;
        }

        // Zeroes lamports, data length and owner
        account.close()
    }
}
