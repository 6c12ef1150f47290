use pinocchio::{
    account_info::AccountInfo, instruction::Signer, program_error::ProgramError, pubkey::Pubkey,
    ProgramResult,
};
use pinocchio_log::log;
use pinocchio_token::{
    instructions::{CloseAccount, Transfer},
    state::TokenAccount,
};

use crate::{
    authority::EscrowAuthority,
    error::EscrowError,
    helpers::{EscrowAccount, SignerAccount, TokenAccountInterface, TokenProgram, WritableAccount},
    state::Escrow,
};

/// Cancel accounts structure
///
/// 0. `[signer, writable]` initializer
/// 1. `[writable]` temp token account
/// 2. `[writable]` initializer's token account receiving the refund
/// 3. `[writable]` escrow record
/// 4. `[]` token program
/// 5. `[]` escrow authority
pub struct CancelAccounts<'a> {
    pub initializer: &'a AccountInfo,
    pub temp_token_account: &'a AccountInfo,
    pub initializer_refund_token_account: &'a AccountInfo,
    pub escrow: &'a AccountInfo,
    pub token_program: &'a AccountInfo,
    pub authority: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for CancelAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [initializer, temp_token_account, initializer_refund_token_account, escrow, token_program, authority, _remaining @ ..] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        // Basic account checks
        SignerAccount::check(initializer)?;
        WritableAccount::check(initializer)?;
        WritableAccount::check(escrow)?;
        TokenProgram::check(token_program)?;

        if initializer_refund_token_account.key() == temp_token_account.key() {
            return Err(EscrowError::AccountMismatch.into());
        }

        Ok(Self {
            initializer,
            temp_token_account,
            initializer_refund_token_account,
            escrow,
            token_program,
            authority,
        })
    }
}

/// Cancel instruction - initializer reclaims the escrowed tokens
pub struct Cancel<'a> {
    pub accounts: CancelAccounts<'a>,
    pub authority: EscrowAuthority<'a>,
    /// Live balance of the temp token account
    pub held: u64,
}

impl<'a> TryFrom<(&'a Pubkey, &'a [u8], &'a [AccountInfo])> for Cancel<'a> {
    type Error = ProgramError;

    fn try_from(
        (program_id, data, accounts): (&'a Pubkey, &'a [u8], &'a [AccountInfo]),
    ) -> Result<Self, Self::Error> {
        if !data.is_empty() {
            return Err(EscrowError::InvalidInstruction.into());
        }
        let accounts = CancelAccounts::try_from(accounts)?;

        EscrowAccount::check_live(accounts.escrow, program_id)?;
        let escrow = Escrow::unpack(&accounts.escrow.try_borrow_data()?)?;
        escrow.verify_cancel(accounts.initializer.key(), accounts.temp_token_account.key())?;

        TokenAccountInterface::check(accounts.temp_token_account)?;
        let held = TokenAccount::from_account_info(accounts.temp_token_account)?.amount();

        let authority = EscrowAuthority::resolve(accounts.authority, program_id)?;

        Ok(Self {
            accounts,
            authority,
            held,
        })
    }
}

impl<'a> Cancel<'a> {
    /// Instruction discriminator
    pub const DISCRIMINATOR: &'static u8 = &2;

    /// Discriminator only, Cancel carries no payload
    pub fn instruction_data() -> [u8; 1] {
        [*Self::DISCRIMINATOR]
    }

    /// Process the cancel instruction
    pub fn process(&mut self) -> ProgramResult {
        log!("Instruction: Cancel");

        let signer_seeds = self.authority.signer_seeds();
        let signer = Signer::from(&signer_seeds);

        // Transfer from the temp account back to the Initializer
        if self.held > 0 {
            log!("Calling the token program to refund the initializer...");
            Transfer {
                from: self.accounts.temp_token_account,
                to: self.accounts.initializer_refund_token_account,
                authority: self.authority.account(),
                amount: self.held,
            }
            .invoke_signed(&[signer.clone()])?;
        }

        // Close the temp account
        log!("Calling the token program to close the temp account...");
        CloseAccount {
            account: self.accounts.temp_token_account,
            destination: self.accounts.initializer,
            authority: self.authority.account(),
        }
        .invoke_signed(&[signer])?;

        // Close the Escrow
        log!("Closing the escrow account...");
        EscrowAccount::close(self.accounts.escrow, self.accounts.initializer)?;

        log!("Escrow cancelled, refunded {} tokens", self.held);

        Ok(())
    }
}
