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
    state::{check_expected_amount, Escrow},
};

/// Exchange accounts structure
///
/// 0. `[signer]` taker
/// 1. `[writable]` taker's token account sending the asset the initializer wants
/// 2. `[writable]` taker's token account receiving the escrowed asset
/// 3. `[writable]` temp token account
/// 4. `[writable]` initializer, receives the rent of both closed accounts
/// 5. `[writable]` initializer's token account receiving the taker's payment
/// 6. `[writable]` escrow record
/// 7. `[]` token program
/// 8. `[]` escrow authority
pub struct ExchangeAccounts<'a> {
    pub taker: &'a AccountInfo,
    pub taker_sending_token_account: &'a AccountInfo,
    pub taker_receiving_token_account: &'a AccountInfo,
    pub temp_token_account: &'a AccountInfo,
    pub initializer: &'a AccountInfo,
    pub initializer_wanted_token_account: &'a AccountInfo,
    pub escrow: &'a AccountInfo,
    pub token_program: &'a AccountInfo,
    pub authority: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for ExchangeAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [taker, taker_sending_token_account, taker_receiving_token_account, temp_token_account, initializer, initializer_wanted_token_account, escrow, token_program, authority, _remaining @ ..] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        // Basic account checks
        SignerAccount::check(taker)?;
        WritableAccount::check(initializer)?;
        WritableAccount::check(escrow)?;
        TokenProgram::check(token_program)?;

        Ok(Self {
            taker,
            taker_sending_token_account,
            taker_receiving_token_account,
            temp_token_account,
            initializer,
            initializer_wanted_token_account,
            escrow,
            token_program,
            authority,
        })
    }
}

/// Exchange instruction data: the escrowed amount the taker expects to receive
pub struct ExchangeInstructionData {
    pub amount: u64,
}

impl ExchangeInstructionData {
    pub const LEN: usize = 8;

    /// Discriminator followed by the payload
    pub fn to_bytes(&self) -> [u8; 1 + Self::LEN] {
        let mut data = [0u8; 1 + Self::LEN];
        data[0] = *Exchange::DISCRIMINATOR;
        data[1..].copy_from_slice(&self.amount.to_le_bytes());
        data
    }
}

impl<'a> TryFrom<&'a [u8]> for ExchangeInstructionData {
    type Error = EscrowError;

    fn try_from(data: &'a [u8]) -> Result<Self, Self::Error> {
        let amount: [u8; Self::LEN] = data
            .try_into()
            .map_err(|_| EscrowError::InvalidInstruction)?;

        Ok(Self {
            amount: u64::from_le_bytes(amount),
        })
    }
}

/// Exchange instruction - completes the swap and tears the escrow down
pub struct Exchange<'a> {
    pub accounts: ExchangeAccounts<'a>,
    pub authority: EscrowAuthority<'a>,
    /// Record as read at the start of the transition
    pub escrow: Escrow,
    /// Live balance of the temp token account
    pub held: u64,
}

impl<'a> TryFrom<(&'a Pubkey, &'a [u8], &'a [AccountInfo])> for Exchange<'a> {
    type Error = ProgramError;

    fn try_from(
        (program_id, data, accounts): (&'a Pubkey, &'a [u8], &'a [AccountInfo]),
    ) -> Result<Self, Self::Error> {
        let accounts = ExchangeAccounts::try_from(accounts)?;
        let instruction_data = ExchangeInstructionData::try_from(data)?;

        // Re-read the record; a completed or cancelled escrow is gone
        EscrowAccount::check_live(accounts.escrow, program_id)?;
        let escrow = Escrow::unpack(&accounts.escrow.try_borrow_data()?)?;
        escrow.verify_exchange(
            accounts.temp_token_account.key(),
            accounts.initializer.key(),
            accounts.initializer_wanted_token_account.key(),
        )?;

        // Fail closed if the escrowed balance moved since the taker's quote
        TokenAccountInterface::check(accounts.temp_token_account)?;
        let held = TokenAccount::from_account_info(accounts.temp_token_account)?.amount();
        check_expected_amount(instruction_data.amount, held)?;

        let authority = EscrowAuthority::resolve(accounts.authority, program_id)?;

        Ok(Self {
            accounts,
            authority,
            escrow,
            held,
        })
    }
}

impl<'a> Exchange<'a> {
    /// Instruction discriminator
    pub const DISCRIMINATOR: &'static u8 = &1;

    /// Process the exchange instruction
    pub fn process(&mut self) -> ProgramResult {
        log!("Instruction: Exchange");

        // Transfer from the Taker to the Initializer
        log!("Calling the token program to transfer tokens to the escrow's initializer...");
        Transfer {
            from: self.accounts.taker_sending_token_account,
            to: self.accounts.initializer_wanted_token_account,
            authority: self.accounts.taker,
            amount: self.escrow.amount(),
        }
        .invoke()?;

        let signer_seeds = self.authority.signer_seeds();
        let signer = Signer::from(&signer_seeds);

        // Transfer from the temp account to the Taker
        log!("Calling the token program to transfer tokens to the taker...");
        Transfer {
            from: self.accounts.temp_token_account,
            to: self.accounts.taker_receiving_token_account,
            authority: self.authority.account(),
            amount: self.held,
        }
        .invoke_signed(&[signer.clone()])?;

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

        log!(
            "Exchanged {} escrowed tokens for {} tokens",
            self.held,
            self.escrow.amount()
        );

        Ok(())
    }
}
