use pinocchio::{
    account_info::AccountInfo,
    program_error::ProgramError,
    pubkey::Pubkey,
    sysvars::rent::Rent,
    ProgramResult,
};
use pinocchio_log::log;
use pinocchio_token::{
    instructions::{AuthorityType, SetAuthority},
    state::TokenAccount,
};

use crate::{
    authority::EscrowAuthority,
    error::EscrowError,
    helpers::{EscrowAccount, SignerAccount, TokenAccountInterface, TokenProgram, WritableAccount},
    state::Escrow,
};

/// InitEscrow accounts structure
///
/// 0. `[signer]` initializer
/// 1. `[]` initializer's token account for the asset they want
/// 2. `[writable]` temp token account, already funded and owned by the initializer
/// 3. `[writable]` escrow record, allocated to this program
/// 4. `[]` rent sysvar
/// 5. `[]` token program
pub struct InitEscrowAccounts<'a> {
    pub initializer: &'a AccountInfo,
    pub initializer_wanted_token_account: &'a AccountInfo,
    pub temp_token_account: &'a AccountInfo,
    pub escrow: &'a AccountInfo,
    pub rent: &'a AccountInfo,
    pub token_program: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for InitEscrowAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [initializer, initializer_wanted_token_account, temp_token_account, escrow, rent, token_program, _remaining @ ..] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        // Basic account checks
        SignerAccount::check(initializer)?;
        TokenAccountInterface::check(initializer_wanted_token_account)?;
        TokenAccountInterface::check(temp_token_account)?;
        WritableAccount::check(temp_token_account)?;
        WritableAccount::check(escrow)?;
        TokenProgram::check(token_program)?;

        if temp_token_account.key() == initializer_wanted_token_account.key() {
            return Err(EscrowError::AccountMismatch.into());
        }

        Ok(Self {
            initializer,
            initializer_wanted_token_account,
            temp_token_account,
            escrow,
            rent,
            token_program,
        })
    }
}

/// InitEscrow instruction data: the counter-asset amount the initializer expects
pub struct InitEscrowInstructionData {
    pub amount: u64,
}

impl InitEscrowInstructionData {
    pub const LEN: usize = 8;

    /// Discriminator followed by the payload
    pub fn to_bytes(&self) -> [u8; 1 + Self::LEN] {
        let mut data = [0u8; 1 + Self::LEN];
        data[0] = *InitEscrow::DISCRIMINATOR;
        data[1..].copy_from_slice(&self.amount.to_le_bytes());
        data
    }
}

impl<'a> TryFrom<&'a [u8]> for InitEscrowInstructionData {
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

/// InitEscrow instruction - opens an escrow over a funded temp token account
pub struct InitEscrow<'a> {
    pub accounts: InitEscrowAccounts<'a>,
    pub instruction_data: InitEscrowInstructionData,
    pub authority: Pubkey,
}

impl<'a> TryFrom<(&'a Pubkey, &'a [u8], &'a [AccountInfo])> for InitEscrow<'a> {
    type Error = ProgramError;

    fn try_from(
        (program_id, data, accounts): (&'a Pubkey, &'a [u8], &'a [AccountInfo]),
    ) -> Result<Self, Self::Error> {
        let accounts = InitEscrowAccounts::try_from(accounts)?;
        let instruction_data = InitEscrowInstructionData::try_from(data)?;

        // Fails if the rent account is not the rent sysvar
        let rent = Rent::from_account_info(accounts.rent)?;
        EscrowAccount::check_storage(accounts.escrow, program_id, &rent)?;

        // The initializer must still control the temp account to hand it over
        {
            let temp = TokenAccount::from_account_info(accounts.temp_token_account)?;
            if temp.owner() != accounts.initializer.key() {
                return Err(EscrowError::AuthorizationFailure.into());
            }
        }

        let (authority, _) = EscrowAuthority::derive(program_id);

        Ok(Self {
            accounts,
            instruction_data,
            authority,
        })
    }
}

impl<'a> InitEscrow<'a> {
    /// Instruction discriminator
    pub const DISCRIMINATOR: &'static u8 = &0;

    /// Process the init escrow instruction
    pub fn process(&mut self) -> ProgramResult {
        log!("Instruction: InitEscrow");

        // Populate the escrow record
        {
            let mut data = self.accounts.escrow.try_borrow_mut_data()?;
            let escrow = Escrow::load_mut(&mut data)?;

            escrow.initialize(
                *self.accounts.initializer.key(),
                *self.accounts.temp_token_account.key(),
                *self.accounts.initializer_wanted_token_account.key(),
                self.instruction_data.amount,
            )?;
        }

        // Hand the temp account over to the escrow authority
        log!("Calling the token program to transfer token account ownership...");
        SetAuthority {
            account: self.accounts.temp_token_account,
            authority: self.accounts.initializer,
            authority_type: AuthorityType::AccountOwner,
            new_authority: Some(&self.authority),
        }
        .invoke()?;

        log!("Escrow opened, expecting {} tokens", self.instruction_data.amount);

        Ok(())
    }
}
