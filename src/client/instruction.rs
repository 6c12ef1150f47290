//! Off-ledger instruction builders.
//!
//! The program indexes accounts positionally, so every account list is a
//! fixed-arity struct whose [`to_account_metas`](InitEscrowAccounts::to_account_metas)
//! emits the exact order and signer/writable flags the processors expect.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::{pubkey, Pubkey};
use solana_system_interface::instruction as system_instruction;
use spl_token::instruction as token_instruction;

use crate::{
    client::error::ClientError,
    helpers::TOKEN_ACCOUNT_SIZE,
    instructions::{Cancel, ExchangeInstructionData, InitEscrowInstructionData},
    state::Escrow,
    ESCROW_SEED,
};

pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array(pinocchio_token::ID);
pub const SYSTEM_PROGRAM_ID: Pubkey = solana_system_interface::program::ID;
pub const RENT_SYSVAR_ID: Pubkey = pubkey!("SysvarRent111111111111111111111111111111111");

/// Program id as a client-side address
pub const PROGRAM_ID: Pubkey = Pubkey::new_from_array(crate::ID);

/// Address and bump of the authority that owns every temp token account
pub fn find_escrow_authority(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ESCROW_SEED], program_id)
}

fn ensure_distinct(a: &Pubkey, b: &Pubkey, role: &'static str) -> Result<(), ClientError> {
    if a == b {
        return Err(ClientError::DuplicateAccount(role));
    }
    Ok(())
}

fn record_key(bytes: &[u8; 32]) -> Pubkey {
    Pubkey::new_from_array(*bytes)
}

// ==================== InitEscrow ====================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitEscrowAccounts {
    initializer: Pubkey,
    initializer_wanted_token_account: Pubkey,
    temp_token_account: Pubkey,
    escrow: Pubkey,
}

impl InitEscrowAccounts {
    pub fn new(
        initializer: Pubkey,
        initializer_wanted_token_account: Pubkey,
        temp_token_account: Pubkey,
        escrow: Pubkey,
    ) -> Result<Self, ClientError> {
        ensure_distinct(
            &temp_token_account,
            &initializer_wanted_token_account,
            "temp token account",
        )?;
        ensure_distinct(&escrow, &temp_token_account, "escrow account")?;
        ensure_distinct(&escrow, &initializer_wanted_token_account, "escrow account")?;

        Ok(Self {
            initializer,
            initializer_wanted_token_account,
            temp_token_account,
            escrow,
        })
    }

    pub fn initializer(&self) -> &Pubkey {
        &self.initializer
    }

    pub fn temp_token_account(&self) -> &Pubkey {
        &self.temp_token_account
    }

    pub fn escrow(&self) -> &Pubkey {
        &self.escrow
    }

    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new_readonly(self.initializer, true),
            AccountMeta::new_readonly(self.initializer_wanted_token_account, false),
            AccountMeta::new(self.temp_token_account, false),
            AccountMeta::new(self.escrow, false),
            AccountMeta::new_readonly(RENT_SYSVAR_ID, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        ]
    }
}

/// `amount` is the counter-asset amount the initializer expects
pub fn init_escrow(program_id: &Pubkey, accounts: &InitEscrowAccounts, amount: u64) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(),
        data: InitEscrowInstructionData { amount }.to_bytes().to_vec(),
    }
}

// ==================== Exchange ====================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeAccounts {
    taker: Pubkey,
    taker_sending_token_account: Pubkey,
    taker_receiving_token_account: Pubkey,
    temp_token_account: Pubkey,
    initializer: Pubkey,
    initializer_wanted_token_account: Pubkey,
    escrow: Pubkey,
    authority: Pubkey,
}

impl ExchangeAccounts {
    /// Take the initializer side of the list from the stored record
    pub fn from_escrow(
        program_id: &Pubkey,
        escrow: Pubkey,
        record: &Escrow,
        taker: Pubkey,
        taker_sending_token_account: Pubkey,
        taker_receiving_token_account: Pubkey,
    ) -> Result<Self, ClientError> {
        let temp_token_account = record_key(&record.temp_token_account);
        let initializer_wanted_token_account = record_key(&record.initializer_wanted_token_account);

        ensure_distinct(
            &taker_sending_token_account,
            &taker_receiving_token_account,
            "taker sending token account",
        )?;
        ensure_distinct(
            &taker_receiving_token_account,
            &temp_token_account,
            "taker receiving token account",
        )?;
        ensure_distinct(
            &taker_sending_token_account,
            &initializer_wanted_token_account,
            "taker sending token account",
        )?;

        let (authority, _) = find_escrow_authority(program_id);

        Ok(Self {
            taker,
            taker_sending_token_account,
            taker_receiving_token_account,
            temp_token_account,
            initializer: record_key(&record.initializer),
            initializer_wanted_token_account,
            escrow,
            authority,
        })
    }

    pub fn temp_token_account(&self) -> &Pubkey {
        &self.temp_token_account
    }

    pub fn initializer_wanted_token_account(&self) -> &Pubkey {
        &self.initializer_wanted_token_account
    }

    pub fn taker_receiving_token_account(&self) -> &Pubkey {
        &self.taker_receiving_token_account
    }

    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new_readonly(self.taker, true),
            AccountMeta::new(self.taker_sending_token_account, false),
            AccountMeta::new(self.taker_receiving_token_account, false),
            AccountMeta::new(self.temp_token_account, false),
            AccountMeta::new(self.initializer, false),
            AccountMeta::new(self.initializer_wanted_token_account, false),
            AccountMeta::new(self.escrow, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(self.authority, false),
        ]
    }
}

/// `expected_amount` must equal the temp account balance at execution time
pub fn exchange(
    program_id: &Pubkey,
    accounts: &ExchangeAccounts,
    expected_amount: u64,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(),
        data: ExchangeInstructionData {
            amount: expected_amount,
        }
        .to_bytes()
        .to_vec(),
    }
}

// ==================== Cancel ====================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelAccounts {
    initializer: Pubkey,
    temp_token_account: Pubkey,
    initializer_refund_token_account: Pubkey,
    escrow: Pubkey,
    authority: Pubkey,
}

impl CancelAccounts {
    pub fn from_escrow(
        program_id: &Pubkey,
        escrow: Pubkey,
        record: &Escrow,
        initializer_refund_token_account: Pubkey,
    ) -> Result<Self, ClientError> {
        let temp_token_account = record_key(&record.temp_token_account);
        ensure_distinct(
            &initializer_refund_token_account,
            &temp_token_account,
            "initializer refund token account",
        )?;

        let (authority, _) = find_escrow_authority(program_id);

        Ok(Self {
            initializer: record_key(&record.initializer),
            temp_token_account,
            initializer_refund_token_account,
            escrow,
            authority,
        })
    }

    pub fn initializer(&self) -> &Pubkey {
        &self.initializer
    }

    pub fn temp_token_account(&self) -> &Pubkey {
        &self.temp_token_account
    }

    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.initializer, true),
            AccountMeta::new(self.temp_token_account, false),
            AccountMeta::new(self.initializer_refund_token_account, false),
            AccountMeta::new(self.escrow, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(self.authority, false),
        ]
    }
}

pub fn cancel(program_id: &Pubkey, accounts: &CancelAccounts) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(),
        data: Cancel::instruction_data().to_vec(),
    }
}

// ==================== System / Token ====================

/// System program CreateAccount
pub fn create_account(
    payer: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner: &Pubkey,
) -> Instruction {
    system_instruction::create_account(payer, new_account, lamports, space, owner)
}

/// Token program InitializeAccount
pub fn initialize_token_account(
    account: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<Instruction, ClientError> {
    token_instruction::initialize_account(&TOKEN_PROGRAM_ID, account, mint, owner)
        .map_err(|e| ClientError::Instruction(e.to_string()))
}

/// Token program Transfer, signed by `authority` alone
pub fn transfer_tokens(
    source: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Result<Instruction, ClientError> {
    token_instruction::transfer(&TOKEN_PROGRAM_ID, source, destination, authority, &[], amount)
        .map_err(|e| ClientError::Instruction(e.to_string()))
}

/// Space of a temp token account
pub const TEMP_TOKEN_ACCOUNT_SPACE: u64 = TOKEN_ACCOUNT_SIZE as u64;

/// Space of an escrow record account
pub const ESCROW_ACCOUNT_SPACE: u64 = Escrow::LEN as u64;

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(metas: &[AccountMeta]) -> Vec<(bool, bool)> {
        metas.iter().map(|m| (m.is_signer, m.is_writable)).collect()
    }

    fn record() -> (Escrow, Pubkey, Pubkey, Pubkey) {
        let initializer = Pubkey::new_unique();
        let temp = Pubkey::new_unique();
        let wanted = Pubkey::new_unique();
        let escrow = Escrow::new(initializer.to_bytes(), temp.to_bytes(), wanted.to_bytes(), 5);
        (escrow, initializer, temp, wanted)
    }

    #[test]
    fn test_authority_is_canonical_and_off_curve() {
        let (authority, bump) = find_escrow_authority(&PROGRAM_ID);
        assert_eq!(find_escrow_authority(&PROGRAM_ID), (authority, bump));
        assert!(!authority.is_on_curve());

        let rederived =
            Pubkey::create_program_address(&[ESCROW_SEED, &[bump]], &PROGRAM_ID).unwrap();
        assert_eq!(rederived, authority);

        let other = Pubkey::new_unique();
        assert_ne!(find_escrow_authority(&other).0, authority);
    }

    #[test]
    fn test_init_escrow_instruction() {
        let initializer = Pubkey::new_unique();
        let wanted = Pubkey::new_unique();
        let temp = Pubkey::new_unique();
        let escrow = Pubkey::new_unique();
        let accounts = InitEscrowAccounts::new(initializer, wanted, temp, escrow).unwrap();

        let ix = init_escrow(&PROGRAM_ID, &accounts, 10);

        assert_eq!(ix.program_id, PROGRAM_ID);
        assert_eq!(ix.data, vec![0, 10, 0, 0, 0, 0, 0, 0, 0]);
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(keys, vec![initializer, wanted, temp, escrow, RENT_SYSVAR_ID, TOKEN_PROGRAM_ID]);
        assert_eq!(
            flags(&ix.accounts),
            vec![
                (true, false),
                (false, false),
                (false, true),
                (false, true),
                (false, false),
                (false, false),
            ]
        );
    }

    #[test]
    fn test_init_escrow_accounts_reject_aliasing() {
        let initializer = Pubkey::new_unique();
        let shared = Pubkey::new_unique();
        let escrow = Pubkey::new_unique();

        assert_eq!(
            InitEscrowAccounts::new(initializer, shared, shared, escrow),
            Err(ClientError::DuplicateAccount("temp token account"))
        );
        assert_eq!(
            InitEscrowAccounts::new(initializer, Pubkey::new_unique(), shared, shared),
            Err(ClientError::DuplicateAccount("escrow account"))
        );
    }

    #[test]
    fn test_exchange_instruction_follows_record() {
        let (record, initializer, temp, wanted) = record();
        let escrow = Pubkey::new_unique();
        let taker = Pubkey::new_unique();
        let taker_sending = Pubkey::new_unique();
        let taker_receiving = Pubkey::new_unique();

        let accounts = ExchangeAccounts::from_escrow(
            &PROGRAM_ID,
            escrow,
            &record,
            taker,
            taker_sending,
            taker_receiving,
        )
        .unwrap();
        let ix = exchange(&PROGRAM_ID, &accounts, 10);

        assert_eq!(ix.data, vec![1, 10, 0, 0, 0, 0, 0, 0, 0]);
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(
            keys,
            vec![
                taker,
                taker_sending,
                taker_receiving,
                temp,
                initializer,
                wanted,
                escrow,
                TOKEN_PROGRAM_ID,
                find_escrow_authority(&PROGRAM_ID).0,
            ]
        );
        assert_eq!(
            flags(&ix.accounts),
            vec![
                (true, false),
                (false, true),
                (false, true),
                (false, true),
                (false, true),
                (false, true),
                (false, true),
                (false, false),
                (false, false),
            ]
        );
    }

    #[test]
    fn test_exchange_accounts_reject_paying_into_temp() {
        let (record, _, temp, _) = record();
        let result = ExchangeAccounts::from_escrow(
            &PROGRAM_ID,
            Pubkey::new_unique(),
            &record,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            temp,
        );
        assert_eq!(
            result,
            Err(ClientError::DuplicateAccount("taker receiving token account"))
        );
    }

    #[test]
    fn test_cancel_instruction() {
        let (record, initializer, temp, _) = record();
        let escrow = Pubkey::new_unique();
        let refund = Pubkey::new_unique();

        let accounts = CancelAccounts::from_escrow(&PROGRAM_ID, escrow, &record, refund).unwrap();
        let ix = cancel(&PROGRAM_ID, &accounts);

        assert_eq!(ix.data, vec![2]);
        assert_eq!(ix.accounts[0], AccountMeta::new(initializer, true));
        assert_eq!(ix.accounts[1], AccountMeta::new(temp, false));
        assert_eq!(ix.accounts[2], AccountMeta::new(refund, false));
        assert_eq!(ix.accounts[3], AccountMeta::new(escrow, false));
        assert_eq!(ix.accounts.len(), 6);
    }

    #[test]
    fn test_create_account_decodes_as_system_instruction() {
        let payer = Pubkey::new_unique();
        let new_account = Pubkey::new_unique();
        let ix = create_account(&payer, &new_account, 1_000, ESCROW_ACCOUNT_SPACE, &PROGRAM_ID);

        assert_eq!(ix.program_id, SYSTEM_PROGRAM_ID);
        assert_eq!(flags(&ix.accounts), vec![(true, true), (true, true)]);
        let decoded: system_instruction::SystemInstruction =
            bincode::deserialize(&ix.data).unwrap();
        assert_eq!(
            decoded,
            system_instruction::SystemInstruction::CreateAccount {
                lamports: 1_000,
                space: 105,
                owner: PROGRAM_ID,
            }
        );
    }

    #[test]
    fn test_token_instructions_decode() {
        let temp = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();

        let ix = initialize_token_account(&temp, &mint, &owner).unwrap();
        assert_eq!(ix.program_id, TOKEN_PROGRAM_ID);
        assert!(matches!(
            token_instruction::TokenInstruction::unpack(&ix.data).unwrap(),
            token_instruction::TokenInstruction::InitializeAccount
        ));
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(keys, vec![temp, mint, owner, RENT_SYSVAR_ID]);

        let source = Pubkey::new_unique();
        let ix = transfer_tokens(&source, &temp, &owner, 10).unwrap();
        assert!(matches!(
            token_instruction::TokenInstruction::unpack(&ix.data).unwrap(),
            token_instruction::TokenInstruction::Transfer { amount: 10 }
        ));
        assert_eq!(flags(&ix.accounts), vec![(false, true), (false, true), (true, false)]);
    }
}
