use solana_pubkey::Pubkey;

use crate::{
    client::{
        error::ClientError,
        instruction::{
            self, CancelAccounts, ExchangeAccounts, InitEscrowAccounts, ESCROW_ACCOUNT_SPACE,
            TEMP_TOKEN_ACCOUNT_SPACE, TOKEN_PROGRAM_ID,
        },
        ledger::Ledger,
    },
    state::Escrow,
};

/// Inputs of the initializer's transaction
#[derive(Clone, Debug)]
pub struct InitEscrowParams {
    pub initializer: Pubkey,
    /// Account the offered tokens are drawn from
    pub initializer_offered_token_account: Pubkey,
    pub initializer_wanted_token_account: Pubkey,
    pub offered_mint: Pubkey,
    /// Fresh address for the temp token account, signs the transaction
    pub temp_token_account: Pubkey,
    /// Fresh address for the escrow record, signs the transaction
    pub escrow: Pubkey,
    /// Tokens deposited into the temp account
    pub offered_amount: u64,
    /// Counter-asset amount the initializer expects
    pub expected_amount: u64,
}

/// Inputs of the taker's transaction
#[derive(Clone, Debug)]
pub struct ExchangeParams {
    pub taker: Pubkey,
    pub taker_sending_token_account: Pubkey,
    pub taker_receiving_token_account: Pubkey,
    pub escrow: Pubkey,
    /// Escrowed amount the taker was quoted
    pub expected_amount: u64,
}

#[derive(Clone, Debug)]
pub struct CancelParams {
    pub escrow: Pubkey,
    pub initializer_refund_token_account: Pubkey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExchangeReceipt {
    /// Counter-asset paid to the initializer
    pub paid: u64,
    /// Escrowed tokens received by the taker
    pub received: u64,
}

pub struct EscrowClient<L> {
    ledger: L,
    program_id: Pubkey,
}

impl<L: Ledger> EscrowClient<L> {
    pub fn new(ledger: L, program_id: Pubkey) -> Self {
        Self { ledger, program_id }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Read and decode the record stored at `escrow`
    pub fn fetch_escrow(&self, escrow: &Pubkey) -> Result<Escrow, ClientError> {
        let data = self
            .ledger
            .get_account(escrow)?
            .filter(|data| !data.is_empty())
            .ok_or(ClientError::EscrowNotFound(*escrow))?;
        Ok(Escrow::unpack(&data)?)
    }

    /// Fund a temp token account, allocate the record and open the escrow,
    /// all in one transaction.
    pub fn init_escrow(&mut self, params: &InitEscrowParams) -> Result<Escrow, ClientError> {
        let accounts = InitEscrowAccounts::new(
            params.initializer,
            params.initializer_wanted_token_account,
            params.temp_token_account,
            params.escrow,
        )?;

        let temp_rent = self
            .ledger
            .minimum_balance_for_rent_exemption(TEMP_TOKEN_ACCOUNT_SPACE as usize)?;
        let escrow_rent = self
            .ledger
            .minimum_balance_for_rent_exemption(ESCROW_ACCOUNT_SPACE as usize)?;

        let instructions = [
            instruction::create_account(
                &params.initializer,
                &params.temp_token_account,
                temp_rent,
                TEMP_TOKEN_ACCOUNT_SPACE,
                &TOKEN_PROGRAM_ID,
            ),
            instruction::initialize_token_account(
                &params.temp_token_account,
                &params.offered_mint,
                &params.initializer,
            )?,
            instruction::transfer_tokens(
                &params.initializer_offered_token_account,
                &params.temp_token_account,
                &params.initializer,
                params.offered_amount,
            )?,
            instruction::create_account(
                &params.initializer,
                &params.escrow,
                escrow_rent,
                ESCROW_ACCOUNT_SPACE,
                &self.program_id,
            ),
            instruction::init_escrow(&self.program_id, &accounts, params.expected_amount),
        ];
        let signers = [params.initializer, params.temp_token_account, params.escrow];
        self.ledger.submit_transaction(&instructions, &signers)?;

        let record = match self.fetch_escrow(&params.escrow) {
            Ok(record) => record,
            Err(ClientError::EscrowNotFound(_)) => {
                return Err(ClientError::Verification(
                    "escrow account has not been initialized properly",
                ))
            }
            Err(e) => return Err(e),
        };
        if !record.is_initialized() {
            return Err(ClientError::Verification("is_initialized has not been set"));
        }
        if record.initializer != params.initializer.to_bytes() {
            return Err(ClientError::Verification("initializer has not been set correctly"));
        }
        if record.temp_token_account != params.temp_token_account.to_bytes() {
            return Err(ClientError::Verification(
                "temp token account has not been set correctly",
            ));
        }
        if record.initializer_wanted_token_account
            != params.initializer_wanted_token_account.to_bytes()
        {
            return Err(ClientError::Verification(
                "initializer wanted token account has not been set correctly",
            ));
        }
        if record.amount() != params.expected_amount {
            return Err(ClientError::Verification("amount has not been set correctly"));
        }
        if self.ledger.get_token_balance(&params.temp_token_account)? != params.offered_amount {
            return Err(ClientError::Verification("temp token account was not funded"));
        }

        Ok(record)
    }

    /// Complete the swap described by the record at `params.escrow`
    pub fn exchange(&mut self, params: &ExchangeParams) -> Result<ExchangeReceipt, ClientError> {
        let record = self.fetch_escrow(&params.escrow)?;
        let accounts = ExchangeAccounts::from_escrow(
            &self.program_id,
            params.escrow,
            &record,
            params.taker,
            params.taker_sending_token_account,
            params.taker_receiving_token_account,
        )?;

        let initializer_before = self
            .ledger
            .get_token_balance(accounts.initializer_wanted_token_account())?;
        let taker_before = self
            .ledger
            .get_token_balance(accounts.taker_receiving_token_account())?;

        let ix = instruction::exchange(&self.program_id, &accounts, params.expected_amount);
        self.ledger.submit_transaction(&[ix], &[params.taker])?;

        if self.ledger.get_account(&params.escrow)?.is_some() {
            return Err(ClientError::Verification("escrow account has not been closed"));
        }
        if self.ledger.get_account(accounts.temp_token_account())?.is_some() {
            return Err(ClientError::Verification("temp token account has not been closed"));
        }

        let receipt = ExchangeReceipt {
            paid: record.amount(),
            received: params.expected_amount,
        };
        let initializer_after = self
            .ledger
            .get_token_balance(accounts.initializer_wanted_token_account())?;
        if initializer_before.checked_add(receipt.paid) != Some(initializer_after) {
            return Err(ClientError::Verification("initializer balance is not correct"));
        }
        let taker_after = self
            .ledger
            .get_token_balance(accounts.taker_receiving_token_account())?;
        if taker_before.checked_add(receipt.received) != Some(taker_after) {
            return Err(ClientError::Verification("taker balance is not correct"));
        }

        Ok(receipt)
    }

    /// Return the escrowed tokens to the initializer and close the escrow.
    /// Returns the refunded amount.
    pub fn cancel(&mut self, params: &CancelParams) -> Result<u64, ClientError> {
        let record = self.fetch_escrow(&params.escrow)?;
        let accounts = CancelAccounts::from_escrow(
            &self.program_id,
            params.escrow,
            &record,
            params.initializer_refund_token_account,
        )?;

        let held = self.ledger.get_token_balance(accounts.temp_token_account())?;
        let refund_before = self
            .ledger
            .get_token_balance(&params.initializer_refund_token_account)?;

        let ix = instruction::cancel(&self.program_id, &accounts);
        self.ledger.submit_transaction(&[ix], &[*accounts.initializer()])?;

        if self.ledger.get_account(&params.escrow)?.is_some() {
            return Err(ClientError::Verification("escrow account has not been closed"));
        }
        if self.ledger.get_account(accounts.temp_token_account())?.is_some() {
            return Err(ClientError::Verification("temp token account has not been closed"));
        }
        let refund_after = self
            .ledger
            .get_token_balance(&params.initializer_refund_token_account)?;
        if refund_before.checked_add(held) != Some(refund_after) {
            return Err(ClientError::Verification("initializer refund balance is not correct"));
        }

        Ok(held)
    }
}
