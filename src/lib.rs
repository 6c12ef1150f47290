#![cfg_attr(target_os = "solana", no_std)]

use pinocchio::{
    account_info::AccountInfo, program_error::ProgramError, pubkey::Pubkey, ProgramResult,
};

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint {
    use pinocchio::{
        account_info::AccountInfo, entrypoint, nostd_panic_handler, pubkey::Pubkey, ProgramResult,
    };

    entrypoint!(process_instruction);
    nostd_panic_handler!();

    pub fn process_instruction(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        crate::process_instruction(program_id, accounts, instruction_data)
    }
}

pub mod authority;
pub mod error;
pub mod helpers;
pub mod instructions;
pub mod state;

#[cfg(not(target_os = "solana"))]
pub mod client;

pub use error::EscrowError;
pub use instructions::*;
pub use state::Escrow;

/// Program ID of the deployed escrow program
pub const ID: Pubkey = [
    0x5b, 0x3e, 0x91, 0x0c, 0x7a, 0x24, 0xd8, 0x4f,
    0x13, 0x9a, 0x62, 0xe7, 0xb0, 0x55, 0x2c, 0x81,
    0xf4, 0x0d, 0x6e, 0x3b, 0xa9, 0x17, 0xc2, 0x48,
    0x8e, 0x71, 0x05, 0xdb, 0x36, 0x9f, 0x20, 0xa6,
];

/// Seed of the program-derived authority that owns every temp token account
pub const ESCROW_SEED: &[u8] = b"escrow";

/// Process program instruction
///
/// Instruction discriminators:
/// - 0: InitEscrow - Record the terms and hand the temp account to the program
/// - 1: Exchange - Pay the initializer and release the escrowed tokens
/// - 2: Cancel - Return the escrowed tokens to the initializer
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    match instruction_data.split_first() {
        Some((InitEscrow::DISCRIMINATOR, data)) => {
            InitEscrow::try_from((program_id, data, accounts))?.process()
        }
        Some((Exchange::DISCRIMINATOR, data)) => {
            Exchange::try_from((program_id, data, accounts))?.process()
        }
        Some((Cancel::DISCRIMINATOR, data)) => {
            Cancel::try_from((program_id, data, accounts))?.process()
        }
        _ => Err(ProgramError::from(EscrowError::InvalidInstruction)),
    }
}
