use core::fmt;

use pinocchio::program_error::ProgramError;

/// Errors raised by the escrow program.
///
/// Surfaced to the submitter as `ProgramError::Custom(code)`.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscrowError {
    /// Unknown discriminator or a payload of the wrong length
    InvalidInstruction = 0,
    /// Escrow storage does not hold enough lamports to be rent exempt
    NotRentExempt = 1,
    /// InitEscrow on a record that is already live
    AlreadyInitialized = 2,
    /// Record bytes have the wrong length or a corrupt flag byte
    MalformedLayout = 3,
    /// Record is absent, closed or zeroed
    NotInitialized = 4,
    /// Signer or derived authority does not match
    AuthorizationFailure = 5,
    /// Taker's declared amount differs from the temp account balance
    AmountMismatch = 6,
    /// Supplied account differs from the one recorded at init
    AccountMismatch = 7,
    /// Lamport arithmetic overflowed
    AmountOverflow = 8,
}

impl EscrowError {
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let error = match code {
            0 => Self::InvalidInstruction,
            1 => Self::NotRentExempt,
            2 => Self::AlreadyInitialized,
            3 => Self::MalformedLayout,
            4 => Self::NotInitialized,
            5 => Self::AuthorizationFailure,
            6 => Self::AmountMismatch,
            7 => Self::AccountMismatch,
            8 => Self::AmountOverflow,
            _ => return None,
        };
        Some(error)
    }
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e.code())
    }
}

impl fmt::Display for EscrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidInstruction => "invalid instruction",
            Self::NotRentExempt => "escrow account is not rent exempt",
            Self::AlreadyInitialized => "escrow record is already initialized",
            Self::MalformedLayout => "escrow record has a malformed layout",
            Self::NotInitialized => "escrow record is not initialized",
            Self::AuthorizationFailure => "signer or derived authority mismatch",
            Self::AmountMismatch => "expected amount does not match the escrowed balance",
            Self::AccountMismatch => "account does not match the escrow record",
            Self::AmountOverflow => "amount overflow",
        };
        f.write_str(msg)
    }
}
