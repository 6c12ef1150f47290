use core::mem::size_of;

use pinocchio::pubkey::Pubkey;
use static_assertions::const_assert_eq;

use crate::error::EscrowError;

const UNINITIALIZED: u8 = 0;
const INITIALIZED: u8 = 1;

/// Escrow account state - the terms of one pending swap
///
/// Memory layout: #[repr(C)] with byte-array fields only, so the struct has
/// an alignment of 1 and maps directly onto the 105 bytes of account data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Escrow {
    /// 0 while the storage is empty, 1 once InitEscrow populated it
    is_initialized: u8,
    /// Initializer's wallet address
    pub initializer: Pubkey,
    /// Token account holding the offered tokens, owned by the escrow authority
    pub temp_token_account: Pubkey,
    /// Initializer's token account that receives the counter-asset
    pub initializer_wanted_token_account: Pubkey,
    /// Counter-asset amount the initializer expects, little-endian
    amount: [u8; 8],
}

const_assert_eq!(size_of::<Escrow>(), Escrow::LEN);

impl Escrow {
    /// Size of the Escrow account in bytes
    /// 1 (is_initialized) + 32 (initializer) + 32 (temp) + 32 (wanted) + 8 (amount) = 105
    pub const LEN: usize = 1 + 32 + 32 + 32 + 8;

    pub fn new(
        initializer: Pubkey,
        temp_token_account: Pubkey,
        initializer_wanted_token_account: Pubkey,
        amount: u64,
    ) -> Self {
        Self {
            is_initialized: INITIALIZED,
            initializer,
            temp_token_account,
            initializer_wanted_token_account,
            amount: amount.to_le_bytes(),
        }
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.is_initialized == INITIALIZED
    }

    #[inline(always)]
    pub fn amount(&self) -> u64 {
        u64::from_le_bytes(self.amount)
    }

    /// Load escrow from raw data slice
    ///
    /// The slice must be exactly [`Escrow::LEN`] bytes and carry a 0/1 flag.
    #[inline(always)]
    pub fn load(data: &[u8]) -> Result<&Self, EscrowError> {
        Self::check_layout(data)?;
        // Safety: length checked above, alignment is 1 and every byte
        // pattern of the remaining fields is valid
        Ok(unsafe { &*(data.as_ptr() as *const Self) })
    }

    /// Load mutable escrow from raw data slice
    #[inline(always)]
    pub fn load_mut(data: &mut [u8]) -> Result<&mut Self, EscrowError> {
        Self::check_layout(data)?;
        // Safety: same as `load`
        Ok(unsafe { &mut *(data.as_mut_ptr() as *mut Self) })
    }

    /// Decode an owned copy of the record
    pub fn unpack(data: &[u8]) -> Result<Self, EscrowError> {
        Self::load(data).copied()
    }

    /// Encode the record into exactly [`Escrow::LEN`] bytes of `dst`
    pub fn pack(&self, dst: &mut [u8]) -> Result<(), EscrowError> {
        if dst.len() != Self::LEN {
            return Err(EscrowError::MalformedLayout);
        }
        dst.copy_from_slice(&self.to_bytes());
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[0] = self.is_initialized;
        bytes[1..33].copy_from_slice(&self.initializer);
        bytes[33..65].copy_from_slice(&self.temp_token_account);
        bytes[65..97].copy_from_slice(&self.initializer_wanted_token_account);
        bytes[97..105].copy_from_slice(&self.amount);
        bytes
    }

    fn check_layout(data: &[u8]) -> Result<(), EscrowError> {
        if data.len() != Self::LEN {
            return Err(EscrowError::MalformedLayout);
        }
        match data[0] {
            UNINITIALIZED | INITIALIZED => Ok(()),
            _ => Err(EscrowError::MalformedLayout),
        }
    }

    // ==================== Transitions ====================

    /// Uninitialized -> Active
    pub fn initialize(
        &mut self,
        initializer: Pubkey,
        temp_token_account: Pubkey,
        initializer_wanted_token_account: Pubkey,
        amount: u64,
    ) -> Result<(), EscrowError> {
        if self.is_initialized() {
            return Err(EscrowError::AlreadyInitialized);
        }
        *self = Self::new(
            initializer,
            temp_token_account,
            initializer_wanted_token_account,
            amount,
        );
        Ok(())
    }

    /// Preconditions of Active -> Completed that depend on the record
    pub fn verify_exchange(
        &self,
        temp_token_account: &Pubkey,
        initializer: &Pubkey,
        initializer_wanted_token_account: &Pubkey,
    ) -> Result<(), EscrowError> {
        if !self.is_initialized() {
            return Err(EscrowError::NotInitialized);
        }
        if &self.temp_token_account != temp_token_account
            || &self.initializer != initializer
            || &self.initializer_wanted_token_account != initializer_wanted_token_account
        {
            return Err(EscrowError::AccountMismatch);
        }
        Ok(())
    }

    /// Preconditions of Active -> Cancelled that depend on the record
    pub fn verify_cancel(
        &self,
        initializer: &Pubkey,
        temp_token_account: &Pubkey,
    ) -> Result<(), EscrowError> {
        if !self.is_initialized() {
            return Err(EscrowError::NotInitialized);
        }
        if &self.initializer != initializer {
            return Err(EscrowError::AuthorizationFailure);
        }
        if &self.temp_token_account != temp_token_account {
            return Err(EscrowError::AccountMismatch);
        }
        Ok(())
    }
}

/// The taker's quote must match the live temp balance exactly.
#[inline(always)]
pub fn check_expected_amount(expected: u64, held: u64) -> Result<(), EscrowError> {
    if expected != held {
        return Err(EscrowError::AmountMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INITIALIZER: Pubkey = [1u8; 32];
    const TEMP: Pubkey = [2u8; 32];
    const WANTED: Pubkey = [3u8; 32];

    fn live_escrow() -> Escrow {
        Escrow::new(INITIALIZER, TEMP, WANTED, 5)
    }

    #[test]
    fn test_struct_size() {
        assert_eq!(size_of::<Escrow>(), 105);
        assert_eq!(core::mem::align_of::<Escrow>(), 1);
    }

    #[test]
    fn test_field_offsets() {
        let bytes = Escrow::new(INITIALIZER, TEMP, WANTED, 0x0102_0304_0506_0708).to_bytes();

        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..33], &INITIALIZER);
        assert_eq!(&bytes[33..65], &TEMP);
        assert_eq!(&bytes[65..97], &WANTED);
        assert_eq!(&bytes[97..105], &[8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_unpack_reads_what_pack_wrote() {
        let escrow = Escrow::new(INITIALIZER, TEMP, WANTED, u64::MAX);
        let mut data = [0u8; Escrow::LEN];
        escrow.pack(&mut data).unwrap();

        let decoded = Escrow::unpack(&data).unwrap();
        assert_eq!(decoded, escrow);
        assert_eq!(decoded.amount(), u64::MAX);
        assert!(decoded.is_initialized());
    }

    #[test]
    fn test_wrong_length_is_malformed() {
        for len in [0, 1, 104, 106, 165] {
            let data = [0u8; 200];
            assert_eq!(
                Escrow::unpack(&data[..len]),
                Err(EscrowError::MalformedLayout),
                "len {len}"
            );
        }

        let escrow = live_escrow();
        let mut short = [0u8; 104];
        assert_eq!(escrow.pack(&mut short), Err(EscrowError::MalformedLayout));
    }

    #[test]
    fn test_corrupt_flag_is_malformed() {
        let mut data = live_escrow().to_bytes();
        data[0] = 2;
        assert_eq!(Escrow::unpack(&data), Err(EscrowError::MalformedLayout));
    }

    #[test]
    fn test_zeroed_storage_reads_uninitialized() {
        let data = [0u8; Escrow::LEN];
        let escrow = Escrow::load(&data).unwrap();
        assert!(!escrow.is_initialized());
        assert_eq!(escrow.amount(), 0);
    }

    #[test]
    fn test_initialize_in_place() {
        let mut data = [0u8; Escrow::LEN];
        let escrow = Escrow::load_mut(&mut data).unwrap();
        escrow.initialize(INITIALIZER, TEMP, WANTED, 5).unwrap();

        assert_eq!(data, live_escrow().to_bytes());
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut escrow = live_escrow();
        assert_eq!(
            escrow.initialize([9u8; 32], TEMP, WANTED, 1),
            Err(EscrowError::AlreadyInitialized)
        );
        assert_eq!(escrow, live_escrow());
    }

    #[test]
    fn test_verify_exchange() {
        let escrow = live_escrow();
        assert_eq!(escrow.verify_exchange(&TEMP, &INITIALIZER, &WANTED), Ok(()));
        assert_eq!(
            escrow.verify_exchange(&[7u8; 32], &INITIALIZER, &WANTED),
            Err(EscrowError::AccountMismatch)
        );
        assert_eq!(
            escrow.verify_exchange(&TEMP, &[7u8; 32], &WANTED),
            Err(EscrowError::AccountMismatch)
        );
        assert_eq!(
            escrow.verify_exchange(&TEMP, &INITIALIZER, &[7u8; 32]),
            Err(EscrowError::AccountMismatch)
        );

        let empty = Escrow::unpack(&[0u8; Escrow::LEN]).unwrap();
        assert_eq!(
            empty.verify_exchange(&TEMP, &INITIALIZER, &WANTED),
            Err(EscrowError::NotInitialized)
        );
    }

    #[test]
    fn test_verify_cancel() {
        let escrow = live_escrow();
        assert_eq!(escrow.verify_cancel(&INITIALIZER, &TEMP), Ok(()));
        assert_eq!(
            escrow.verify_cancel(&[7u8; 32], &TEMP),
            Err(EscrowError::AuthorizationFailure)
        );
        assert_eq!(
            escrow.verify_cancel(&INITIALIZER, &[7u8; 32]),
            Err(EscrowError::AccountMismatch)
        );
    }

    #[test]
    fn test_expected_amount_must_match_exactly() {
        assert_eq!(check_expected_amount(10, 10), Ok(()));
        assert_eq!(check_expected_amount(9, 10), Err(EscrowError::AmountMismatch));
        assert_eq!(check_expected_amount(11, 10), Err(EscrowError::AmountMismatch));
    }
}
