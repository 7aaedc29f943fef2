#![allow(dead_code)]

use ledger_core::foundation::{AccountId, NATIVE_UNITS_PER_COIN};

pub const PLATFORM_ACCOUNT: AccountId = AccountId::from_num(2);
pub const PLATFORM_SEED: u8 = 0x42;
pub const PLATFORM_BALANCE: u64 = 10_000 * NATIVE_UNITS_PER_COIN;

pub const TEST_CALLER: &str = "user-alice";
pub const TEST_EVENT_TYPE: &str = "claim_submitted";
pub const TEST_SUBJECT_ID: &str = "claim-0001";
pub const TEST_METADATA_POINTER: &[u8] = b"bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
