//! Fixed-point accrual math.
//!
//! Reward rates and the per-share accumulator are scaled by [`ACC_PRECISION`].
//! Every division floors, so the sum of what stakers can claim never exceeds
//! what the creator deposited. Products are formed at 256-bit width before
//! dividing, so a large position against a large accumulator does not fail
//! spuriously.

use soroban_sdk::{Env, U256};

use crate::ContractError;

/// Scale applied to reward rates and `acc_reward_per_share`.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// Longest stream a creator may open: 730 days.
pub const MAX_DURATION: u64 = 730 * 24 * 60 * 60;

/// Seconds in the 365-day year used by the analytics views.
pub const YEAR: u64 = 365 * 24 * 60 * 60;

/// `floor(a * b / denom)`.
///
/// Products that do not fit in 128 bits are formed as host `U256` values.
/// Fails with `Overflow` when `denom` is zero or the quotient does not fit in
/// 128 bits.
pub fn mul_div(env: &Env, a: u128, b: u128, denom: u128) -> Result<u128, ContractError> {
    if denom == 0 {
        return Err(ContractError::Overflow);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denom);
    }
    U256::from_u128(env, a)
        .mul(&U256::from_u128(env, b))
        .div(&U256::from_u128(env, denom))
        .to_u128()
        .ok_or(ContractError::Overflow)
}

/// Scaled per-second emission for `amount` spread over `duration` seconds.
pub fn reward_rate(amount: u128, duration: u64) -> Result<u128, ContractError> {
    if duration == 0 {
        return Err(ContractError::InvalidDuration);
    }
    let scaled = amount
        .checked_mul(ACC_PRECISION)
        .ok_or(ContractError::PrecisionOverflow)?;
    Ok(scaled / duration as u128)
}

/// Accumulator growth for `elapsed` seconds at `rate` across `total_shares`.
pub fn acc_delta(
    env: &Env,
    elapsed: u64,
    rate: u128,
    total_shares: u128,
) -> Result<u128, ContractError> {
    mul_div(env, elapsed as u128, rate, total_shares)
}

/// Reward owed to `shares` at accumulator `acc`, before subtracting debt.
/// This is also the debt value a position is reset to.
pub fn accrued(env: &Env, shares: u128, acc: u128) -> Result<u128, ContractError> {
    mul_div(env, shares, acc, ACC_PRECISION)
}

/// `shares * acc / ACC_PRECISION - debt`.
pub fn pending(env: &Env, shares: u128, acc: u128, debt: u128) -> Result<u128, ContractError> {
    // Debt is always a floor of an earlier (smaller) accumulator value.
    Ok(accrued(env, shares, acc)?.saturating_sub(debt))
}

/// Reward units still owed by the stream for `span` seconds of emission.
pub fn undistributed(env: &Env, span: u64, rate: u128) -> Result<u128, ContractError> {
    mul_div(env, span as u128, rate, ACC_PRECISION)
}

/// Token amounts cross the contract boundary as `i128`; internal accounting
/// is unsigned.
pub fn to_units(amount: i128) -> Result<u128, ContractError> {
    match amount {
        0 => Err(ContractError::ZeroAmount),
        a if a < 0 => Err(ContractError::InvalidAmount),
        a => Ok(a as u128),
    }
}

pub fn to_amount(units: u128) -> Result<i128, ContractError> {
    i128::try_from(units).map_err(|_| ContractError::Overflow)
}
