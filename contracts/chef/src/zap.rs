//! Single-sided liquidity zap.
//!
//! The user supplies only `token0` of an AMM pool. Part of it is swapped into
//! `token1`, both legs are added as liquidity with the LP position minted to
//! this contract, and whatever the pool did not consume is recovered straight
//! back to the user. The AMM works on transient balances: tokens are pushed to
//! it before each call and unconsumed amounts are claimed with `recover`.

use soroban_sdk::{contractclient, contracttype, Address, Env};

use crate::{assets, math, Asset, ContractError};

/// Identifies an AMM pool. The pool's LP class id is `pool_id(key)`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolKey {
    pub token0: Address,
    pub id0: u128,
    pub token1: Address,
    pub id1: u128,
    pub fee: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ZapParams {
    /// AMM contract that issues the pool's LP positions.
    pub lp_token: Address,
    pub key: PoolKey,
    /// Total `token0` pulled from the user.
    pub amount_in: i128,
    /// Portion of `amount_in` swapped into `token1`.
    pub swap_amount: i128,
    pub amount_out_min: i128,
    pub amount0_min: i128,
    pub amount1_min: i128,
}

#[contractclient(name = "LiquidityClient")]
pub trait LiquidityInterface {
    fn pool_id(env: Env, key: PoolKey) -> u128;

    fn swap_exact_in(
        env: Env,
        sender: Address,
        key: PoolKey,
        amount_in: i128,
        amount_out_min: i128,
        zero_for_one: bool,
        to: Address,
    ) -> i128;

    /// Returns `(amount0_used, amount1_used, liquidity)`.
    fn add_liquidity(
        env: Env,
        sender: Address,
        key: PoolKey,
        amount0_desired: i128,
        amount1_desired: i128,
        amount0_min: i128,
        amount1_min: i128,
        to: Address,
    ) -> (i128, i128, i128);

    fn recover(env: Env, sender: Address, token: Address, id: u128, to: Address) -> i128;
}

/// Validate the shape of a zap request before any state is read. Returns
/// `(amount_in, swap_amount)` as unsigned units.
pub(crate) fn validate(params: &ZapParams) -> Result<(u128, u128), ContractError> {
    let amount_in = math::to_units(params.amount_in)?;
    if params.swap_amount <= 0 || params.swap_amount >= params.amount_in {
        return Err(ContractError::NoWant);
    }
    let key = &params.key;
    if key.id0 != 0 || key.id1 != 0 || key.token0 == key.token1 {
        return Err(ContractError::InvalidPoolKey);
    }
    Ok((amount_in, params.swap_amount as u128))
}

/// Pool id the AMM assigns to `key`.
pub(crate) fn pool_id(env: &Env, amm: &Address, key: &PoolKey) -> Result<u128, ContractError> {
    match LiquidityClient::new(env, amm).try_pool_id(key) {
        Ok(Ok(id)) => Ok(id),
        _ => Err(ContractError::InvalidPoolKey),
    }
}

/// Convert `amount_in` of `token0` held by `user` into LP liquidity owned by
/// this contract. Returns the liquidity minted.
pub(crate) fn convert(
    env: &Env,
    user: &Address,
    params: &ZapParams,
    amount_in: u128,
    swap_amount: u128,
) -> Result<u128, ContractError> {
    let this = env.current_contract_address();
    let amm = LiquidityClient::new(env, &params.lp_token);
    let key = &params.key;
    let leg0 = Asset {
        contract: key.token0.clone(),
        id: 0,
    };
    let leg1 = Asset {
        contract: key.token1.clone(),
        id: 0,
    };

    assets::pull(env, &leg0, user, amount_in)?;

    assets::push(env, &leg0, &params.lp_token, swap_amount)?;
    let bought = match amm.try_swap_exact_in(
        &this,
        key,
        &params.swap_amount,
        &params.amount_out_min,
        &true,
        &this,
    ) {
        Ok(Ok(out)) if out > 0 => out as u128,
        _ => return Err(ContractError::SwapExactInFail),
    };

    let amount0 = amount_in - swap_amount;
    assets::push(env, &leg0, &params.lp_token, amount0)?;
    assets::push(env, &leg1, &params.lp_token, bought)?;
    let (used0, used1, liquidity) = match amm.try_add_liquidity(
        &this,
        key,
        &math::to_amount(amount0)?,
        &math::to_amount(bought)?,
        &params.amount0_min,
        &params.amount1_min,
        &this,
    ) {
        Ok(Ok((used0, used1, liquidity))) if liquidity > 0 => (used0, used1, liquidity as u128),
        _ => return Err(ContractError::AddLiquidityFail),
    };

    if used0 < math::to_amount(amount0)? {
        recover(&amm, &this, &key.token0, user)?;
    }
    if used1 < math::to_amount(bought)? {
        recover(&amm, &this, &key.token1, user)?;
    }

    Ok(liquidity)
}

fn recover(
    amm: &LiquidityClient,
    this: &Address,
    token: &Address,
    to: &Address,
) -> Result<(), ContractError> {
    match amm.try_recover(this, token, &0u128, to) {
        Ok(Ok(_)) => Ok(()),
        _ => Err(ContractError::TransferFailed),
    }
}
