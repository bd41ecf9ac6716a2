//! Movement of LP and reward assets in and out of the contract's custody.

use soroban_sdk::{contractclient, token, Address, Env};

use crate::{math, Asset, ContractError};

/// Multi-asset token: one contract, many token classes addressed by `id`.
#[contractclient(name = "MultiAssetClient")]
pub trait MultiAssetInterface {
    /// Move `amount` of class `id`; `from` must authorize. Returns `false`
    /// instead of trapping when the move is refused.
    fn transfer(env: Env, from: Address, to: Address, id: u128, amount: i128) -> bool;
}

/// Move `amount` of `asset` from `from` into the contract.
pub fn pull(env: &Env, asset: &Asset, from: &Address, amount: u128) -> Result<(), ContractError> {
    if amount == 0 {
        return Ok(());
    }
    let to = env.current_contract_address();
    if move_asset(env, asset, from, &to, amount)? {
        Ok(())
    } else {
        Err(ContractError::TransferFromFailed)
    }
}

/// Move `amount` of `asset` out of the contract to `to`.
pub fn push(env: &Env, asset: &Asset, to: &Address, amount: u128) -> Result<(), ContractError> {
    if amount == 0 {
        return Ok(());
    }
    let from = env.current_contract_address();
    if move_asset(env, asset, &from, to, amount)? {
        Ok(())
    } else {
        Err(ContractError::TransferFailed)
    }
}

fn move_asset(
    env: &Env,
    asset: &Asset,
    from: &Address,
    to: &Address,
    amount: u128,
) -> Result<bool, ContractError> {
    let amount = math::to_amount(amount)?;
    let moved = if asset.id == 0 {
        matches!(
            token::Client::new(env, &asset.contract).try_transfer(from, to, &amount),
            Ok(Ok(()))
        )
    } else {
        matches!(
            MultiAssetClient::new(env, &asset.contract).try_transfer(from, to, &asset.id, &amount),
            Ok(Ok(true))
        )
    };
    Ok(moved)
}
