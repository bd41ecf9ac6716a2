//! Share ledger: the staking receipt.
//!
//! One balance table keyed by `(owner, stream id)`. Balances only move through
//! [`mint`] and [`burn`]; each change publishes a `transfer` event with `None`
//! standing in for the mint source or burn sink.

use soroban_sdk::{symbol_short, Address, BytesN, Env};

use crate::storage::{BUMP_AMOUNT, LIFETIME_THRESHOLD};
use crate::{ContractError, DataKey};

/// Reading a live balance also bumps it; a staker may sit untouched for
/// longer than one bump.
pub fn balance(env: &Env, owner: &Address, stream_id: &BytesN<32>) -> u128 {
    let key = DataKey::Balance(owner.clone(), stream_id.clone());
    match env.storage().persistent().get::<_, u128>(&key) {
        Some(amount) => {
            env.storage()
                .persistent()
                .extend_ttl(&key, LIFETIME_THRESHOLD, BUMP_AMOUNT);
            amount
        }
        None => 0,
    }
}

fn write_balance(env: &Env, owner: &Address, stream_id: &BytesN<32>, amount: u128) {
    let key = DataKey::Balance(owner.clone(), stream_id.clone());
    if amount == 0 {
        env.storage().persistent().remove(&key);
        return;
    }
    env.storage().persistent().set(&key, &amount);
    env.storage()
        .persistent()
        .extend_ttl(&key, LIFETIME_THRESHOLD, BUMP_AMOUNT);
}

pub fn mint(
    env: &Env,
    to: &Address,
    stream_id: &BytesN<32>,
    amount: u128,
) -> Result<(), ContractError> {
    let updated = balance(env, to, stream_id)
        .checked_add(amount)
        .ok_or(ContractError::Overflow)?;
    write_balance(env, to, stream_id, updated);
    publish_transfer(env, stream_id, None, Some(to.clone()), amount);
    Ok(())
}

pub fn burn(
    env: &Env,
    from: &Address,
    stream_id: &BytesN<32>,
    amount: u128,
) -> Result<(), ContractError> {
    let updated = balance(env, from, stream_id)
        .checked_sub(amount)
        .ok_or(ContractError::InsufficientBalance)?;
    write_balance(env, from, stream_id, updated);
    publish_transfer(env, stream_id, Some(from.clone()), None, amount);
    Ok(())
}

fn publish_transfer(
    env: &Env,
    stream_id: &BytesN<32>,
    from: Option<Address>,
    to: Option<Address>,
    amount: u128,
) {
    env.events().publish(
        (symbol_short!("transfer"), stream_id.clone()),
        (from, to, amount),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreamChef;
    use soroban_sdk::testutils::{storage::Persistent as _, Address as _, Ledger};

    #[test]
    fn mint_and_burn_track_balances_per_stream() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamChef);
        let alice = Address::generate(&env);
        let a = BytesN::from_array(&env, &[1u8; 32]);
        let b = BytesN::from_array(&env, &[2u8; 32]);

        env.as_contract(&contract_id, || {
            mint(&env, &alice, &a, 70).unwrap();
            mint(&env, &alice, &b, 5).unwrap();
            burn(&env, &alice, &a, 20).unwrap();

            assert_eq!(balance(&env, &alice, &a), 50);
            assert_eq!(balance(&env, &alice, &b), 5);

            assert_eq!(
                burn(&env, &alice, &b, 6),
                Err(ContractError::InsufficientBalance)
            );
            burn(&env, &alice, &b, 5).unwrap();
            assert_eq!(balance(&env, &alice, &b), 0);
        });
    }

    #[test]
    fn mint_rejects_balance_overflow() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamChef);
        let alice = Address::generate(&env);
        let id = BytesN::from_array(&env, &[9u8; 32]);

        env.as_contract(&contract_id, || {
            mint(&env, &alice, &id, u128::MAX).unwrap();
            assert_eq!(mint(&env, &alice, &id, 1), Err(ContractError::Overflow));
        });
    }

    #[test]
    fn reading_balance_extends_its_ttl() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamChef);
        let alice = Address::generate(&env);
        let id = BytesN::from_array(&env, &[3u8; 32]);
        let key = DataKey::Balance(alice.clone(), id.clone());

        env.as_contract(&contract_id, || {
            mint(&env, &alice, &id, 10).unwrap();
            env.storage()
                .instance()
                .extend_ttl(LIFETIME_THRESHOLD, BUMP_AMOUNT);
        });
        env.ledger().with_mut(|li| li.sequence_number += BUMP_AMOUNT - 1000);

        env.as_contract(&contract_id, || {
            let before = env.storage().persistent().get_ttl(&key);
            assert_eq!(balance(&env, &alice, &id), 10);
            assert!(env.storage().persistent().get_ttl(&key) > before);
        });
    }
}
