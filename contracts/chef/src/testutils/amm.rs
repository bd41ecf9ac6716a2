use soroban_sdk::{
    contract, contractimpl, contracttype, token, xdr::ToXdr, Address, BytesN, Env,
};

use crate::PoolKey;

#[contracttype]
enum AmmKey {
    Lp(Address, u128),
    Transient(Address, Address),
    FailSwap,
    FailAdd,
}

/// Constant-price AMM that also issues its LP positions as a multi-asset
/// token.
///
/// Swaps are 1:1 out of reserves minted to the AMM by the test. Liquidity
/// consumes `min(amount0, amount1)` of each leg and mints that much LP; the
/// rest stays as a transient balance of the sender until `recover`ed. Tokens
/// are expected to be pushed to the AMM before each call.
#[contract]
pub struct MockAmm;

#[contractimpl]
impl MockAmm {
    pub fn pool_id(env: Env, key: PoolKey) -> u128 {
        let digest: BytesN<32> = env.crypto().sha256(&key.to_xdr(&env)).into();
        let bytes = digest.to_array();
        let mut high = [0u8; 16];
        high.copy_from_slice(&bytes[..16]);
        u128::from_be_bytes(high)
    }

    pub fn set_fail_swap(env: Env, fail: bool) {
        env.storage().instance().set(&AmmKey::FailSwap, &fail);
    }

    pub fn set_fail_add(env: Env, fail: bool) {
        env.storage().instance().set(&AmmKey::FailAdd, &fail);
    }

    pub fn swap_exact_in(
        env: Env,
        sender: Address,
        key: PoolKey,
        amount_in: i128,
        amount_out_min: i128,
        zero_for_one: bool,
        to: Address,
    ) -> i128 {
        sender.require_auth();
        if Self::flag(&env, AmmKey::FailSwap) || amount_in < amount_out_min {
            return 0;
        }
        let out_token = if zero_for_one { key.token1 } else { key.token0 };
        token::Client::new(&env, &out_token).transfer(
            &env.current_contract_address(),
            &to,
            &amount_in,
        );
        amount_in
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        env: Env,
        sender: Address,
        key: PoolKey,
        amount0_desired: i128,
        amount1_desired: i128,
        amount0_min: i128,
        amount1_min: i128,
        to: Address,
    ) -> (i128, i128, i128) {
        sender.require_auth();
        let used = core::cmp::min(amount0_desired, amount1_desired);
        if Self::flag(&env, AmmKey::FailAdd) || used < amount0_min || used < amount1_min {
            return (0, 0, 0);
        }

        Self::credit_transient(&env, &sender, &key.token0, amount0_desired - used);
        Self::credit_transient(&env, &sender, &key.token1, amount1_desired - used);

        let lp_key = AmmKey::Lp(to, Self::pool_id(env.clone(), key));
        let held: i128 = env.storage().persistent().get(&lp_key).unwrap_or(0);
        env.storage().persistent().set(&lp_key, &(held + used));
        (used, used, used)
    }

    pub fn recover(env: Env, sender: Address, token: Address, _id: u128, to: Address) -> i128 {
        sender.require_auth();
        let key = AmmKey::Transient(sender, token.clone());
        let amount: i128 = env.storage().persistent().get(&key).unwrap_or(0);
        env.storage().persistent().remove(&key);
        if amount > 0 {
            token::Client::new(&env, &token).transfer(
                &env.current_contract_address(),
                &to,
                &amount,
            );
        }
        amount
    }

    pub fn transfer(env: Env, from: Address, to: Address, id: u128, amount: i128) -> bool {
        from.require_auth();
        let from_key = AmmKey::Lp(from, id);
        let from_balance: i128 = env.storage().persistent().get(&from_key).unwrap_or(0);
        if amount < 0 || from_balance < amount {
            return false;
        }
        env.storage()
            .persistent()
            .set(&from_key, &(from_balance - amount));
        let to_key = AmmKey::Lp(to, id);
        let to_balance: i128 = env.storage().persistent().get(&to_key).unwrap_or(0);
        env.storage().persistent().set(&to_key, &(to_balance + amount));
        true
    }

    pub fn balance(env: Env, owner: Address, id: u128) -> i128 {
        env.storage()
            .persistent()
            .get(&AmmKey::Lp(owner, id))
            .unwrap_or(0)
    }

    /// Unrecovered leftover of `token` held for `sender`.
    pub fn transient(env: Env, sender: Address, token: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&AmmKey::Transient(sender, token))
            .unwrap_or(0)
    }

    fn flag(env: &Env, key: AmmKey) -> bool {
        env.storage().instance().get(&key).unwrap_or(false)
    }

    fn credit_transient(env: &Env, sender: &Address, token: &Address, amount: i128) {
        if amount <= 0 {
            return;
        }
        let key = AmmKey::Transient(sender.clone(), token.clone());
        let held: i128 = env.storage().persistent().get(&key).unwrap_or(0);
        env.storage().persistent().set(&key, &(held + amount));
    }
}
