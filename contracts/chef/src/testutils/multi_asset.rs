use soroban_sdk::{contract, contractimpl, contracttype, Address, Env};

#[contracttype]
enum MultiAssetKey {
    Balance(Address, u128),
    Refuse,
}

/// Multi-asset token keeping one balance per `(owner, id)`.
///
/// Balances are held as `u128` so custody can exceed a single `i128` amount.
/// `set_refuse(true)` makes every transfer report failure, which is how the
/// tests simulate a reward token that stops paying out.
#[contract]
pub struct MockMultiAsset;

#[contractimpl]
impl MockMultiAsset {
    pub fn mint(env: Env, to: Address, id: u128, amount: i128) {
        let key = MultiAssetKey::Balance(to, id);
        let balance = Self::held(&env, &key);
        env.storage()
            .persistent()
            .set(&key, &(balance + amount as u128));
    }

    pub fn set_refuse(env: Env, refuse: bool) {
        env.storage().instance().set(&MultiAssetKey::Refuse, &refuse);
    }

    pub fn balance(env: Env, owner: Address, id: u128) -> i128 {
        let held = Self::held(&env, &MultiAssetKey::Balance(owner, id));
        i128::try_from(held).unwrap_or(i128::MAX)
    }

    pub fn transfer(env: Env, from: Address, to: Address, id: u128, amount: i128) -> bool {
        from.require_auth();
        let refuse: bool = env
            .storage()
            .instance()
            .get(&MultiAssetKey::Refuse)
            .unwrap_or(false);
        if refuse || amount < 0 {
            return false;
        }
        let amount = amount as u128;

        let from_key = MultiAssetKey::Balance(from, id);
        let from_balance = Self::held(&env, &from_key);
        if from_balance < amount {
            return false;
        }
        env.storage()
            .persistent()
            .set(&from_key, &(from_balance - amount));

        let to_key = MultiAssetKey::Balance(to, id);
        let to_balance = Self::held(&env, &to_key);
        env.storage()
            .persistent()
            .set(&to_key, &(to_balance + amount));
        true
    }

    fn held(env: &Env, key: &MultiAssetKey) -> u128 {
        env.storage().persistent().get(key).unwrap_or(0)
    }
}
