use soroban_sdk::{contract, contractimpl, contracttype, Address, BytesN, Env};

use crate::StreamChefClient;

#[contracttype]
enum ReentrantKey {
    Target,
    Attempts,
    Rejected,
}

/// Fungible token whose `transfer` calls back into the chef.
///
/// Once armed, every transfer attempts `harvest(user, stream_id)` on the chef
/// before returning, and counts how many of those nested calls were refused.
/// Balances are not tracked; transfers always succeed.
#[contract]
pub struct MockReentrantToken;

#[contractimpl]
impl MockReentrantToken {
    pub fn arm(env: Env, chef: Address, user: Address, stream_id: BytesN<32>) {
        env.storage()
            .instance()
            .set(&ReentrantKey::Target, &(chef, user, stream_id));
    }

    pub fn transfer(env: Env, from: Address, _to: Address, _amount: i128) {
        from.require_auth();
        let target: Option<(Address, Address, BytesN<32>)> =
            env.storage().instance().get(&ReentrantKey::Target);
        let Some((chef, user, stream_id)) = target else {
            return;
        };

        Self::bump(&env, ReentrantKey::Attempts);
        if StreamChefClient::new(&env, &chef)
            .try_harvest(&user, &stream_id)
            .is_err()
        {
            Self::bump(&env, ReentrantKey::Rejected);
        }
    }

    pub fn attempts(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&ReentrantKey::Attempts)
            .unwrap_or(0)
    }

    pub fn rejected(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&ReentrantKey::Rejected)
            .unwrap_or(0)
    }

    fn bump(env: &Env, key: ReentrantKey) {
        let count: u32 = env.storage().instance().get(&key).unwrap_or(0);
        env.storage().instance().set(&key, &(count + 1));
    }
}
