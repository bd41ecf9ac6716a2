use soroban_sdk::{Address, BytesN, Env};

use crate::{Config, ContractError, DataKey, Stream};

// Persistent entries are bumped to `BUMP_AMOUNT` ledgers whenever their TTL
// falls under `LIFETIME_THRESHOLD`.
pub(crate) const LIFETIME_THRESHOLD: u32 = 17280;
pub(crate) const BUMP_AMOUNT: u32 = 120960;

pub(crate) fn get_config(env: &Env) -> Result<Config, ContractError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(ContractError::NotInitialized)
}

pub(crate) fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub(crate) fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
    env.storage()
        .instance()
        .extend_ttl(LIFETIME_THRESHOLD, BUMP_AMOUNT);
}

pub(crate) fn has_stream(env: &Env, stream_id: &BytesN<32>) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Stream(stream_id.clone()))
}

pub(crate) fn load_stream(env: &Env, stream_id: &BytesN<32>) -> Result<Stream, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Stream(stream_id.clone()))
        .ok_or(ContractError::NoPool)
}

pub(crate) fn save_stream(env: &Env, stream_id: &BytesN<32>, stream: &Stream) {
    let key = DataKey::Stream(stream_id.clone());
    env.storage().persistent().set(&key, stream);
    env.storage()
        .persistent()
        .extend_ttl(&key, LIFETIME_THRESHOLD, BUMP_AMOUNT);
}

/// Only read by `sweep_remainder`, often long after creation, so reads bump
/// the entry too.
pub(crate) fn load_creator(env: &Env, stream_id: &BytesN<32>) -> Result<Address, ContractError> {
    let key = DataKey::Creator(stream_id.clone());
    let creator = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(ContractError::NoPool)?;
    env.storage()
        .persistent()
        .extend_ttl(&key, LIFETIME_THRESHOLD, BUMP_AMOUNT);
    Ok(creator)
}

pub(crate) fn save_creator(env: &Env, stream_id: &BytesN<32>, creator: &Address) {
    let key = DataKey::Creator(stream_id.clone());
    env.storage().persistent().set(&key, creator);
    env.storage()
        .persistent()
        .extend_ttl(&key, LIFETIME_THRESHOLD, BUMP_AMOUNT);
}

pub(crate) fn load_debt(env: &Env, stream_id: &BytesN<32>, user: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::Debt(stream_id.clone(), user.clone()))
        .unwrap_or(0)
}

/// A zero debt removes the entry rather than storing it.
pub(crate) fn save_debt(env: &Env, stream_id: &BytesN<32>, user: &Address, debt: u128) {
    let key = DataKey::Debt(stream_id.clone(), user.clone());
    if debt == 0 {
        env.storage().persistent().remove(&key);
        return;
    }
    env.storage().persistent().set(&key, &debt);
    env.storage()
        .persistent()
        .extend_ttl(&key, LIFETIME_THRESHOLD, BUMP_AMOUNT);
}
