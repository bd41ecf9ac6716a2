use soroban_sdk::Env;

use crate::{ContractError, DataKey};

/// Process-wide lock held for the whole of a mutating call.
///
/// The flag lives in instance storage and is cleared when the guard drops, on
/// success and error paths alike. A nested mutating entry while it is held
/// fails with `Reentrancy`.
pub(crate) struct ReentrancyGuard {
    env: Env,
}

impl ReentrancyGuard {
    pub(crate) fn acquire(env: &Env) -> Result<Self, ContractError> {
        let storage = env.storage().instance();
        if storage.has(&DataKey::Locked) {
            return Err(ContractError::Reentrancy);
        }
        storage.set(&DataKey::Locked, &true);
        Ok(Self { env: env.clone() })
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.env.storage().instance().remove(&DataKey::Locked);
    }
}
