#![no_std]

mod accrual;
mod assets;
mod guard;
mod ledger;
mod math;
mod storage;
mod zap;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, xdr::ToXdr, Address,
    BytesN, Env,
};

pub use assets::{MultiAssetClient, MultiAssetInterface};
pub use math::{ACC_PRECISION, MAX_DURATION, YEAR};
pub use zap::{LiquidityClient, LiquidityInterface, PoolKey, ZapParams};

use accrual::{accrue, Accrual};
use guard::ReentrancyGuard;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Global configuration for the chef.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub admin: Address,
    /// AMM trusted by the liquidity zap.
    pub amm: Address,
}

/// A token held or paid by a stream. `id == 0` names a SEP-41 fungible token;
/// any other value names a class of a multi-asset token.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Asset {
    pub contract: Address,
    pub id: u128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stream {
    pub lp: Asset,
    pub reward: Asset,
    /// Reward units per second, scaled by `ACC_PRECISION`.
    pub reward_rate: u128,
    pub end: u64,
    pub last_update: u64,
    pub total_shares: u128,
    /// Reward per share since creation, scaled by `ACC_PRECISION`.
    pub acc_reward_per_share: u128,
}

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    ZeroAmount = 3,
    InvalidAmount = 4,
    InvalidDuration = 5,
    NoWant = 6,
    Overflow = 7,
    PrecisionOverflow = 8,
    Exists = 9,
    NoPool = 10,
    NoStake = 11,
    Unauthorized = 12,
    StreamEnded = 13,
    StreamActive = 14,
    StakeRemaining = 15,
    NothingToSweep = 16,
    LpMismatch = 17,
    SamePool = 18,
    Reentrancy = 19,
    TransferFailed = 20,
    TransferFromFailed = 21,
    InsufficientBalance = 22,
    InvalidPoolKey = 23,
    InvalidPoolAmm = 24,
    InvalidPoolId = 25,
    SwapExactInFail = 26,
    AddLiquidityFail = 27,
}

/// Namespace for all contract storage keys.
#[contracttype]
pub enum DataKey {
    Config,                       // Instance: admin and trusted AMM.
    Locked,                       // Instance: re-entrancy flag.
    Stream(BytesN<32>),           // Persistent: stream state.
    Creator(BytesN<32>),          // Persistent: who may sweep a stream.
    Debt(BytesN<32>, Address),    // Persistent: (stream, user) reward debt.
    Balance(Address, BytesN<32>), // Persistent: (owner, stream) share balance.
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

impl StreamChef {
    /// Run the accrual updater on an in-memory stream and announce any idle
    /// extension.
    fn update(env: &Env, stream_id: &BytesN<32>, stream: &mut Stream) -> Result<(), ContractError> {
        let now = env.ledger().timestamp();
        if let Accrual::Idle {
            extended_to: Some(end),
        } = accrue(env, stream, now)?
        {
            log!(env, "idle stream extended", stream_id.clone(), end);
            env.events()
                .publish((symbol_short!("extended"), stream_id.clone()), end);
        }
        Ok(())
    }

    /// Add `amount` fresh shares for `user` against an already updated
    /// stream. The LP backing them must already be in custody.
    fn credit(
        env: &Env,
        stream_id: &BytesN<32>,
        stream: &mut Stream,
        user: &Address,
        amount: u128,
    ) -> Result<(), ContractError> {
        stream.total_shares = stream
            .total_shares
            .checked_add(amount)
            .ok_or(ContractError::Overflow)?;
        ledger::mint(env, user, stream_id, amount)?;

        let debt = storage::load_debt(env, stream_id, user)
            .checked_add(math::accrued(env, amount, stream.acc_reward_per_share)?)
            .ok_or(ContractError::Overflow)?;
        storage::save_debt(env, stream_id, user, debt);
        Ok(())
    }

    /// Settle the user's whole position and remove `shares` of it from an
    /// already updated stream. Returns the pending reward owed.
    fn debit(
        env: &Env,
        stream_id: &BytesN<32>,
        stream: &mut Stream,
        user: &Address,
        shares: u128,
    ) -> Result<u128, ContractError> {
        let held = ledger::balance(env, user, stream_id);
        let acc = stream.acc_reward_per_share;
        let pending = math::pending(env, held, acc, storage::load_debt(env, stream_id, user))?;

        ledger::burn(env, user, stream_id, shares)?;
        stream.total_shares = stream
            .total_shares
            .checked_sub(shares)
            .ok_or(ContractError::Overflow)?;

        storage::save_debt(env, stream_id, user, math::accrued(env, held - shares, acc)?);
        Ok(pending)
    }

    fn require_open(env: &Env, stream: &Stream) -> Result<(), ContractError> {
        if env.ledger().timestamp() >= stream.end {
            return Err(ContractError::StreamEnded);
        }
        Ok(())
    }

    fn derive_stream_id(
        env: &Env,
        creator: &Address,
        lp: &Asset,
        reward: &Asset,
        amount: i128,
        duration: u64,
        salt: &BytesN<32>,
    ) -> BytesN<32> {
        let preimage = (
            symbol_short!("chef"),
            creator.clone(),
            lp.clone(),
            reward.clone(),
            amount,
            duration,
            salt.clone(),
        )
            .to_xdr(env);
        env.crypto().sha256(&preimage).into()
    }
}

// ---------------------------------------------------------------------------
// Contract Implementation
// ---------------------------------------------------------------------------

#[contract]
pub struct StreamChef;

#[contractimpl]
impl StreamChef {
    /// Initialise the chef with its admin and the AMM trusted by the zap.
    ///
    /// # Errors
    /// - `AlreadyInitialized` if called more than once.
    pub fn init(env: Env, admin: Address, amm: Address) -> Result<(), ContractError> {
        if storage::has_config(&env) {
            return Err(ContractError::AlreadyInitialized);
        }
        storage::set_config(&env, &Config { admin, amm });
        Ok(())
    }

    /// Lock `amount` of `reward` into a new stream paying LP stakers over
    /// `duration` seconds.
    ///
    /// The id is content-addressed: `sha256` over the creator and every
    /// creation parameter, `salt` included. Re-submitting identical
    /// parameters therefore fails with `Exists`, and integrators can predict
    /// the id with [`compute_stream_id`](Self::compute_stream_id).
    ///
    /// # Authorization
    /// - `creator`
    ///
    /// # Errors
    /// - `ZeroAmount` / `InvalidAmount` for a zero or negative `amount`
    /// - `InvalidDuration` unless `0 < duration <= MAX_DURATION`
    /// - `PrecisionOverflow` if `amount * ACC_PRECISION` exceeds 128 bits
    /// - `Overflow` if `now + duration` wraps
    /// - `Exists` if the id is already taken
    /// - `TransferFromFailed` if the reward cannot be pulled from `creator`
    ///
    /// # Events
    /// - `created(stream_id) -> (creator, amount, end)`
    pub fn create_stream(
        env: Env,
        creator: Address,
        lp: Asset,
        reward: Asset,
        amount: i128,
        duration: u64,
        salt: BytesN<32>,
    ) -> Result<BytesN<32>, ContractError> {
        let _guard = ReentrancyGuard::acquire(&env)?;
        creator.require_auth();

        let units = math::to_units(amount)?;
        if duration == 0 || duration > MAX_DURATION {
            return Err(ContractError::InvalidDuration);
        }
        let reward_rate = math::reward_rate(units, duration)?;

        let now = env.ledger().timestamp();
        let end = now.checked_add(duration).ok_or(ContractError::Overflow)?;

        let stream_id =
            Self::derive_stream_id(&env, &creator, &lp, &reward, amount, duration, &salt);
        if storage::has_stream(&env, &stream_id) {
            return Err(ContractError::Exists);
        }

        let stream = Stream {
            lp,
            reward,
            reward_rate,
            end,
            last_update: now,
            total_shares: 0,
            acc_reward_per_share: 0,
        };
        storage::save_stream(&env, &stream_id, &stream);
        storage::save_creator(&env, &stream_id, &creator);

        assets::pull(&env, &stream.reward, &creator, units)?;

        env.events().publish(
            (symbol_short!("created"), stream_id.clone()),
            (creator, amount, end),
        );
        Ok(stream_id)
    }

    /// Stake `amount` of the stream's LP asset, minting the same number of
    /// shares.
    ///
    /// Reward accrued on shares already held is not paid out here; the debt
    /// grows only by what the new shares would have earned so far.
    ///
    /// # Errors
    /// - `ZeroAmount` / `InvalidAmount`
    /// - `NoPool` for an unknown stream
    /// - `StreamEnded` once `now >= end` (after idle extension)
    /// - `Overflow` if total shares would exceed 128 bits
    /// - `TransferFromFailed` if the LP cannot be pulled
    pub fn deposit(
        env: Env,
        user: Address,
        stream_id: BytesN<32>,
        amount: i128,
    ) -> Result<(), ContractError> {
        let _guard = ReentrancyGuard::acquire(&env)?;
        user.require_auth();

        let units = math::to_units(amount)?;
        let mut stream = storage::load_stream(&env, &stream_id)?;
        Self::update(&env, &stream_id, &mut stream)?;
        Self::require_open(&env, &stream)?;

        Self::credit(&env, &stream_id, &mut stream, &user, units)?;
        storage::save_stream(&env, &stream_id, &stream);

        assets::pull(&env, &stream.lp, &user, units)?;

        env.events()
            .publish((symbol_short!("deposit"), stream_id), (user, amount));
        Ok(())
    }

    /// Burn `shares`, return that much LP and pay all pending reward.
    ///
    /// Pending reward is computed on the whole position, so a partial
    /// withdrawal pays everything accrued so far; the remaining shares start
    /// again from zero pending.
    ///
    /// # Returns
    /// - reward paid
    ///
    /// # Errors
    /// - `ZeroAmount` / `InvalidAmount`
    /// - `NoPool`
    /// - `InsufficientBalance` if `shares` exceeds the user's balance
    /// - `TransferFailed` if either payout fails
    pub fn withdraw(
        env: Env,
        user: Address,
        stream_id: BytesN<32>,
        shares: i128,
    ) -> Result<i128, ContractError> {
        let _guard = ReentrancyGuard::acquire(&env)?;
        user.require_auth();

        let units = math::to_units(shares)?;
        let mut stream = storage::load_stream(&env, &stream_id)?;
        Self::update(&env, &stream_id, &mut stream)?;

        let pending = Self::debit(&env, &stream_id, &mut stream, &user, units)?;
        storage::save_stream(&env, &stream_id, &stream);

        assets::push(&env, &stream.lp, &user, units)?;
        assets::push(&env, &stream.reward, &user, pending)?;

        let paid = math::to_amount(pending)?;
        env.events().publish(
            (symbol_short!("withdraw"), stream_id),
            (user, shares, paid),
        );
        Ok(paid)
    }

    /// Pay pending reward without touching shares.
    ///
    /// # Errors
    /// - `NoStake` if the user holds no shares
    /// - `NoPool`
    /// - `TransferFailed`
    pub fn harvest(env: Env, user: Address, stream_id: BytesN<32>) -> Result<i128, ContractError> {
        let _guard = ReentrancyGuard::acquire(&env)?;
        user.require_auth();

        let shares = ledger::balance(&env, &user, &stream_id);
        if shares == 0 {
            return Err(ContractError::NoStake);
        }
        let mut stream = storage::load_stream(&env, &stream_id)?;
        Self::update(&env, &stream_id, &mut stream)?;

        let acc = stream.acc_reward_per_share;
        let pending = math::pending(
            &env,
            shares,
            acc,
            storage::load_debt(&env, &stream_id, &user),
        )?;
        storage::save_debt(&env, &stream_id, &user, math::accrued(&env, shares, acc)?);
        storage::save_stream(&env, &stream_id, &stream);

        assets::push(&env, &stream.reward, &user, pending)?;

        let paid = math::to_amount(pending)?;
        env.events()
            .publish((symbol_short!("harvest"), stream_id), (user, paid));
        Ok(paid)
    }

    /// Leave a stream immediately, forfeiting all pending reward.
    ///
    /// Skips the accrual updater and never touches the reward asset, so it
    /// stays usable when the reward token misbehaves.
    ///
    /// # Returns
    /// - LP returned
    ///
    /// # Errors
    /// - `NoStake` if the user holds no shares
    /// - `NoPool`
    /// - `TransferFailed` if the LP cannot be returned
    pub fn emergency_withdraw(
        env: Env,
        user: Address,
        stream_id: BytesN<32>,
    ) -> Result<i128, ContractError> {
        let _guard = ReentrancyGuard::acquire(&env)?;
        user.require_auth();

        let shares = ledger::balance(&env, &user, &stream_id);
        if shares == 0 {
            return Err(ContractError::NoStake);
        }
        let mut stream = storage::load_stream(&env, &stream_id)?;

        ledger::burn(&env, &user, &stream_id, shares)?;
        stream.total_shares = stream
            .total_shares
            .checked_sub(shares)
            .ok_or(ContractError::Overflow)?;
        storage::save_debt(&env, &stream_id, &user, 0);
        storage::save_stream(&env, &stream_id, &stream);

        assets::push(&env, &stream.lp, &user, shares)?;

        let returned = math::to_amount(shares)?;
        env.events()
            .publish((symbol_short!("emergency"), stream_id), (user, returned));
        Ok(returned)
    }

    /// Send the reward a finished, unstaked stream never emitted to `to`.
    ///
    /// Only idle time that was never extended away is left over: stake that
    /// left mid-stream before `end`, or a stream nobody touched after its
    /// last staker left.
    ///
    /// # Authorization
    /// - `caller`, who must be the stream's creator
    ///
    /// # Errors
    /// - `NoPool`
    /// - `Unauthorized` if `caller` is not the creator
    /// - `StreamActive` while `now <= end`
    /// - `StakeRemaining` while any shares are outstanding
    /// - `NothingToSweep` if nothing is left (including a second sweep)
    pub fn sweep_remainder(
        env: Env,
        caller: Address,
        stream_id: BytesN<32>,
        to: Address,
    ) -> Result<i128, ContractError> {
        let _guard = ReentrancyGuard::acquire(&env)?;
        caller.require_auth();

        if storage::load_creator(&env, &stream_id)? != caller {
            return Err(ContractError::Unauthorized);
        }
        let mut stream = storage::load_stream(&env, &stream_id)?;
        if env.ledger().timestamp() <= stream.end {
            return Err(ContractError::StreamActive);
        }
        if stream.total_shares != 0 {
            return Err(ContractError::StakeRemaining);
        }

        let span = stream.end.saturating_sub(stream.last_update);
        let amount = math::undistributed(&env, span, stream.reward_rate)?;
        if amount == 0 {
            return Err(ContractError::NothingToSweep);
        }

        stream.last_update = stream.end;
        storage::save_stream(&env, &stream_id, &stream);

        assets::push(&env, &stream.reward, &to, amount)?;

        let swept = math::to_amount(amount)?;
        log!(&env, "swept remainder", stream_id.clone(), swept);
        env.events()
            .publish((symbol_short!("sweep"), stream_id), (to, swept));
        Ok(swept)
    }

    /// Move `shares` from one stream to another staking the same LP asset
    /// without the LP leaving custody. Pending reward on the source position
    /// is paid out.
    ///
    /// # Returns
    /// - reward paid from the source stream
    ///
    /// # Errors
    /// - `ZeroAmount` / `InvalidAmount`
    /// - `SamePool` if `from == to`
    /// - `NoPool` for either stream
    /// - `InsufficientBalance`
    /// - `LpMismatch` if the streams stake different LP assets
    /// - `StreamEnded` if the destination has ended
    pub fn migrate(
        env: Env,
        user: Address,
        from: BytesN<32>,
        to: BytesN<32>,
        shares: i128,
    ) -> Result<i128, ContractError> {
        let _guard = ReentrancyGuard::acquire(&env)?;
        user.require_auth();

        let units = math::to_units(shares)?;
        if from == to {
            return Err(ContractError::SamePool);
        }

        let mut source = storage::load_stream(&env, &from)?;
        Self::update(&env, &from, &mut source)?;
        let pending = Self::debit(&env, &from, &mut source, &user, units)?;

        let mut target = storage::load_stream(&env, &to)?;
        Self::update(&env, &to, &mut target)?;
        if target.lp != source.lp {
            return Err(ContractError::LpMismatch);
        }
        Self::require_open(&env, &target)?;
        Self::credit(&env, &to, &mut target, &user, units)?;

        storage::save_stream(&env, &from, &source);
        storage::save_stream(&env, &to, &target);

        assets::push(&env, &source.reward, &user, pending)?;

        let paid = math::to_amount(pending)?;
        env.events().publish(
            (symbol_short!("migrate"), from, to),
            (user, shares, paid),
        );
        Ok(paid)
    }

    /// Deposit into an AMM-LP stream starting from `token0` alone.
    ///
    /// Pulls `amount_in` of `token0`, swaps `swap_amount` of it into
    /// `token1`, adds both legs as liquidity to the configured AMM and
    /// stakes the resulting LP exactly as [`deposit`](Self::deposit) would.
    /// Unconsumed amounts are recovered to `user`.
    ///
    /// # Returns
    /// - shares minted
    ///
    /// # Errors
    /// - `ZeroAmount` / `InvalidAmount` for `amount_in`
    /// - `NoWant` unless `0 < swap_amount < amount_in`
    /// - `InvalidPoolKey` for a key with non-fungible or identical legs
    /// - `NotInitialized`
    /// - `InvalidPoolAmm` if `lp_token` is not the configured AMM
    /// - `NoPool`, `LpMismatch`, `InvalidPoolId`, `StreamEnded`
    /// - `SwapExactInFail`, `AddLiquidityFail`
    pub fn zap_deposit(
        env: Env,
        user: Address,
        stream_id: BytesN<32>,
        params: ZapParams,
    ) -> Result<i128, ContractError> {
        let _guard = ReentrancyGuard::acquire(&env)?;
        user.require_auth();

        let (amount_in, swap_amount) = zap::validate(&params)?;
        if storage::get_config(&env)?.amm != params.lp_token {
            return Err(ContractError::InvalidPoolAmm);
        }

        let mut stream = storage::load_stream(&env, &stream_id)?;
        Self::update(&env, &stream_id, &mut stream)?;
        if stream.lp.contract != params.lp_token {
            return Err(ContractError::LpMismatch);
        }
        if zap::pool_id(&env, &params.lp_token, &params.key)? != stream.lp.id {
            return Err(ContractError::InvalidPoolId);
        }
        Self::require_open(&env, &stream)?;

        let liquidity = zap::convert(&env, &user, &params, amount_in, swap_amount)?;

        Self::credit(&env, &stream_id, &mut stream, &user, liquidity)?;
        storage::save_stream(&env, &stream_id, &stream);

        let minted = math::to_amount(liquidity)?;
        env.events()
            .publish((symbol_short!("zap"), stream_id), (user, minted));
        Ok(minted)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Reward `user` could harvest right now. Read-only.
    pub fn pending_reward(
        env: Env,
        stream_id: BytesN<32>,
        user: Address,
    ) -> Result<i128, ContractError> {
        let stream = accrual::project(
            &env,
            &storage::load_stream(&env, &stream_id)?,
            env.ledger().timestamp(),
        )?;
        let pending = math::pending(
            &env,
            ledger::balance(&env, &user, &stream_id),
            stream.acc_reward_per_share,
            storage::load_debt(&env, &stream_id, &user),
        )?;
        math::to_amount(pending)
    }

    /// Reward one share would earn over a year at the current stake,
    /// scaled by `ACC_PRECISION`.
    pub fn reward_per_share_per_year(
        env: Env,
        stream_id: BytesN<32>,
    ) -> Result<u128, ContractError> {
        match Self::live_stream(&env, &stream_id)? {
            Some(stream) => {
                math::mul_div(&env, stream.reward_rate, YEAR as u128, stream.total_shares)
            }
            None => Ok(0),
        }
    }

    /// Reward one share would earn from now until `end` at the current stake,
    /// scaled by `ACC_PRECISION`.
    pub fn reward_per_share_remaining(
        env: Env,
        stream_id: BytesN<32>,
    ) -> Result<u128, ContractError> {
        match Self::live_stream(&env, &stream_id)? {
            Some(stream) => {
                let remaining = stream.end - env.ledger().timestamp();
                math::mul_div(&env, stream.reward_rate, remaining as u128, stream.total_shares)
            }
            None => Ok(0),
        }
    }

    /// Whole reward units the stream emits per year.
    pub fn reward_per_year(env: Env, stream_id: BytesN<32>) -> Result<u128, ContractError> {
        match Self::live_stream(&env, &stream_id)? {
            Some(stream) => math::mul_div(&env, stream.reward_rate, YEAR as u128, ACC_PRECISION),
            None => Ok(0),
        }
    }

    pub fn get_stream(env: Env, stream_id: BytesN<32>) -> Result<Stream, ContractError> {
        storage::load_stream(&env, &stream_id)
    }

    pub fn get_creator(env: Env, stream_id: BytesN<32>) -> Result<Address, ContractError> {
        storage::load_creator(&env, &stream_id)
    }

    /// Share balance of `owner` in `stream_id`.
    pub fn balance_of(env: Env, owner: Address, stream_id: BytesN<32>) -> u128 {
        ledger::balance(&env, &owner, &stream_id)
    }

    pub fn user_debt(env: Env, stream_id: BytesN<32>, user: Address) -> u128 {
        storage::load_debt(&env, &stream_id, &user)
    }

    /// The id `create_stream` would assign for these parameters.
    pub fn compute_stream_id(
        env: Env,
        creator: Address,
        lp: Asset,
        reward: Asset,
        amount: i128,
        duration: u64,
        salt: BytesN<32>,
    ) -> BytesN<32> {
        Self::derive_stream_id(&env, &creator, &lp, &reward, amount, duration, &salt)
    }

    pub fn get_config(env: Env) -> Result<Config, ContractError> {
        storage::get_config(&env)
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Rotate the admin key. Requires the current admin's authorization.
    ///
    /// # Events
    /// - `(admin, updated) -> (old_admin, new_admin)`
    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), ContractError> {
        let mut config = storage::get_config(&env)?;
        let old_admin = config.admin.clone();
        old_admin.require_auth();

        config.admin = new_admin.clone();
        storage::set_config(&env, &config);

        env.events().publish(
            (symbol_short!("admin"), symbol_short!("updated")),
            (old_admin, new_admin),
        );
        Ok(())
    }

    /// Point the zap at a different AMM. Streams already created keep their
    /// LP asset; only future zaps are affected.
    pub fn set_amm(env: Env, new_amm: Address) -> Result<(), ContractError> {
        let mut config = storage::get_config(&env)?;
        config.admin.require_auth();

        let old_amm = config.amm.clone();
        config.amm = new_amm.clone();
        storage::set_config(&env, &config);

        env.events().publish(
            (symbol_short!("amm"), symbol_short!("updated")),
            (old_amm, new_amm),
        );
        Ok(())
    }

    /// Projected stream if it is still emitting to a non-empty stake.
    fn live_stream(env: &Env, stream_id: &BytesN<32>) -> Result<Option<Stream>, ContractError> {
        let now = env.ledger().timestamp();
        let stream = accrual::project(env, &storage::load_stream(env, stream_id)?, now)?;
        if now >= stream.end || stream.total_shares == 0 {
            return Ok(None);
        }
        Ok(Some(stream))
    }
}
