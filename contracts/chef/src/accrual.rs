use soroban_sdk::Env;

use crate::{math, ContractError, Stream};

/// What a call to [`accrue`] did to the stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Accrual {
    /// Already current at `now`.
    Unchanged,
    /// No stake was present; the idle window was skipped and, while the
    /// stream had not ended, `end` moved to the carried value.
    Idle { extended_to: Option<u64> },
    /// Stake was present and the accumulator grew.
    Accrued,
}

/// Bring `stream` current to `now`.
///
/// Idempotent within a timestamp. While nobody is staked, elapsed time pushes
/// `end` forward instead of burning emission, so the total a stream pays out
/// is `reward_rate * duration / ACC_PRECISION` no matter how stake comes and
/// goes. Mutating entry points persist the result; views run this on a copy.
pub fn accrue(env: &Env, stream: &mut Stream, now: u64) -> Result<Accrual, ContractError> {
    if now <= stream.last_update {
        return Ok(Accrual::Unchanged);
    }

    if stream.total_shares == 0 {
        let idle = now - stream.last_update;
        let mut extended_to = None;
        if stream.end >= now {
            stream.end = stream
                .end
                .checked_add(idle)
                .ok_or(ContractError::Overflow)?;
            extended_to = Some(stream.end);
        }
        stream.last_update = now;
        return Ok(Accrual::Idle { extended_to });
    }

    let till = core::cmp::min(now, stream.end);
    if till > stream.last_update {
        let delta = math::acc_delta(
            env,
            till - stream.last_update,
            stream.reward_rate,
            stream.total_shares,
        )?;
        stream.acc_reward_per_share = stream
            .acc_reward_per_share
            .checked_add(delta)
            .ok_or(ContractError::Overflow)?;
        stream.last_update = till;
    }
    Ok(Accrual::Accrued)
}

/// Read-only projection of `stream` at `now`.
pub fn project(env: &Env, stream: &Stream, now: u64) -> Result<Stream, ContractError> {
    let mut projected = stream.clone();
    accrue(env, &mut projected, now)?;
    Ok(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ACC_PRECISION;
    use crate::Asset;
    use soroban_sdk::{testutils::Address as _, Address};

    fn stream(env: &Env, start: u64, duration: u64, rate: u128) -> Stream {
        let asset = Asset {
            contract: Address::generate(env),
            id: 0,
        };
        Stream {
            lp: asset.clone(),
            reward: asset,
            reward_rate: rate,
            end: start + duration,
            last_update: start,
            total_shares: 0,
            acc_reward_per_share: 0,
        }
    }

    #[test]
    fn same_instant_is_a_no_op() {
        let env = Env::default();
        let mut s = stream(&env, 100, 1000, ACC_PRECISION);
        s.total_shares = 10;
        assert_eq!(accrue(&env, &mut s, 100).unwrap(), Accrual::Unchanged);
        assert_eq!(accrue(&env, &mut s, 50).unwrap(), Accrual::Unchanged);
        assert_eq!(s.acc_reward_per_share, 0);
        assert_eq!(s.last_update, 100);
    }

    #[test]
    fn idle_window_extends_end() {
        let env = Env::default();
        let mut s = stream(&env, 0, 1000, ACC_PRECISION);
        assert_eq!(
            accrue(&env, &mut s, 300).unwrap(),
            Accrual::Idle {
                extended_to: Some(1300)
            }
        );
        assert_eq!(s.end, 1300);
        assert_eq!(s.last_update, 300);
        assert_eq!(s.acc_reward_per_share, 0);
    }

    #[test]
    fn idle_after_end_does_not_extend() {
        let env = Env::default();
        let mut s = stream(&env, 0, 1000, ACC_PRECISION);
        assert_eq!(
            accrue(&env, &mut s, 1500).unwrap(),
            Accrual::Idle { extended_to: None }
        );
        assert_eq!(s.end, 1000);
        assert_eq!(s.last_update, 1500);
    }

    #[test]
    fn idle_extension_overflow_is_reported() {
        let env = Env::default();
        let mut s = stream(&env, 0, 0, ACC_PRECISION);
        s.end = u64::MAX;
        assert_eq!(accrue(&env, &mut s, 10), Err(ContractError::Overflow));
    }

    #[test]
    fn active_window_grows_accumulator_and_caps_at_end() {
        let env = Env::default();
        let mut s = stream(&env, 0, 1000, ACC_PRECISION);
        s.total_shares = 100;

        assert_eq!(accrue(&env, &mut s, 500).unwrap(), Accrual::Accrued);
        assert_eq!(s.acc_reward_per_share, 5 * ACC_PRECISION);
        assert_eq!(s.last_update, 500);

        accrue(&env, &mut s, 5000).unwrap();
        assert_eq!(s.acc_reward_per_share, 10 * ACC_PRECISION);
        assert_eq!(s.last_update, 1000);
        assert_eq!(s.end, 1000);

        // Nothing left to accrue past the end.
        accrue(&env, &mut s, 6000).unwrap();
        assert_eq!(s.acc_reward_per_share, 10 * ACC_PRECISION);
        assert_eq!(s.last_update, 1000);
    }

    #[test]
    fn project_leaves_original_untouched() {
        let env = Env::default();
        let mut s = stream(&env, 0, 1000, ACC_PRECISION);
        s.total_shares = 4;
        let p = project(&env, &s, 40).unwrap();
        assert_eq!(p.acc_reward_per_share, 10 * ACC_PRECISION);
        assert_eq!(s.acc_reward_per_share, 0);
        assert_eq!(s.last_update, 0);
    }
}
