use soroban_sdk::{Env, U256};

use crate::{
    fixed_point::{
        FIXED_POINT_FACTOR, ceil_div_wide, factor, floor_div_wide, narrow, wide,
    },
    storage::{FarmStorage, PoolSnapshot, RateParams},
};

/// Share of the gross rate passed on to lenders, in tenths.
const NET_RATE_TENTHS: i128 = 9;

/// credit * credit_index * F / (total_supply * deposit_index), or 0 for an empty pool
pub fn utilization(
    env: &Env,
    credit: i128,
    credit_index: i128,
    total_supply: i128,
    deposit_index: i128,
) -> i128 {
    if total_supply <= 0 || deposit_index <= 0 {
        return 0;
    }
    let numerator = wide(env, credit)
        .mul(&wide(env, credit_index))
        .mul(&factor(env));
    let denominator = wide(env, total_supply).mul(&wide(env, deposit_index));
    narrow(env, &floor_div_wide(env, &numerator, &denominator))
}

/// Piecewise-linear rate for an adjusted utilization.
pub fn curve_rate(params: &RateParams, adjusted_utilization: i128) -> i128 {
    let threshold_1 = params.threshold_percent_1 * FIXED_POINT_FACTOR / 100;
    let threshold_2 = params.threshold_percent_2 * FIXED_POINT_FACTOR / 100;

    if adjusted_utilization < threshold_1 {
        params.rate_1 * adjusted_utilization / threshold_1
    } else if adjusted_utilization < threshold_2 {
        params.rate_1
    } else if adjusted_utilization < FIXED_POINT_FACTOR {
        params.rate_1
            + params.rate_diff * (adjusted_utilization - threshold_2)
                / (FIXED_POINT_FACTOR - threshold_2)
    } else {
        params.rate_1 + params.rate_diff
    }
}

fn growth(env: &Env, rate: i128, elapsed: u64) -> U256 {
    factor(env).add(&wide(env, rate).mul(&U256::from_u128(env, elapsed as u128)))
}

impl FarmStorage {
    pub fn adjusted_utilization(&self, env: &Env) -> i128 {
        utilization(
            env,
            self.total_gross_credit,
            self.indexes.gross_credit_index,
            self.total_supply,
            self.indexes.deposit_index,
        )
    }

    pub fn gross_credit_rate(&self, env: &Env) -> i128 {
        curve_rate(&self.rate_params, self.adjusted_utilization(env))
    }

    /// Advance the three indexes to `now`. Returns the gross rate applied.
    pub fn accrue_indexes(&mut self, env: &Env, now: u64) -> i128 {
        let elapsed = now.saturating_sub(self.indexes.update_time);

        // deposit interest follows net credit, the curve follows gross credit
        let net_utilization = utilization(
            env,
            self.total_net_credit,
            self.indexes.net_credit_index,
            self.total_supply,
            self.indexes.deposit_index,
        );

        let gross_rate = self.gross_credit_rate(env);
        self.indexes.gross_credit_index = narrow(
            env,
            &ceil_div_wide(
                env,
                &wide(env, self.indexes.gross_credit_index).mul(&growth(env, gross_rate, elapsed)),
                &factor(env),
            ),
        );

        let net_rate = if self.is_working {
            gross_rate * NET_RATE_TENTHS / 10
        } else {
            0
        };
        self.indexes.net_credit_index = narrow(
            env,
            &ceil_div_wide(
                env,
                &wide(env, self.indexes.net_credit_index).mul(&growth(env, net_rate, elapsed)),
                &factor(env),
            ),
        );

        let deposit_rate = narrow(
            env,
            &wide(env, net_rate)
                .mul(&wide(env, net_utilization))
                .div(&factor(env)),
        );
        self.indexes.deposit_index = narrow(
            env,
            &wide(env, self.indexes.deposit_index)
                .mul(&growth(env, deposit_rate, elapsed))
                .div(&factor(env)),
        );

        gross_rate
    }

    /// Move `lp_price` toward the pool's spot value, at most `lp_price_change_rate` per second
    /// in either direction.
    pub fn update_lp_price(&mut self, env: &Env, now: u64, pool: &PoolSnapshot) {
        if pool.lqt_total <= 0 {
            return;
        }
        let elapsed = now.saturating_sub(self.indexes.update_time);
        let calculated = narrow(
            env,
            &wide(env, pool.base_reserve)
                .mul(&factor(env))
                .div(&wide(env, pool.lqt_total)),
        );
        let drift = wide(env, self.lp_price_change_rate).mul(&U256::from_u128(env, elapsed as u128));
        let current = wide(env, self.indexes.lp_price);

        self.indexes.lp_price = if calculated > self.indexes.lp_price {
            let upper = narrow(
                env,
                &current.mul(&factor(env).add(&drift)).div(&factor(env)),
            );
            calculated.min(upper)
        } else {
            let one = U256::from_u32(env, 1);
            let multiplier = if drift >= factor(env) {
                one
            } else {
                let remaining = factor(env).sub(&drift);
                if remaining > one { remaining } else { one }
            };
            let lower = narrow(env, &current.mul(&multiplier).div(&factor(env)));
            calculated.max(lower)
        };
    }
}
