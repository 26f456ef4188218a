use soroban_sdk::{Address, Env};

use crate::{
    Error,
    fixed_point::{
        ceil_div_wide, factor, floor_div_wide, mul_div_floor, narrow, shares_to_nat, wide,
    },
    liquidity_book::checked_reduce,
    storage::{FarmStorage, Position},
};

/// Two ways of closing unhealthy positions. A third party repays debt at a premium and
/// takes LP shares, or the admin force-sells the whole position through the pool.
pub trait IsLiquidator {
    /// Repay up to `payment` base units of `owner`'s debt and receive the matching LP
    /// shares. Returns the remaining position.
    fn liquidate_lb(
        env: &Env,
        liquidator: Address,
        owner: Address,
        payment: i128,
    ) -> Result<Position, Error>;

    /// Sell all of `owner`'s LP shares and close the position. Admin-only.
    /// Returns the base units the sale produced.
    fn liquidate_onchain_lb(env: &Env, owner: Address) -> Result<i128, Error>;
}

/// Oracle prices read before a third-party liquidation settles.
pub struct LiquidationSnapshot {
    pub owner: Address,
    pub liquidator: Address,
    pub payment: i128,
    pub base_price: i128,
    pub quote_price: i128,
}

/// Base holdings before the forced sale of an on-chain liquidation.
pub struct OnchainLiquidationSnapshot {
    pub owner: Address,
    pub initial_base: i128,
}

/// Outcome of a third-party liquidation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Seizure {
    pub lp_value: i128,
    pub debt_value: i128,
    pub debt_shares: i128,
    pub lp_shares: i128,
    pub admin_commission: i128,
}

/// Outcome of an on-chain liquidation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OnchainSettlement {
    pub debt_shares: i128,
    pub admin_commission: i128,
}

impl FarmStorage {
    /// Collateral and debt of `position` valued at `base_price`. Returns
    /// `(lp_value, debt_value)` if the position is under the liquidation threshold.
    pub fn check_liquidatable(
        &self,
        env: &Env,
        position: &Position,
        base_price: i128,
    ) -> Result<(i128, i128), Error> {
        let lp_value = narrow(
            env,
            &wide(env, position.lp_shares)
                .mul(&wide(env, 2))
                .mul(&wide(env, self.indexes.lp_price))
                .mul(&wide(env, base_price))
                .div(&factor(env)),
        );
        let debt_value = narrow(
            env,
            &wide(env, base_price).mul(&wide(env, self.debt_shares_of(env, position))),
        );

        let collateral = wide(env, lp_value).mul(&wide(env, 100));
        let threshold = wide(env, debt_value).mul(&wide(env, self.leverage.liquidation_percent));
        if collateral < threshold {
            Ok((lp_value, debt_value))
        } else {
            Err(Error::LiquidationNotAllowed)
        }
    }

    /// Apply a third-party liquidation paying `payment` base units against `position`.
    pub fn settle_liquidation(
        &mut self,
        env: &Env,
        position: &mut Position,
        payment: i128,
        base_price: i128,
    ) -> Result<Seizure, Error> {
        if position.net_credit <= 0 || position.gross_credit <= 0 {
            return Err(Error::NotLoaned);
        }
        let (lp_value, debt_value) = self.check_liquidatable(env, position, base_price)?;

        let debt = self.debt_shares_of(env, position);
        let debt_shares = (payment * 100 / self.leverage.liquidation_price_percent).min(debt);

        let gross = narrow(
            env,
            &floor_div_wide(
                env,
                &shares_to_nat(env, debt_shares).mul(&factor(env)),
                &wide(env, self.indexes.gross_credit_index),
            ),
        )
        .min(position.gross_credit);
        let net = mul_div_floor(env, position.net_credit, gross, position.gross_credit);
        let lp_shares = mul_div_floor(env, position.lp_shares, gross, position.gross_credit);

        position.gross_credit = checked_reduce(position.gross_credit, gross)?;
        position.net_credit = checked_reduce(position.net_credit, net)?;
        position.lp_shares = checked_reduce(position.lp_shares, lp_shares)?;
        self.total_gross_credit = checked_reduce(self.total_gross_credit, gross)?;
        self.total_net_credit = checked_reduce(self.total_net_credit, net)?;

        let extra = payment - debt_shares;
        if extra < 0 {
            return Err(Error::WrongLiquidationPricePercent);
        }
        let admin_commission = extra * self.leverage.liquidation_comm / 100;
        self.distribute_to_lenders(env, extra - admin_commission);

        self.lp_shares = checked_reduce(self.lp_shares, lp_shares)?;
        self.base_shares += payment - admin_commission;

        Ok(Seizure {
            lp_value,
            debt_value,
            debt_shares,
            lp_shares,
            admin_commission,
        })
    }

    /// Close `position` after its LP shares were sold for `proceeds` base units. A surplus is
    /// shared between the admin and lenders, a shortfall is taken from lenders.
    pub fn settle_onchain_liquidation(
        &mut self,
        env: &Env,
        position: &mut Position,
        proceeds: i128,
    ) -> Result<OnchainSettlement, Error> {
        let debt_shares = self.reset_position(env, position)?;

        let sale = wide(env, proceeds).mul(&wide(env, 100));
        let threshold = wide(env, debt_shares)
            .mul(&wide(env, self.leverage.onchain_liquidation_percent));
        if sale >= threshold {
            return Err(Error::LiquidationNotAllowed);
        }

        let extra = proceeds - debt_shares;
        let mut admin_commission = 0;
        if extra > 0 {
            admin_commission = extra * self.leverage.onchain_liquidation_comm / 100;
            self.base_shares = checked_reduce(self.base_shares, admin_commission)?;
            self.distribute_to_lenders(env, extra - admin_commission);
        } else if extra < 0 && self.total_supply > 0 {
            let loss = ceil_div_wide(
                env,
                &shares_to_nat(env, -extra).mul(&factor(env)),
                &wide(env, self.total_supply),
            );
            let index = wide(env, self.indexes.deposit_index);
            if loss > index {
                return Err(Error::ArithmeticError);
            }
            self.indexes.deposit_index = narrow(env, &index.sub(&loss));
        }

        Ok(OnchainSettlement {
            debt_shares,
            admin_commission,
        })
    }
}
