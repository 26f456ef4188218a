use soroban_sdk::{Address, Env, U256};

use crate::{
    Error,
    fixed_point::{
        ceil_div_wide, ceil_nat_to_shares, factor, mul_div_floor, narrow, shares_to_nat, wide,
    },
    storage::{FarmStorage, InvestParams, Position, RedeemParams},
};

/// Leveraged liquidity positions. Farmers bring quote tokens, borrow base tokens from the
/// lending side and hold the resulting pool shares as collateral.
pub trait IsLeveragedFarm {
    /// Open or grow a position. Returns the updated position.
    fn invest_lb(env: &Env, farmer: Address, params: InvestParams) -> Result<Position, Error>;

    /// Burn part or all of a position's LP shares, repay the matching debt and send the
    /// rest to the farmer in quote tokens. Returns the updated position.
    fn redeem_lb(env: &Env, farmer: Address, params: RedeemParams) -> Result<Position, Error>;

    fn position(env: &Env, owner: Address) -> Result<Position, Error>;

    /// Base units currently owed by `owner`, at the last accrued index.
    fn debt_shares(env: &Env, owner: Address) -> Result<i128, Error>;
}

/// Holdings captured before the pool calls of an invest.
pub struct InvestSnapshot {
    pub farmer: Address,
    pub principal: i128,
    pub upfront_commission: i128,
    pub base_to_quote: i128,
    pub initial_base: i128,
    pub initial_lp: i128,
}

/// Holdings captured before the pool calls of a redeem.
pub struct RedeemSnapshot {
    pub farmer: Address,
    pub lqt_burned: i128,
    pub initial_base: i128,
}

/// `2 * (max_leverage - 10) * base_to_quote <= (max_leverage - 20) * base_delta`
pub fn check_leverage(max_leverage: i128, base_to_quote: i128, base_delta: i128) -> Result<(), Error> {
    let sold = 2 * (max_leverage - 10) * base_to_quote;
    let borrowed = (max_leverage - 20) * base_delta;
    if sold <= borrowed {
        Ok(())
    } else {
        Err(Error::LeverageExceeded)
    }
}

impl FarmStorage {
    /// Base units owed for a position: ⌈⌈gross_credit * gross_credit_index / F⌉ / F⌉
    pub fn debt_shares_of(&self, env: &Env, position: &Position) -> i128 {
        let nominal = ceil_div_wide(
            env,
            &wide(env, position.gross_credit).mul(&wide(env, self.indexes.gross_credit_index)),
            &factor(env),
        );
        ceil_nat_to_shares(env, &nominal)
    }

    /// Book `base_delta` borrowed base units and `lp_delta` LP shares on `position`.
    pub fn add_credit(&mut self, env: &Env, position: &mut Position, base_delta: i128, lp_delta: i128) {
        let nominal = shares_to_nat(env, base_delta).mul(&factor(env));
        let net = ceil_nat_to_index(env, &nominal, self.indexes.net_credit_index);
        let gross = ceil_nat_to_index(env, &nominal, self.indexes.gross_credit_index);

        position.net_credit += net;
        position.gross_credit += gross;
        position.lp_shares += lp_delta;
        self.total_net_credit += net;
        self.total_gross_credit += gross;
    }

    /// Zero `position` and remove its credit from the totals. Returns the base units owed.
    pub fn reset_position(&mut self, env: &Env, position: &mut Position) -> Result<i128, Error> {
        let debt = self.debt_shares_of(env, position);
        self.total_net_credit = checked_reduce(self.total_net_credit, position.net_credit)?;
        self.total_gross_credit = checked_reduce(self.total_gross_credit, position.gross_credit)?;
        *position = Position::default();
        Ok(debt)
    }

    /// Remove the share of `position` backed by `burned` of its LP shares. Returns the
    /// base units owed for that share.
    pub fn partial_reset_position(
        &mut self,
        env: &Env,
        position: &mut Position,
        burned: i128,
    ) -> Result<i128, Error> {
        let total_lp = position.lp_shares;
        if burned <= 0 || burned > total_lp {
            return Err(Error::TooMuchAmount);
        }

        let owed = ceil_div_wide(
            env,
            &wide(env, position.gross_credit)
                .mul(&wide(env, self.indexes.gross_credit_index))
                .mul(&wide(env, burned)),
            &factor(env).mul(&wide(env, total_lp)),
        );
        let debt = ceil_nat_to_shares(env, &owed);

        let gross = mul_div_floor(env, position.gross_credit, burned, total_lp);
        let net = mul_div_floor(env, position.net_credit, burned, total_lp);

        position.gross_credit = checked_reduce(position.gross_credit, gross)?;
        position.net_credit = checked_reduce(position.net_credit, net)?;
        self.total_gross_credit = checked_reduce(self.total_gross_credit, gross)?;
        self.total_net_credit = checked_reduce(self.total_net_credit, net)?;
        position.lp_shares = total_lp - burned;
        Ok(debt)
    }
}

fn ceil_nat_to_index(env: &Env, nominal: &U256, index: i128) -> i128 {
    narrow(env, &ceil_div_wide(env, nominal, &wide(env, index)))
}

pub(crate) fn checked_reduce(value: i128, by: i128) -> Result<i128, Error> {
    if by > value {
        Err(Error::RoundingInconsistency)
    } else {
        Ok(value - by)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::fixed_point::FIXED_POINT_FACTOR;
    use soroban_sdk::{String, Symbol, testutils::Address as _};

    #[test]
    fn test_leverage_bound_is_inclusive() {
        // 4x: a third of the borrowed base may be sold for quote
        assert_eq!(check_leverage(40, 1, 3), Ok(()));
        assert_eq!(check_leverage(40, 1_000_000, 3_000_000), Ok(()));
        assert_eq!(
            check_leverage(40, 1_000_000, 2_999_999),
            Err(Error::LeverageExceeded)
        );
        assert_eq!(check_leverage(40, 0, 0), Ok(()));
        assert_eq!(check_leverage(40, 6, 17), Err(Error::LeverageExceeded));
    }

    pub(crate) fn storage_with_indexes(e: &Env, gross_index: i128, net_index: i128) -> FarmStorage {
        let address = Address::generate(e);
        let mut storage = FarmStorage::new(
            e,
            String::from_str(e, "Farm"),
            String::from_str(e, "FARM"),
            19,
            address.clone(),
            address.clone(),
            address.clone(),
            address.clone(),
            address,
            Symbol::new(e, "BTC"),
            Symbol::new(e, "XLM"),
        );
        storage.indexes.gross_credit_index = gross_index;
        storage.indexes.net_credit_index = net_index;
        storage
    }

    #[test]
    fn test_add_credit_and_full_reset() {
        let e = Env::default();
        let mut storage = storage_with_indexes(
            &e,
            1_000_000_000 * FIXED_POINT_FACTOR,
            1_000_000 * FIXED_POINT_FACTOR,
        );
        let mut position = Position::default();

        storage.add_credit(&e, &mut position, 90, 142_863);
        assert_eq!(position.gross_credit, 90_000);
        assert_eq!(position.net_credit, 90_000_000);
        assert_eq!(position.lp_shares, 142_863);
        assert_eq!(storage.total_gross_credit, 90_000);
        assert_eq!(storage.debt_shares_of(&e, &position), 90);

        let debt = storage.reset_position(&e, &mut position).unwrap();
        assert_eq!(debt, 90);
        assert!(position.is_closed());
        assert_eq!(storage.total_gross_credit, 0);
        assert_eq!(storage.total_net_credit, 0);
    }

    #[test]
    fn test_partial_resets_drain_position() {
        let e = Env::default();
        let mut storage = storage_with_indexes(&e, FIXED_POINT_FACTOR, FIXED_POINT_FACTOR);
        let mut position = Position::default();
        storage.add_credit(&e, &mut position, 1_000, 300);

        let mut repaid = 0;
        for _ in 0..3 {
            let burned = 100i128.min(position.lp_shares);
            repaid += storage
                .partial_reset_position(&e, &mut position, burned)
                .unwrap();
        }
        assert!(position.is_closed());
        assert_eq!(storage.total_gross_credit, 0);
        assert_eq!(storage.total_net_credit, 0);
        assert!(repaid >= 1_000 && repaid <= 1_003);
    }

    #[test]
    fn test_partial_reset_rejects_too_many_shares() {
        let e = Env::default();
        let mut storage = storage_with_indexes(&e, FIXED_POINT_FACTOR, FIXED_POINT_FACTOR);
        let mut position = Position::default();
        storage.add_credit(&e, &mut position, 10, 5);
        assert_eq!(
            storage.partial_reset_position(&e, &mut position, 6),
            Err(Error::TooMuchAmount)
        );
        assert_eq!(
            storage.partial_reset_position(&e, &mut position, 0),
            Err(Error::TooMuchAmount)
        );
    }
}
