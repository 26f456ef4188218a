use soroban_sdk::{Address, Env};

use crate::{
    Error,
    fixed_point::{ceil_div_wide, factor, floor_div_wide, narrow, shares_to_nat, wide},
    storage::{FarmStorage, Market},
};

/// Lending side of the farm: lenders deposit base tokens and hold deposit shares whose
/// value grows with the deposit index.
pub trait IsLendingPool {
    /// Deposit `shares` base tokens. Returns the deposit shares credited to `lender`.
    fn deposit_lending(env: &Env, lender: Address, shares: i128) -> Result<i128, Error>;

    /// Withdraw `shares` base tokens. Returns the deposit shares burned from `lender`.
    fn redeem_lending(env: &Env, lender: Address, shares: i128) -> Result<i128, Error>;

    /// Bring all indexes up to the current ledger time.
    fn update_indexes(env: &Env) -> Result<(), Error>;

    /// Pay the protocol's accumulated margin to the admin. Returns the base units paid.
    fn withdraw_commission(env: &Env) -> Result<i128, Error>;

    /// Sum of all deposit-share balances
    fn total_supply(env: &Env) -> i128;

    /// Indexes, totals and tracked holdings
    fn market(env: &Env) -> Market;

    /// Current per-second gross credit rate, scaled by 10^12
    fn gross_credit_rate(env: &Env) -> i128;
}

impl FarmStorage {
    /// Deposit shares minted for `shares` base units, rounded down.
    pub fn deposit_shares_for(&self, env: &Env, shares: i128) -> i128 {
        let nominal = shares_to_nat(env, shares).mul(&factor(env));
        narrow(
            env,
            &floor_div_wide(env, &nominal, &wide(env, self.indexes.deposit_index)),
        )
    }

    /// Deposit shares burned to pay out `shares` base units, rounded up.
    pub fn redeem_shares_for(&self, env: &Env, shares: i128) -> i128 {
        let nominal = shares_to_nat(env, shares).mul(&factor(env));
        narrow(
            env,
            &ceil_div_wide(env, &nominal, &wide(env, self.indexes.deposit_index)),
        )
    }

    /// total_supply * deposit_index >= total_net_credit * net_credit_index
    pub fn check_solvency(&self, env: &Env) -> Result<(), Error> {
        let deposits = wide(env, self.total_supply).mul(&wide(env, self.indexes.deposit_index));
        let credit =
            wide(env, self.total_net_credit).mul(&wide(env, self.indexes.net_credit_index));
        if deposits >= credit {
            Ok(())
        } else {
            Err(Error::SolvencyViolation)
        }
    }

    /// Spread `shares` base units over all lenders through the deposit index.
    pub fn distribute_to_lenders(&mut self, env: &Env, shares: i128) {
        if shares == 0 || self.total_supply == 0 {
            return;
        }
        let increase = floor_div_wide(
            env,
            &shares_to_nat(env, shares).mul(&factor(env)),
            &wide(env, self.total_supply),
        );
        self.indexes.deposit_index = narrow(
            env,
            &wide(env, self.indexes.deposit_index).add(&increase),
        );
    }

    /// Remove `amount` burned deposit shares from the supply and spread their value over
    /// the remaining ones. With no shares left the value falls to the protocol margin.
    pub fn forfeit_deposit_shares(&mut self, env: &Env, amount: i128) {
        let value = wide(env, amount).mul(&wide(env, self.indexes.deposit_index));
        self.total_supply -= amount;
        if amount <= 0 || self.total_supply <= 0 {
            return;
        }
        let increase = floor_div_wide(env, &value, &wide(env, self.total_supply));
        self.indexes.deposit_index = narrow(
            env,
            &wide(env, self.indexes.deposit_index).add(&increase),
        );
    }

    /// Protocol margin in base units: holdings plus gross debt minus what lenders are owed.
    pub fn commission_shares(&self, env: &Env) -> i128 {
        let assets = shares_to_nat(env, self.base_shares)
            .mul(&factor(env))
            .add(&wide(env, self.total_gross_credit).mul(&wide(env, self.indexes.gross_credit_index)));
        let owed = wide(env, self.total_supply).mul(&wide(env, self.indexes.deposit_index));
        if assets <= owed {
            return 0;
        }
        let delta = assets.sub(&owed).div(&factor(env)).div(&factor(env));
        narrow(env, &delta).min(self.base_shares)
    }
}
