use soroban_sdk::{Address, BytesN, Env, String};

use crate::{
    Error,
    storage::{FlashloanParams, LeverageParams, MAX_RATE_2, RateParams},
};

pub const MAX_UPFRONT_COMMISSION: i128 = 2_000;
pub const MAX_LB_PRICE_CHANGE_RATE: i128 = 277_777_777;

/// Interface-only subcontract for the protocol parameters only the admin may change.
pub trait IsFarmAdmin {
    /// Replace the interest curve. Indexes are accrued at the old curve first.
    fn set_rate_params(env: &Env, params: RateParams) -> Result<RateParams, Error>;

    /// Replace the leverage and liquidation parameters, and the price feed.
    fn set_leverage_params(
        env: &Env,
        params: LeverageParams,
        oracle: Address,
    ) -> Result<LeverageParams, Error>;

    /// Over 100_000, at most 2%
    fn set_upfront_commission(env: &Env, value: i128) -> Result<i128, Error>;

    /// Max relative LP price move per second, scaled by 10^12
    fn set_lb_price_change_rate(env: &Env, value: i128) -> Result<i128, Error>;

    fn set_flashloan_params(env: &Env, params: FlashloanParams) -> Result<FlashloanParams, Error>;

    /// Set the venue used for base/quote swaps
    fn set_dex_contract(env: &Env, dex: Address);

    /// Turn lender interest on or off. Indexes are accrued first.
    fn set_is_working_status(env: &Env, is_working: bool) -> Result<bool, Error>;

    /// Permanently turn off admin liquidations
    fn disable_onchain_liquidation(env: &Env);

    fn rate_params(env: &Env) -> RateParams;

    fn leverage_params(env: &Env) -> LeverageParams;

    fn flashloan_params(env: &Env) -> FlashloanParams;

    /// Upgrade the contract to new wasm. Admin-only.
    fn upgrade(env: &Env, new_wasm_hash: BytesN<32>);

    /// Report the version of this contract
    fn version(env: &Env) -> String;
}

pub fn validate_rate_params(params: &RateParams) -> Result<(), Error> {
    if params.rate_1 < 0 || params.rate_diff < 0 || params.rate_1 + params.rate_diff > MAX_RATE_2 {
        return Err(Error::RateAboveMax);
    }
    if params.threshold_percent_1 < 0
        || params.threshold_percent_2 > 100
        || params.threshold_percent_1 > params.threshold_percent_2
    {
        return Err(Error::WrongThresholdPercent);
    }
    Ok(())
}

pub fn validate_leverage_params(params: &LeverageParams) -> Result<(), Error> {
    let in_range = (20..=100).contains(&params.max_leverage)
        && params.onchain_liquidation_percent > 100
        && params.onchain_liquidation_percent <= 200
        && (0..=100).contains(&params.onchain_liquidation_comm)
        && params.liquidation_percent > 100
        && params.liquidation_percent <= 200
        && params.liquidation_price_percent > 100
        && params.liquidation_price_percent <= params.liquidation_percent
        && (0..=100).contains(&params.liquidation_comm);
    if in_range {
        Ok(())
    } else {
        Err(Error::ParameterOutOfRange)
    }
}

pub fn validate_flashloan_params(params: &FlashloanParams) -> Result<(), Error> {
    let commission = params.admin_commission + params.deposit_commission;
    if params.admin_commission < 0 || params.deposit_commission < 0 || commission > 100_000 {
        return Err(Error::ParameterOutOfRange);
    }
    Ok(())
}
