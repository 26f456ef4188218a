use soroban_sdk::{Address, Env, contractclient};

use crate::{Asset, PriceData};

/// Constant-product pool pairing the quote and base tokens. Also used as the swap venue.
///
/// Tokens are pulled from `owner` with `transfer_from` and LP shares are burned with
/// `burn_from`, so the caller approves the pool for the exact amounts right before each
/// call and resets the approval after. Proceeds are paid back to `owner`.
#[contractclient(name = "LiquidityPoolClient")]
pub trait LiquidityPool {
    /// Deposit `quote_deposited` quote and the matching base; mints LP shares to `owner`.
    fn add_liquidity(
        env: Env,
        owner: Address,
        quote_deposited: i128,
        min_lqt_minted: i128,
        max_base_deposited: i128,
        deadline: u64,
    ) -> i128;

    /// Burn `lqt_burned` LP shares of `owner`; returns `(quote, base)` withdrawn.
    fn remove_liquidity(
        env: Env,
        owner: Address,
        lqt_burned: i128,
        min_quote_withdrawn: i128,
        min_base_withdrawn: i128,
        deadline: u64,
    ) -> (i128, i128);

    fn base_to_quote(
        env: Env,
        owner: Address,
        base_sold: i128,
        min_quote_bought: i128,
        deadline: u64,
    ) -> i128;

    fn quote_to_base(
        env: Env,
        owner: Address,
        quote_sold: i128,
        min_base_bought: i128,
        deadline: u64,
    ) -> i128;

    /// Total LP shares in existence
    fn lqt_total(env: Env) -> i128;
}

/// Oracle Consumer Interface from SEP-0040, the subset the farm reads.
#[contractclient(name = "PriceFeedClient")]
pub trait PriceFeed {
    fn lastprice(env: Env, asset: Asset) -> Option<PriceData>;
}

/// Contract borrowing through `flashloan`. It must transfer `amount + fee` base tokens
/// back to `lender` before returning.
#[contractclient(name = "FlashloanReceiverClient")]
pub trait FlashloanReceiver {
    fn exec_flashloan(env: Env, lender: Address, token: Address, amount: i128, fee: i128);
}
