use soroban_sdk::{Address, Env, String, Symbol, contracttype, symbol_short};

use crate::{
    Error,
    fixed_point::INITIAL_INDEX_VALUE,
    index_types,
};

pub const DEFAULT_RATE_1: i128 = 3022; // ~10% annual
pub const DEFAULT_RATE_2: i128 = 12857; // ~50% annual
pub const MAX_RATE_2: i128 = 12857;
pub const DEFAULT_THRESHOLD_PERCENT_1: i128 = 80;
pub const DEFAULT_THRESHOLD_PERCENT_2: i128 = 90;
pub const DEFAULT_UPFRONT_COMMISSION: i128 = 1_000; // 1%
pub const DEFAULT_LB_PRICE_CHANGE_RATE: i128 = 5_787_000; // ~50% per day

pub(crate) const ADMIN_KEY: Symbol = symbol_short!("ADMIN");

// Instance storage
const STORAGE: Symbol = symbol_short!("STORAGE");

// Persistent storage keys
#[contracttype]
pub enum DataKey {
    /// Deposit-share balance of a lender
    Balance(Address),
    /// Allowance granted on deposit shares
    Allowance(Txn),
    /// Leveraged position of a farmer
    Position(Address),
    /// Sequence of an open balance query, keyed by query kind
    PendingQuery(crate::pending::BalanceQuery),
}

#[contracttype]
#[derive(Clone)]
pub struct Txn(pub Address, pub Address);

#[contracttype]
#[derive(Clone)]
pub struct Allowance {
    pub amount: i128,
    pub live_until_ledger: u32,
}

/// Piecewise-linear curve control. Rates are per second, scaled by 10^12.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RateParams {
    pub rate_1: i128,
    pub rate_diff: i128,
    pub threshold_percent_1: i128,
    pub threshold_percent_2: i128,
}

impl Default for RateParams {
    fn default() -> Self {
        RateParams {
            rate_1: DEFAULT_RATE_1,
            rate_diff: DEFAULT_RATE_2 - DEFAULT_RATE_1,
            threshold_percent_1: DEFAULT_THRESHOLD_PERCENT_1,
            threshold_percent_2: DEFAULT_THRESHOLD_PERCENT_2,
        }
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeverageParams {
    /// Max leverage times ten (40 means 4x)
    pub max_leverage: i128,
    /// Collateral ratio in percent under which the admin may liquidate on-chain
    pub onchain_liquidation_percent: i128,
    /// Share of the on-chain liquidation surplus paid to the admin, in percent
    pub onchain_liquidation_comm: i128,
    /// Collateral ratio in percent under which anyone may liquidate
    pub liquidation_percent: i128,
    /// Price a liquidator pays per unit of debt cleared, in percent
    pub liquidation_price_percent: i128,
    /// Share of the liquidation premium paid to the admin, in percent
    pub liquidation_comm: i128,
}

impl Default for LeverageParams {
    fn default() -> Self {
        LeverageParams {
            max_leverage: 40,
            onchain_liquidation_percent: 120,
            onchain_liquidation_comm: 50,
            liquidation_percent: 120,
            liquidation_price_percent: 110,
            liquidation_comm: 50,
        }
    }
}

/// Commissions are expressed over 100_000.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FlashloanParams {
    pub admin_commission: i128,
    pub deposit_commission: i128,
    pub available: bool,
}

impl Default for FlashloanParams {
    fn default() -> Self {
        FlashloanParams {
            admin_commission: 100,
            deposit_commission: 50,
            available: false,
        }
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Indexes {
    pub gross_credit_index: i128,
    pub net_credit_index: i128,
    pub deposit_index: i128,
    /// Bounded-drift estimate of the base value of one LP share
    pub lp_price: i128,
    /// Last time (in seconds) the indexes were advanced
    pub update_time: u64,
}

impl Indexes {
    #[must_use]
    pub fn new(timestamp: u64) -> Self {
        Indexes {
            gross_credit_index: INITIAL_INDEX_VALUE,
            net_credit_index: INITIAL_INDEX_VALUE,
            deposit_index: INITIAL_INDEX_VALUE,
            lp_price: INITIAL_INDEX_VALUE,
            update_time: timestamp,
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FarmStorage {
    /// Name of the deposit-share token
    pub name: String,
    /// Symbol of the deposit-share token
    pub symbol: String,
    /// Base token decimals plus the fixed-point precision
    pub decimals: u32,
    /// Lent asset; deposits, debt, liquidation payments and flash loans use it
    pub base_token: Address,
    /// Asset paired with the base token in the pool; carries the farmer's principal
    pub quote_token: Address,
    /// Share token of the liquidity pool
    pub lp_token: Address,
    /// Pool that mints and burns LP shares and prices them
    pub liquidity_pool: Address,
    /// Venue for base/quote swaps
    pub dex: Address,
    /// SEP-40 price feed
    pub oracle: Address,
    /// Oracle symbol of the base asset
    pub base_asset: Symbol,
    /// Oracle symbol of the quote asset
    pub quote_asset: Symbol,
    pub indexes: Indexes,
    pub rate_params: RateParams,
    /// Over 100_000
    pub upfront_commission: i128,
    /// When false only gross credit accrues and lenders earn nothing
    pub is_working: bool,
    pub lp_price_change_rate: i128,
    pub leverage: LeverageParams,
    pub onchain_liquidation_available: bool,
    pub total_gross_credit: i128,
    pub total_net_credit: i128,
    /// Sum of all deposit-share balances
    pub total_supply: i128,
    /// LP shares held for all positions
    pub lp_shares: i128,
    /// Base token units held by the contract
    pub base_shares: i128,
    pub flashloan: FlashloanParams,
    /// Outstanding flash-loan amount still to be returned
    pub flashloan_shares: i128,
}

impl FarmStorage {
    /// Origination state: unit indexes, zero totals and default parameters.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        env: &Env,
        name: String,
        symbol: String,
        decimals: u32,
        base_token: Address,
        quote_token: Address,
        lp_token: Address,
        liquidity_pool: Address,
        oracle: Address,
        base_asset: Symbol,
        quote_asset: Symbol,
    ) -> Self {
        FarmStorage {
            name,
            symbol,
            decimals,
            base_token,
            quote_token,
            lp_token,
            dex: liquidity_pool.clone(),
            liquidity_pool,
            oracle,
            base_asset,
            quote_asset,
            indexes: Indexes::new(env.ledger().timestamp()),
            rate_params: RateParams::default(),
            upfront_commission: DEFAULT_UPFRONT_COMMISSION,
            is_working: true,
            lp_price_change_rate: DEFAULT_LB_PRICE_CHANGE_RATE,
            leverage: LeverageParams::default(),
            onchain_liquidation_available: true,
            total_gross_credit: 0,
            total_net_credit: 0,
            total_supply: 0,
            lp_shares: 0,
            base_shares: 0,
            flashloan: FlashloanParams::default(),
            flashloan_shares: 0,
        }
    }

    /// Get current state of the contract
    pub fn get_state(env: &Env) -> FarmStorage {
        env.storage().instance().get(&STORAGE).unwrap()
    }

    pub fn set_state(env: &Env, storage: &FarmStorage) {
        env.storage().instance().set(&STORAGE, &storage);
        let ttl = env.storage().max_ttl();
        env.storage().instance().extend_ttl(ttl, ttl);
    }

    pub fn get_position(env: &Env, owner: &Address) -> Option<Position> {
        env.storage()
            .persistent()
            .get(&DataKey::Position(owner.clone()))
    }

    pub fn require_position(env: &Env, owner: &Address) -> Result<Position, Error> {
        Self::get_position(env, owner).ok_or(Error::UnknownAddress)
    }

    pub fn set_position(env: &Env, owner: &Address, position: &Position) {
        index_types::Position {
            owner: owner.clone(),
            lp_shares: position.lp_shares,
            net_credit: position.net_credit,
            gross_credit: position.gross_credit,
            ledger: env.ledger().sequence(),
            timestamp: env.ledger().timestamp(),
        }
        .publish(env);

        env.storage()
            .persistent()
            .set(&DataKey::Position(owner.clone()), position);

        let ttl = env.storage().max_ttl();
        env.storage()
            .persistent()
            .extend_ttl(&DataKey::Position(owner.clone()), ttl, ttl);
    }

    pub fn has_lender(env: &Env, lender: &Address) -> bool {
        env.storage()
            .persistent()
            .has(&DataKey::Balance(lender.clone()))
    }

    pub fn get_balance(env: &Env, lender: &Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(lender.clone()))
            .unwrap_or(0)
    }

    pub fn set_balance(env: &Env, lender: &Address, balance: i128) {
        env.storage()
            .persistent()
            .set(&DataKey::Balance(lender.clone()), &balance);
        let ttl = env.storage().max_ttl();
        env.storage()
            .persistent()
            .extend_ttl(&DataKey::Balance(lender.clone()), ttl, ttl);
    }
}

/// Leveraged position of one farmer. Credits are index-reduced nominal amounts.
#[contracttype]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Position {
    pub lp_shares: i128,
    /// Debt reduced with `net_credit_index`
    pub net_credit: i128,
    /// Debt reduced with `gross_credit_index`
    pub gross_credit: i128,
}

impl Position {
    pub fn is_closed(&self) -> bool {
        self.lp_shares == 0 && self.net_credit == 0 && self.gross_credit == 0
    }
}

/// Arguments of `invest_lb`, in the order the flow consumes them.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvestParams {
    /// Quote units the farmer puts in
    pub amount: i128,
    /// Quote units swapped into base before adding liquidity
    pub amount_to_base: i128,
    pub min_base_bought: i128,
    /// Base units borrowed and swapped into quote when `amount_to_base` is zero
    pub base_to_quote: i128,
    pub min_quote_bought: i128,
    /// Quote units deposited into the pool
    pub amount_to_lqt: i128,
    pub min_lqt_minted: i128,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RedeemParams {
    pub lqt_burned: i128,
    pub min_base_withdrawn: i128,
    /// Quote units swapped back into base to help cover the debt
    pub quote_to_base_amount: i128,
}

/// Base reserve and LP supply of the pool at accrual time.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolSnapshot {
    pub base_reserve: i128,
    pub lqt_total: i128,
}

/// Read-only view of the market.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Market {
    pub indexes: Indexes,
    pub total_gross_credit: i128,
    pub total_net_credit: i128,
    pub total_supply: i128,
    pub lp_shares: i128,
    pub base_shares: i128,
    pub flashloan_shares: i128,
    pub is_working: bool,
    pub onchain_liquidation_available: bool,
    pub upfront_commission: i128,
    pub lp_price_change_rate: i128,
}
