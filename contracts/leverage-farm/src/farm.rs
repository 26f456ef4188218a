use soroban_sdk::{
    self, Address, BytesN, Env, MuxedAddress, String, Symbol, assert_with_error, contract,
    contractimpl, log, panic_with_error,
    token::{TokenClient, TokenInterface},
};

use crate::{
    Asset, Error, PriceData,
    admin::{
        IsFarmAdmin, MAX_LB_PRICE_CHANGE_RATE, MAX_UPFRONT_COMMISSION, validate_flashloan_params,
        validate_leverage_params, validate_rate_params,
    },
    collaborators::{FlashloanReceiverClient, LiquidityPoolClient, PriceFeedClient},
    fixed_point::FIXED_POINT_PRECISION,
    flashloan::{COMMISSION_DENOMINATOR, IsFlashLender},
    index_types::{
        BurnShares, CommissionWithdrawn, Divest, Flashloan, IndexesUpdated, Invest,
        LendingDeposit, LendingRedeem, Liquidation, MintShares, OnchainLiquidation,
    },
    lending::IsLendingPool,
    liquidation::{IsLiquidator, LiquidationSnapshot, OnchainLiquidationSnapshot},
    liquidity_book::{
        InvestSnapshot, IsLeveragedFarm, RedeemSnapshot, check_leverage, checked_reduce,
    },
    pending::{self, BalanceQuery},
    storage::{
        ADMIN_KEY, Allowance, DataKey, FarmStorage, FlashloanParams, InvestParams,
        LeverageParams, Market, PoolSnapshot, Position, RateParams, RedeemParams, Txn,
    },
};

const VERSION_STRING: &str = concat!(
    env!("CARGO_PKG_VERSION_MAJOR"),
    ".",
    env!("CARGO_PKG_VERSION_MINOR"),
    ".",
    env!("CARGO_PKG_VERSION_PATCH")
);
/// Base tokens the pool may pull when adding liquidity; the pool takes what the ratio needs.
const MAX_BASE_DEPOSITED: i128 = 1_000_000_000_000_000_000;
// Seconds
const DEADLINE_OFFSET: u64 = 1;

fn assert_non_negative(env: &Env, value: i128) {
    assert_with_error!(env, value >= 0, Error::ValueNotPositive);
}

#[contract]
pub struct LeverageFarmContract;

#[contractimpl]
impl LeverageFarmContract {
    #[allow(clippy::too_many_arguments)]
    pub fn __constructor(
        env: &Env,
        admin: Address,
        base_token: Address,
        quote_token: Address,
        lp_token: Address,
        liquidity_pool: Address,
        oracle: Address,
        base_asset: Symbol,
        quote_asset: Symbol,
        name: String,
        symbol: String,
    ) {
        Self::set_admin(env, &admin);
        let decimals = TokenClient::new(env, &base_token).decimals() + FIXED_POINT_PRECISION;
        let state = FarmStorage::new(
            env,
            name,
            symbol,
            decimals,
            base_token,
            quote_token,
            lp_token,
            liquidity_pool,
            oracle,
            base_asset,
            quote_asset,
        );
        FarmStorage::set_state(env, &state);
    }

    /// Get the admin address
    pub fn admin(env: &Env) -> Option<Address> {
        env.storage().instance().get(&ADMIN_KEY)
    }
}

impl LeverageFarmContract {
    /// Set the admin address. Can only be called once.
    fn set_admin(env: &Env, admin: &Address) {
        if env.storage().instance().has(&ADMIN_KEY) {
            panic_with_error!(env, Error::Forbidden);
        }
        env.storage().instance().set(&ADMIN_KEY, admin);
    }

    fn require_admin(env: &Env) -> Address {
        let admin = Self::admin(env).unwrap_or_else(|| panic_with_error!(env, Error::Forbidden));
        admin.require_auth();
        admin
    }

    fn deadline(env: &Env) -> u64 {
        env.ledger().timestamp() + DEADLINE_OFFSET
    }

    fn transfer_in(env: &Env, token: &Address, from: &Address, amount: i128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let _ = TokenClient::new(env, token)
            .try_transfer(from, env.current_contract_address(), &amount)
            .map_err(|_| Error::TransferFailed)?;
        Ok(())
    }

    fn transfer_out(env: &Env, token: &Address, to: &Address, amount: i128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let _ = TokenClient::new(env, token)
            .try_transfer(&env.current_contract_address(), to, &amount)
            .map_err(|_| Error::TransferFailed)?;
        Ok(())
    }

    fn set_allowance(env: &Env, token: &Address, spender: &Address, amount: i128) -> Result<(), Error> {
        let _ = TokenClient::new(env, token)
            .try_approve(
                &env.current_contract_address(),
                spender,
                &amount,
                &env.ledger().sequence(),
            )
            .map_err(|_| Error::TransferFailed)?;
        Ok(())
    }

    fn holdings(env: &Env, token: &Address) -> i128 {
        TokenClient::new(env, token).balance(&env.current_contract_address())
    }

    /// Read the contract's balance of `token` under a pending-query ticket.
    /// The ticket takes the place of callback status flags; within one invocation it
    /// only ever sees a matching delivery.
    fn observe_balance(env: &Env, token: &Address, query: BalanceQuery) -> Result<i128, Error> {
        let ticket = pending::request(env, query)?;
        let balance = Self::holdings(env, token);
        pending::deliver(env, &ticket, query)?;
        Ok(balance)
    }

    fn sell_quote(
        env: &Env,
        state: &FarmStorage,
        quote_sold: i128,
        min_base_bought: i128,
    ) -> Result<i128, Error> {
        if quote_sold <= 0 {
            return Ok(0);
        }
        Self::set_allowance(env, &state.quote_token, &state.dex, quote_sold)?;
        let bought = LiquidityPoolClient::new(env, &state.dex)
            .try_quote_to_base(
                &env.current_contract_address(),
                &quote_sold,
                &min_base_bought,
                &Self::deadline(env),
            )
            .map_err(|_| Error::DexCallFailed)?
            .map_err(|_| Error::DexCallFailed)?;
        Self::set_allowance(env, &state.quote_token, &state.dex, 0)?;
        Ok(bought)
    }

    fn sell_base(
        env: &Env,
        state: &FarmStorage,
        base_sold: i128,
        min_quote_bought: i128,
    ) -> Result<i128, Error> {
        if base_sold <= 0 {
            return Ok(0);
        }
        Self::set_allowance(env, &state.base_token, &state.dex, base_sold)?;
        let bought = LiquidityPoolClient::new(env, &state.dex)
            .try_base_to_quote(
                &env.current_contract_address(),
                &base_sold,
                &min_quote_bought,
                &Self::deadline(env),
            )
            .map_err(|_| Error::DexCallFailed)?
            .map_err(|_| Error::DexCallFailed)?;
        Self::set_allowance(env, &state.base_token, &state.dex, 0)?;
        Ok(bought)
    }

    fn add_liquidity(
        env: &Env,
        state: &FarmStorage,
        quote_deposited: i128,
        min_lqt_minted: i128,
    ) -> Result<i128, Error> {
        let pool = &state.liquidity_pool;
        Self::set_allowance(env, &state.base_token, pool, MAX_BASE_DEPOSITED)?;
        Self::set_allowance(env, &state.quote_token, pool, quote_deposited)?;
        let minted = LiquidityPoolClient::new(env, pool)
            .try_add_liquidity(
                &env.current_contract_address(),
                &quote_deposited,
                &min_lqt_minted,
                &MAX_BASE_DEPOSITED,
                &Self::deadline(env),
            )
            .map_err(|_| Error::DexCallFailed)?
            .map_err(|_| Error::DexCallFailed)?;
        Self::set_allowance(env, &state.base_token, pool, 0)?;
        Self::set_allowance(env, &state.quote_token, pool, 0)?;
        Ok(minted)
    }

    fn remove_liquidity(
        env: &Env,
        state: &FarmStorage,
        lqt_burned: i128,
        min_base_withdrawn: i128,
    ) -> Result<(i128, i128), Error> {
        let pool = &state.liquidity_pool;
        Self::set_allowance(env, &state.lp_token, pool, lqt_burned)?;
        let withdrawn = LiquidityPoolClient::new(env, pool)
            .try_remove_liquidity(
                &env.current_contract_address(),
                &lqt_burned,
                &0,
                &min_base_withdrawn,
                &Self::deadline(env),
            )
            .map_err(|_| Error::DexCallFailed)?
            .map_err(|_| Error::DexCallFailed)?;
        Self::set_allowance(env, &state.lp_token, pool, 0)?;
        Ok(withdrawn)
    }

    /// Most recent SEP-40 price of `asset`
    fn lastprice(env: &Env, oracle: &Address, asset: &Symbol) -> Result<PriceData, Error> {
        let client = PriceFeedClient::new(env, oracle);
        match client.try_lastprice(&Asset::Other(asset.clone())) {
            Ok(price_data_option) => match price_data_option {
                Ok(Some(price_data)) if price_data.price > 0 => Ok(price_data),
                Ok(_) => Err(Error::OraclePriceFetchFailed),
                Err(_) => Err(Error::OraclePriceFetchFailed),
            },
            Err(_) => Err(Error::OraclePriceFetchFailed),
        }
    }

    fn pool_snapshot(env: &Env, state: &FarmStorage) -> PoolSnapshot {
        PoolSnapshot {
            base_reserve: TokenClient::new(env, &state.base_token).balance(&state.liquidity_pool),
            lqt_total: LiquidityPoolClient::new(env, &state.liquidity_pool).lqt_total(),
        }
    }

    /// Accrue indexes and move the LP price up to the current ledger time.
    fn update_rates(env: &Env, state: &mut FarmStorage) {
        let now = env.ledger().timestamp();
        if state.indexes.update_time == now {
            return;
        }
        let pool = Self::pool_snapshot(env, state);
        let gross_credit_rate = state.accrue_indexes(env, now);
        state.update_lp_price(env, now, &pool);
        state.indexes.update_time = now;

        IndexesUpdated {
            gross_credit_index: state.indexes.gross_credit_index,
            net_credit_index: state.indexes.net_credit_index,
            deposit_index: state.indexes.deposit_index,
            gross_credit_rate,
            lp_price: state.indexes.lp_price,
            timestamp: now,
        }
        .publish(env);
    }

    fn finalize_invest(
        env: &Env,
        state: &mut FarmStorage,
        snapshot: InvestSnapshot,
        current_base: i128,
        current_lp: i128,
    ) -> Result<Position, Error> {
        let base_delta = snapshot.initial_base - current_base;
        if base_delta < 0 {
            return Err(Error::NegativeBaseDelta);
        }
        let lp_delta = current_lp - snapshot.initial_lp;
        if lp_delta < 0 {
            return Err(Error::NegativeLpDelta);
        }
        check_leverage(state.leverage.max_leverage, snapshot.base_to_quote, base_delta)?;

        let mut position = FarmStorage::get_position(env, &snapshot.farmer).unwrap_or_default();
        state.add_credit(env, &mut position, base_delta, lp_delta);
        state.base_shares = current_base;
        state.lp_shares = current_lp;
        state.check_solvency(env)?;

        log!(env, "invest finalized", snapshot.farmer, base_delta, lp_delta);
        FarmStorage::set_position(env, &snapshot.farmer, &position);
        FarmStorage::set_state(env, state);
        Invest {
            farmer: snapshot.farmer,
            principal: snapshot.principal,
            upfront_commission: snapshot.upfront_commission,
            borrowed_shares: base_delta,
            lp_shares: lp_delta,
        }
        .publish(env);
        Ok(position)
    }

    fn finalize_redeem(
        env: &Env,
        state: &mut FarmStorage,
        snapshot: RedeemSnapshot,
        mut position: Position,
        current_base: i128,
    ) -> Result<Position, Error> {
        let debt_shares = state.partial_reset_position(env, &mut position, snapshot.lqt_burned)?;
        let base_delta = current_base - snapshot.initial_base;
        if base_delta < 0 {
            return Err(Error::NegativeBaseDelta);
        }
        let extra_shares = base_delta - debt_shares;
        if extra_shares < 0 {
            return Err(Error::NotEnoughCollateral);
        }

        state.base_shares = current_base;
        if extra_shares > 0 {
            Self::sell_base(env, state, extra_shares, 0)?;
            state.base_shares -= extra_shares;
        }
        let quote_paid_out = Self::holdings(env, &state.quote_token);
        Self::transfer_out(env, &state.quote_token, &snapshot.farmer, quote_paid_out)?;

        log!(env, "redeem finalized", snapshot.farmer, debt_shares, extra_shares);
        FarmStorage::set_position(env, &snapshot.farmer, &position);
        FarmStorage::set_state(env, state);
        Divest {
            farmer: snapshot.farmer,
            lp_burned: snapshot.lqt_burned,
            debt_shares,
            extra_shares,
            quote_paid_out,
        }
        .publish(env);
        Ok(position)
    }

    fn finalize_liquidation(
        env: &Env,
        state: &mut FarmStorage,
        snapshot: LiquidationSnapshot,
        mut position: Position,
    ) -> Result<Position, Error> {
        let seizure =
            state.settle_liquidation(env, &mut position, snapshot.payment, snapshot.base_price)?;

        Self::transfer_in(env, &state.base_token, &snapshot.liquidator, snapshot.payment)?;
        if seizure.admin_commission > 0 {
            let admin = Self::admin(env).ok_or(Error::Forbidden)?;
            Self::transfer_out(env, &state.base_token, &admin, seizure.admin_commission)?;
        }
        Self::transfer_out(env, &state.lp_token, &snapshot.liquidator, seizure.lp_shares)?;
        state.check_solvency(env)?;

        log!(env, "liquidated", snapshot.owner, seizure.debt_shares, seizure.lp_shares);
        FarmStorage::set_position(env, &snapshot.owner, &position);
        FarmStorage::set_state(env, state);
        Liquidation {
            owner: snapshot.owner,
            liquidator: snapshot.liquidator,
            payment_shares: snapshot.payment,
            liquidated_debt_shares: seizure.debt_shares,
            liquidated_lp_shares: seizure.lp_shares,
            admin_commission: seizure.admin_commission,
            lp_value: seizure.lp_value,
            debt_value: seizure.debt_value,
            base_price: snapshot.base_price,
            quote_price: snapshot.quote_price,
            ledger: env.ledger().sequence(),
            timestamp: env.ledger().timestamp(),
        }
        .publish(env);
        Ok(position)
    }

    fn finalize_onchain_liquidation(
        env: &Env,
        state: &mut FarmStorage,
        snapshot: OnchainLiquidationSnapshot,
        mut position: Position,
        current_base: i128,
        admin: &Address,
    ) -> Result<i128, Error> {
        let proceeds = current_base - snapshot.initial_base;
        if proceeds < 0 {
            return Err(Error::NegativeBaseDelta);
        }
        state.base_shares = current_base;
        let settlement = state.settle_onchain_liquidation(env, &mut position, proceeds)?;
        Self::transfer_out(env, &state.base_token, admin, settlement.admin_commission)?;

        log!(env, "onchain liquidation", snapshot.owner, proceeds, settlement.debt_shares);
        FarmStorage::set_position(env, &snapshot.owner, &position);
        FarmStorage::set_state(env, state);
        OnchainLiquidation {
            owner: snapshot.owner,
            proceeds_shares: proceeds,
            debt_shares: settlement.debt_shares,
            admin_commission: settlement.admin_commission,
            deposit_index: state.indexes.deposit_index,
            ledger: env.ledger().sequence(),
            timestamp: env.ledger().timestamp(),
        }
        .publish(env);
        Ok(proceeds)
    }

    // Deposit-share bookkeeping
    fn set_and_extend_allowance(
        env: &Env,
        from: Address,
        spender: Address,
        amount: i128,
        live_until_ledger: u32,
    ) {
        assert_non_negative(env, amount);
        let current_ledger = env.ledger().sequence();
        assert_with_error!(
            env,
            amount == 0 || live_until_ledger >= current_ledger,
            Error::InvalidLedgerSequence
        );
        let key = DataKey::Allowance(Txn(from, spender));
        env.storage().persistent().set(
            &key,
            &Allowance {
                amount,
                live_until_ledger,
            },
        );
        let max_ttl = env.storage().max_ttl();
        env.storage().persistent().extend_ttl(&key, max_ttl, max_ttl);
    }

    fn spend_allowance(env: &Env, from: Address, spender: Address, amount: i128) {
        let allowance = Self::allowance(env.clone(), from.clone(), spender.clone());
        assert_with_error!(env, allowance >= amount, Error::InsufficientAllowance);
        let live_until_ledger = env
            .storage()
            .persistent()
            .get::<_, Allowance>(&DataKey::Allowance(Txn(from.clone(), spender.clone())))
            .map(|a| a.live_until_ledger)
            .unwrap_or(0);
        Self::set_and_extend_allowance(env, from, spender, allowance - amount, live_until_ledger);
    }

    fn transfer_internal(env: &Env, from: Address, to: Address, amount: i128) {
        let Some(from_balance) = FarmStorage::get_balance(env, &from).checked_sub(amount) else {
            panic_with_error!(env, Error::ArithmeticError);
        };
        let Some(to_balance) = FarmStorage::get_balance(env, &to).checked_add(amount) else {
            panic_with_error!(env, Error::ArithmeticError);
        };
        FarmStorage::set_balance(env, &from, from_balance);
        FarmStorage::set_balance(env, &to, to_balance);
    }

    /// Deposit shares given up by `from` stay with the other lenders.
    fn burn_internal(env: &Env, from: Address, amount: i128) {
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);
        let Some(new_balance) = FarmStorage::get_balance(env, &from).checked_sub(amount) else {
            panic_with_error!(env, Error::ArithmeticError);
        };
        FarmStorage::set_balance(env, &from, new_balance);
        state.forfeit_deposit_shares(env, amount);
        if let Err(error) = state.check_solvency(env) {
            panic_with_error!(env, error);
        }
        FarmStorage::set_state(env, &state);
        BurnShares { from, amount }.publish(env);
    }
}

#[contractimpl]
impl IsLendingPool for LeverageFarmContract {
    fn deposit_lending(env: &Env, lender: Address, shares: i128) -> Result<i128, Error> {
        assert_non_negative(env, shares);
        lender.require_auth();
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);

        let deposit_shares = state.deposit_shares_for(env, shares);
        let Some(balance) = FarmStorage::get_balance(env, &lender).checked_add(deposit_shares)
        else {
            return Err(Error::ArithmeticError);
        };
        FarmStorage::set_balance(env, &lender, balance);
        state.total_supply += deposit_shares;

        Self::transfer_in(env, &state.base_token, &lender, shares)?;
        state.base_shares += shares;
        FarmStorage::set_state(env, &state);

        MintShares {
            to: lender.clone(),
            amount: deposit_shares,
        }
        .publish(env);
        LendingDeposit {
            lender,
            shares,
            deposit_shares,
            deposit_index: state.indexes.deposit_index,
        }
        .publish(env);
        Ok(deposit_shares)
    }

    fn redeem_lending(env: &Env, lender: Address, shares: i128) -> Result<i128, Error> {
        assert_non_negative(env, shares);
        lender.require_auth();
        if !FarmStorage::has_lender(env, &lender) {
            return Err(Error::UnknownAddress);
        }
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);

        let deposit_shares = state.redeem_shares_for(env, shares);
        let balance = FarmStorage::get_balance(env, &lender);
        if deposit_shares > balance {
            return Err(Error::TooMuchAmount);
        }
        if deposit_shares > state.total_supply {
            return Err(Error::WrongTotalDeposit);
        }
        FarmStorage::set_balance(env, &lender, balance - deposit_shares);
        state.total_supply -= deposit_shares;
        state.check_solvency(env)?;

        if shares > state.base_shares {
            return Err(Error::InsufficientBalance);
        }
        Self::transfer_out(env, &state.base_token, &lender, shares)?;
        state.base_shares -= shares;
        FarmStorage::set_state(env, &state);

        BurnShares {
            from: lender.clone(),
            amount: deposit_shares,
        }
        .publish(env);
        LendingRedeem {
            lender,
            shares,
            deposit_shares,
            deposit_index: state.indexes.deposit_index,
        }
        .publish(env);
        Ok(deposit_shares)
    }

    fn update_indexes(env: &Env) -> Result<(), Error> {
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);
        FarmStorage::set_state(env, &state);
        Ok(())
    }

    fn withdraw_commission(env: &Env) -> Result<i128, Error> {
        let admin = Self::require_admin(env);
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);

        let shares = state.commission_shares(env);
        if shares > 0 {
            Self::transfer_out(env, &state.base_token, &admin, shares)?;
            state.base_shares -= shares;
            CommissionWithdrawn { admin, shares }.publish(env);
        }
        FarmStorage::set_state(env, &state);
        Ok(shares)
    }

    fn total_supply(env: &Env) -> i128 {
        FarmStorage::get_state(env).total_supply
    }

    fn market(env: &Env) -> Market {
        let state = FarmStorage::get_state(env);
        Market {
            indexes: state.indexes,
            total_gross_credit: state.total_gross_credit,
            total_net_credit: state.total_net_credit,
            total_supply: state.total_supply,
            lp_shares: state.lp_shares,
            base_shares: state.base_shares,
            flashloan_shares: state.flashloan_shares,
            is_working: state.is_working,
            onchain_liquidation_available: state.onchain_liquidation_available,
            upfront_commission: state.upfront_commission,
            lp_price_change_rate: state.lp_price_change_rate,
        }
    }

    fn gross_credit_rate(env: &Env) -> i128 {
        FarmStorage::get_state(env).gross_credit_rate(env)
    }
}

#[contractimpl]
impl IsLeveragedFarm for LeverageFarmContract {
    fn invest_lb(env: &Env, farmer: Address, params: InvestParams) -> Result<Position, Error> {
        for value in [
            params.amount,
            params.amount_to_base,
            params.min_base_bought,
            params.base_to_quote,
            params.min_quote_bought,
            params.amount_to_lqt,
            params.min_lqt_minted,
        ] {
            assert_non_negative(env, value);
        }
        farmer.require_auth();
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);

        Self::transfer_in(env, &state.quote_token, &farmer, params.amount)?;
        let borrowed_quote = 2 * params.amount_to_lqt - params.amount;
        let upfront_commission = if borrowed_quote >= 0 {
            borrowed_quote * state.upfront_commission
                / (COMMISSION_DENOMINATOR - state.upfront_commission)
        } else {
            0
        };
        if upfront_commission > 0 {
            let admin = Self::admin(env).ok_or(Error::Forbidden)?;
            Self::transfer_out(env, &state.quote_token, &admin, upfront_commission)?;
        }
        if params.amount > params.amount_to_base + params.amount_to_lqt + upfront_commission {
            return Err(Error::SentAmountMismatch);
        }

        let snapshot = InvestSnapshot {
            farmer,
            principal: params.amount,
            upfront_commission,
            base_to_quote: params.base_to_quote,
            initial_base: state.base_shares,
            initial_lp: state.lp_shares,
        };

        if params.amount_to_base > 0 {
            Self::sell_quote(env, &state, params.amount_to_base, params.min_base_bought)?;
        } else if params.base_to_quote > 0 {
            Self::sell_base(env, &state, params.base_to_quote, params.min_quote_bought)?;
        }
        Self::add_liquidity(env, &state, params.amount_to_lqt, params.min_lqt_minted)?;
        let leftover_quote = Self::holdings(env, &state.quote_token);
        Self::sell_quote(env, &state, leftover_quote, 0)?;

        let current_base = Self::observe_balance(env, &state.base_token, BalanceQuery::BaseShares)?;
        let current_lp = Self::observe_balance(env, &state.lp_token, BalanceQuery::LpShares)?;
        Self::finalize_invest(env, &mut state, snapshot, current_base, current_lp)
    }

    fn redeem_lb(env: &Env, farmer: Address, params: RedeemParams) -> Result<Position, Error> {
        assert_non_negative(env, params.lqt_burned);
        assert_non_negative(env, params.min_base_withdrawn);
        assert_non_negative(env, params.quote_to_base_amount);
        farmer.require_auth();
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);

        let position = FarmStorage::require_position(env, &farmer)?;
        if params.lqt_burned <= 0 || params.lqt_burned > position.lp_shares {
            return Err(Error::TooMuchAmount);
        }
        let snapshot = RedeemSnapshot {
            farmer,
            lqt_burned: params.lqt_burned,
            initial_base: state.base_shares,
        };

        state.lp_shares = checked_reduce(state.lp_shares, params.lqt_burned)?;
        Self::remove_liquidity(env, &state, params.lqt_burned, params.min_base_withdrawn)?;
        if params.quote_to_base_amount > 0 {
            Self::sell_quote(env, &state, params.quote_to_base_amount, 0)?;
        }

        let current_base = Self::observe_balance(env, &state.base_token, BalanceQuery::BaseShares)?;
        Self::finalize_redeem(env, &mut state, snapshot, position, current_base)
    }

    fn position(env: &Env, owner: Address) -> Result<Position, Error> {
        FarmStorage::require_position(env, &owner)
    }

    fn debt_shares(env: &Env, owner: Address) -> Result<i128, Error> {
        let position = FarmStorage::require_position(env, &owner)?;
        Ok(FarmStorage::get_state(env).debt_shares_of(env, &position))
    }
}

#[contractimpl]
impl IsLiquidator for LeverageFarmContract {
    fn liquidate_lb(
        env: &Env,
        liquidator: Address,
        owner: Address,
        payment: i128,
    ) -> Result<Position, Error> {
        assert_non_negative(env, payment);
        liquidator.require_auth();
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);

        let position = FarmStorage::require_position(env, &owner)?;
        if position.net_credit <= 0 {
            return Err(Error::NotLoaned);
        }
        let base_price = Self::lastprice(env, &state.oracle, &state.base_asset)?.price;
        let quote_price = Self::lastprice(env, &state.oracle, &state.quote_asset)?.price;

        let snapshot = LiquidationSnapshot {
            owner,
            liquidator,
            payment,
            base_price,
            quote_price,
        };
        Self::finalize_liquidation(env, &mut state, snapshot, position)
    }

    fn liquidate_onchain_lb(env: &Env, owner: Address) -> Result<i128, Error> {
        let admin = Self::require_admin(env);
        let mut state = FarmStorage::get_state(env);
        if !state.onchain_liquidation_available {
            return Err(Error::OnchainLiquidationDisabled);
        }
        Self::update_rates(env, &mut state);

        let position = FarmStorage::require_position(env, &owner)?;
        if position.net_credit <= 0 {
            return Err(Error::NotLoaned);
        }
        let snapshot = OnchainLiquidationSnapshot {
            owner,
            initial_base: state.base_shares,
        };

        state.lp_shares = checked_reduce(state.lp_shares, position.lp_shares)?;
        if position.lp_shares > 0 {
            Self::remove_liquidity(env, &state, position.lp_shares, 0)?;
        }
        let quote = Self::holdings(env, &state.quote_token);
        Self::sell_quote(env, &state, quote, 0)?;

        let current_base = Self::observe_balance(env, &state.base_token, BalanceQuery::BaseShares)?;
        Self::finalize_onchain_liquidation(env, &mut state, snapshot, position, current_base, &admin)
    }
}

#[contractimpl]
impl IsFlashLender for LeverageFarmContract {
    fn flashloan(env: &Env, receiver: Address, requested_shares: i128) -> Result<i128, Error> {
        receiver.require_auth();
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);
        let fee = state.open_flashloan(env, requested_shares)?;

        let lender = env.current_contract_address();
        let before = Self::holdings(env, &state.base_token);
        Self::transfer_out(env, &state.base_token, &receiver, requested_shares)?;
        let _ = FlashloanReceiverClient::new(env, &receiver)
            .try_exec_flashloan(&lender, &state.base_token, &requested_shares, &fee)
            .map_err(|_| Error::LoanNotRepaid)?;

        let after = Self::observe_balance(env, &state.base_token, BalanceQuery::BaseShares)?;
        let returned_shares = after - (before - requested_shares);
        state.flashloan_return(returned_shares);
        state.finalize_flashloan()?;
        // over-payment stays in the tracked holdings
        state.base_shares = after;

        log!(env, "flashloan repaid", receiver, requested_shares, returned_shares);
        FarmStorage::set_state(env, &state);
        Flashloan {
            receiver,
            requested_shares,
            fee,
            returned_shares,
        }
        .publish(env);
        Ok(fee)
    }
}

#[contractimpl]
impl IsFarmAdmin for LeverageFarmContract {
    fn set_rate_params(env: &Env, params: RateParams) -> Result<RateParams, Error> {
        Self::require_admin(env);
        validate_rate_params(&params)?;
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);
        state.rate_params = params;
        FarmStorage::set_state(env, &state);
        Ok(params)
    }

    fn set_leverage_params(
        env: &Env,
        params: LeverageParams,
        oracle: Address,
    ) -> Result<LeverageParams, Error> {
        Self::require_admin(env);
        validate_leverage_params(&params)?;
        let mut state = FarmStorage::get_state(env);
        state.leverage = params;
        state.oracle = oracle;
        FarmStorage::set_state(env, &state);
        Ok(params)
    }

    fn set_upfront_commission(env: &Env, value: i128) -> Result<i128, Error> {
        Self::require_admin(env);
        if !(0..=MAX_UPFRONT_COMMISSION).contains(&value) {
            return Err(Error::ParameterOutOfRange);
        }
        let mut state = FarmStorage::get_state(env);
        state.upfront_commission = value;
        FarmStorage::set_state(env, &state);
        Ok(value)
    }

    fn set_lb_price_change_rate(env: &Env, value: i128) -> Result<i128, Error> {
        Self::require_admin(env);
        if !(0..=MAX_LB_PRICE_CHANGE_RATE).contains(&value) {
            return Err(Error::ParameterOutOfRange);
        }
        let mut state = FarmStorage::get_state(env);
        state.lp_price_change_rate = value;
        FarmStorage::set_state(env, &state);
        Ok(value)
    }

    fn set_flashloan_params(env: &Env, params: FlashloanParams) -> Result<FlashloanParams, Error> {
        Self::require_admin(env);
        validate_flashloan_params(&params)?;
        let mut state = FarmStorage::get_state(env);
        state.flashloan = params;
        FarmStorage::set_state(env, &state);
        Ok(params)
    }

    fn set_dex_contract(env: &Env, dex: Address) {
        Self::require_admin(env);
        let mut state = FarmStorage::get_state(env);
        state.dex = dex;
        FarmStorage::set_state(env, &state);
    }

    fn set_is_working_status(env: &Env, is_working: bool) -> Result<bool, Error> {
        Self::require_admin(env);
        let mut state = FarmStorage::get_state(env);
        Self::update_rates(env, &mut state);
        state.is_working = is_working;
        FarmStorage::set_state(env, &state);
        Ok(is_working)
    }

    fn disable_onchain_liquidation(env: &Env) {
        Self::require_admin(env);
        let mut state = FarmStorage::get_state(env);
        state.onchain_liquidation_available = false;
        FarmStorage::set_state(env, &state);
    }

    fn rate_params(env: &Env) -> RateParams {
        FarmStorage::get_state(env).rate_params
    }

    fn leverage_params(env: &Env) -> LeverageParams {
        FarmStorage::get_state(env).leverage
    }

    fn flashloan_params(env: &Env) -> FlashloanParams {
        FarmStorage::get_state(env).flashloan
    }

    fn upgrade(env: &Env, new_wasm_hash: BytesN<32>) {
        Self::require_admin(env);
        env.deployer().update_current_contract_wasm(new_wasm_hash);
    }

    fn version(env: &Env) -> String {
        String::from_str(env, VERSION_STRING)
    }
}

#[contractimpl]
impl TokenInterface for LeverageFarmContract {
    /// Return the allowance for `spender` to transfer from `from`.
    fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        let allowance: Option<Allowance> = env
            .storage()
            .persistent()
            .get(&DataKey::Allowance(Txn(from, spender)));
        match allowance {
            Some(a) if env.ledger().sequence() <= a.live_until_ledger => a.amount,
            _ => 0,
        }
    }

    /// Set the allowance by `amount` for `spender` to transfer/burn from `from`
    fn approve(env: Env, from: Address, spender: Address, amount: i128, live_until_ledger: u32) {
        from.require_auth();
        Self::set_and_extend_allowance(&env, from, spender, amount, live_until_ledger);
    }

    /// Return the deposit-share balance of `id`
    fn balance(env: Env, id: Address) -> i128 {
        FarmStorage::get_balance(&env, &id)
    }

    /// Transfer `amount` deposit shares from `from` to `to`
    fn transfer(env: Env, from: Address, to: MuxedAddress, amount: i128) {
        from.require_auth();
        assert_with_error!(env.clone(), amount > 0, Error::ValueNotPositive);
        assert_with_error!(
            env.clone(),
            to.address() != from,
            Error::CannotTransferToSelf
        );
        let balance = Self::balance(env.clone(), from.clone());
        assert_with_error!(env, balance >= amount, Error::InsufficientBalance);
        Self::transfer_internal(&env, from, to.address(), amount);
    }

    /// Transfer `amount` from `from` to `to`, consuming the allowance of `spender`
    fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();
        assert_with_error!(env.clone(), amount > 0, Error::ValueNotPositive);
        assert_with_error!(
            env.clone(),
            Self::balance(env.clone(), from.clone()) >= amount,
            Error::InsufficientBalance
        );
        Self::spend_allowance(&env, from.clone(), spender, amount);
        Self::transfer_internal(&env, from, to, amount);
    }

    /// Burn `amount` deposit shares from `from`
    fn burn(env: Env, from: Address, amount: i128) {
        from.require_auth();
        assert_with_error!(env.clone(), amount > 0, Error::ValueNotPositive);
        let balance = Self::balance(env.clone(), from.clone());
        assert_with_error!(env.clone(), balance >= amount, Error::InsufficientBalance);
        Self::burn_internal(&env, from, amount);
    }

    /// Burn `amount` from `from`, consuming the allowance of `spender`
    fn burn_from(env: Env, spender: Address, from: Address, amount: i128) {
        spender.require_auth();
        assert_with_error!(env.clone(), amount > 0, Error::ValueNotPositive);
        assert_with_error!(
            env.clone(),
            Self::balance(env.clone(), from.clone()) >= amount,
            Error::InsufficientBalance
        );
        Self::spend_allowance(&env, from.clone(), spender, amount);
        Self::burn_internal(&env, from, amount);
    }

    /// Return the number of decimals used to represent deposit shares
    fn decimals(env: Env) -> u32 {
        FarmStorage::get_state(&env).decimals
    }

    /// Return the name of the deposit-share token
    fn name(env: Env) -> String {
        FarmStorage::get_state(&env).name
    }

    /// Return the symbol of the deposit-share token
    fn symbol(env: Env) -> String {
        FarmStorage::get_state(&env).symbol
    }
}
