use soroban_sdk::{Address, contractevent};

#[contractevent(topics = ["position"])]
pub struct Position {
    #[topic]
    pub owner: Address,
    pub lp_shares: i128,
    pub net_credit: i128,
    pub gross_credit: i128,
    pub ledger: u32,
    pub timestamp: u64,
}

#[contractevent(topics = ["indexes"])]
pub struct IndexesUpdated {
    pub gross_credit_index: i128,
    pub net_credit_index: i128,
    pub deposit_index: i128,
    pub gross_credit_rate: i128,
    pub lp_price: i128,
    pub timestamp: u64,
}

#[contractevent(topics = ["deposit"])]
pub struct LendingDeposit {
    #[topic]
    pub lender: Address,
    pub shares: i128,
    pub deposit_shares: i128,
    pub deposit_index: i128,
}

#[contractevent(topics = ["redeem"])]
pub struct LendingRedeem {
    #[topic]
    pub lender: Address,
    pub shares: i128,
    pub deposit_shares: i128,
    pub deposit_index: i128,
}

#[contractevent(topics = ["invest"])]
pub struct Invest {
    #[topic]
    pub farmer: Address,
    pub principal: i128,
    pub upfront_commission: i128,
    pub borrowed_shares: i128,
    pub lp_shares: i128,
}

#[contractevent(topics = ["divest"])]
pub struct Divest {
    #[topic]
    pub farmer: Address,
    pub lp_burned: i128,
    pub debt_shares: i128,
    pub extra_shares: i128,
    pub quote_paid_out: i128,
}

#[contractevent(topics = ["liquidation"])]
pub struct Liquidation {
    #[topic]
    pub owner: Address,
    #[topic]
    pub liquidator: Address,
    pub payment_shares: i128,
    pub liquidated_debt_shares: i128,
    pub liquidated_lp_shares: i128,
    pub admin_commission: i128,
    pub lp_value: i128,
    pub debt_value: i128,
    pub base_price: i128,
    pub quote_price: i128,
    pub ledger: u32,
    pub timestamp: u64,
}

#[contractevent(topics = ["onchain_liquidation"])]
pub struct OnchainLiquidation {
    #[topic]
    pub owner: Address,
    pub proceeds_shares: i128,
    pub debt_shares: i128,
    pub admin_commission: i128,
    pub deposit_index: i128,
    pub ledger: u32,
    pub timestamp: u64,
}

#[contractevent(topics = ["flashloan"])]
pub struct Flashloan {
    #[topic]
    pub receiver: Address,
    pub requested_shares: i128,
    pub fee: i128,
    pub returned_shares: i128,
}

#[contractevent(topics = ["commission"], data_format = "single-value")]
pub struct CommissionWithdrawn {
    #[topic]
    pub admin: Address,
    pub shares: i128,
}

#[contractevent(topics = ["mint"], data_format = "single-value")]
pub struct MintShares {
    #[topic]
    pub to: Address,
    pub amount: i128,
}

#[contractevent(topics = ["burn"], data_format = "single-value")]
pub struct BurnShares {
    #[topic]
    pub from: Address,
    pub amount: i128,
}
