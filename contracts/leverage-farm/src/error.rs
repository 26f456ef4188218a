use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Caller is not the principal this step expects
    Forbidden = 1,

    /// No lender or position record exists for this address
    UnknownAddress = 2,

    /// Redeemed or burned amount exceeds the recorded balance
    TooMuchAmount = 3,

    /// Insufficient balance
    InsufficientBalance = 4,

    /// Total deposit shares would become negative
    WrongTotalDeposit = 5,

    /// total_deposit_shares * deposit_index < total_net_credit * net_credit_index
    SolvencyViolation = 6,

    /// Invest exceeds the configured maximum leverage
    LeverageExceeded = 7,

    /// Position is not undercollateralized enough to be liquidated
    LiquidationNotAllowed = 8,

    /// rate_1 + rate_diff exceeds the maximum second rate
    RateAboveMax = 9,

    /// Threshold percents must satisfy threshold_1 <= threshold_2 <= 100
    WrongThresholdPercent = 10,

    /// Admin parameter outside of its allowed range
    ParameterOutOfRange = 11,

    /// Balance delivered without a matching pending query
    CallbackProtocol = 12,

    /// Flash loan was not fully repaid before finalization
    LoanNotRepaid = 13,

    /// Tracked base holdings moved the wrong way during the flow
    NegativeBaseDelta = 14,

    /// LP holdings decreased during an invest
    NegativeLpDelta = 15,

    /// Pro-rata reduction would drive a position component negative
    RoundingInconsistency = 16,

    /// Position has no outstanding credit
    NotLoaned = 17,

    /// On-chain liquidation was disabled by the admin
    OnchainLiquidationDisabled = 18,

    /// Flash loans are switched off
    FlashloanUnavailable = 19,

    /// Flash loan of zero shares
    ZeroRequestedShares = 20,

    /// Principal exceeds what the invest parameters spend
    SentAmountMismatch = 21,

    /// Redeemed collateral does not cover the repaid debt
    NotEnoughCollateral = 22,

    /// Liquidation payment is smaller than the debt it clears
    WrongLiquidationPricePercent = 23,

    /// Failed to fetch price data from the Oracle
    OraclePriceFetchFailed = 24,

    /// Token transfer or approval failed
    TransferFailed = 25,

    /// Liquidity pool or swap venue call failed
    DexCallFailed = 26,

    /// Value must be greater than or equal to 0
    ValueNotPositive = 27,

    /// live_until_ledger must be greater than or equal to the current ledger number
    InvalidLedgerSequence = 28,

    /// Insufficient allowance; spender must call `approve` first
    InsufficientAllowance = 29,

    /// Arithmetic overflow or underflow occurred
    ArithmeticError = 30,

    /// Cannot transfer to self
    CannotTransferToSelf = 31,
}
