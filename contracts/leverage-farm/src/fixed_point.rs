use soroban_sdk::{Env, U256, panic_with_error};

use crate::Error;

pub const FIXED_POINT_PRECISION: u32 = 12;
/// Scale of every index, rate and internal nominal amount.
pub const FIXED_POINT_FACTOR: i128 = 1_000_000_000_000;
pub const INITIAL_INDEX_VALUE: i128 = FIXED_POINT_FACTOR;

pub fn wide(env: &Env, value: i128) -> U256 {
    if value < 0 {
        panic_with_error!(env, Error::ArithmeticError);
    }
    U256::from_u128(env, value as u128)
}

pub fn narrow(env: &Env, value: &U256) -> i128 {
    match value.to_u128() {
        Some(v) if v <= i128::MAX as u128 => v as i128,
        _ => panic_with_error!(env, Error::ArithmeticError),
    }
}

pub fn factor(env: &Env) -> U256 {
    wide(env, FIXED_POINT_FACTOR)
}

/// ⌈numerator / denominator⌉
pub fn ceil_div_wide(env: &Env, numerator: &U256, denominator: &U256) -> U256 {
    if *denominator == U256::from_u32(env, 0) {
        panic_with_error!(env, Error::ArithmeticError);
    }
    let quotient = numerator.div(denominator);
    if quotient.mul(denominator) == *numerator {
        quotient
    } else {
        quotient.add(&U256::from_u32(env, 1))
    }
}

pub fn floor_div_wide(env: &Env, numerator: &U256, denominator: &U256) -> U256 {
    if *denominator == U256::from_u32(env, 0) {
        panic_with_error!(env, Error::ArithmeticError);
    }
    numerator.div(denominator)
}

pub fn ceil_div(env: &Env, numerator: i128, denominator: i128) -> i128 {
    narrow(
        env,
        &ceil_div_wide(env, &wide(env, numerator), &wide(env, denominator)),
    )
}

/// a * b / denominator, rounded down
pub fn mul_div_floor(env: &Env, a: i128, b: i128, denominator: i128) -> i128 {
    let product = wide(env, a).mul(&wide(env, b));
    narrow(env, &floor_div_wide(env, &product, &wide(env, denominator)))
}

/// External token units to the internal nominal scale.
pub fn shares_to_nat(env: &Env, shares: i128) -> U256 {
    wide(env, shares).mul(&factor(env))
}

/// Internal nominal amount back to token units, rounded up.
pub fn ceil_nat_to_shares(env: &Env, nat_value: &U256) -> i128 {
    narrow(env, &ceil_div_wide(env, nat_value, &factor(env)))
}
