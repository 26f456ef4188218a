#![no_std]
use soroban_sdk::{self, Address, Symbol, contracttype};

mod admin;
mod collaborators;
mod error;
pub mod farm;
mod fixed_point;
mod flashloan;
mod index_types;
mod lending;
mod liquidation;
mod liquidity_book;
mod pending;
mod rates;
mod storage;

pub use error::Error;

/// Asset identifier understood by SEP-40 price feeds
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Asset {
    Stellar(Address),
    Other(Symbol),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceData {
    pub price: i128,    //asset price at given point in time
    pub timestamp: u64, //recording timestamp
}
