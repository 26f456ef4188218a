use soroban_sdk::{Address, Env};

use crate::{
    Error,
    fixed_point::{ceil_div, factor, floor_div_wide, narrow, wide},
    storage::FarmStorage,
};

/// Commissions are expressed over this denominator.
pub const COMMISSION_DENOMINATOR: i128 = 100_000;

pub trait IsFlashLender {
    /// Lend `requested_shares` base units to `receiver` for the duration of its
    /// `exec_flashloan` call. Returns the fee charged.
    fn flashloan(env: &Env, receiver: Address, requested_shares: i128) -> Result<i128, Error>;
}

impl FarmStorage {
    /// Book a new flash loan and credit its deposit commission to lenders. Returns the fee.
    pub fn open_flashloan(&mut self, env: &Env, requested_shares: i128) -> Result<i128, Error> {
        if !self.flashloan.available {
            return Err(Error::FlashloanUnavailable);
        }
        if requested_shares <= 0 {
            return Err(Error::ZeroRequestedShares);
        }

        let commission = self.flashloan.admin_commission + self.flashloan.deposit_commission;
        let fee = ceil_div(env, requested_shares * commission, COMMISSION_DENOMINATOR);
        self.flashloan_shares += requested_shares + fee;
        self.base_shares += fee;

        if self.total_supply > 0 {
            let increase = floor_div_wide(
                env,
                &wide(env, self.flashloan.deposit_commission)
                    .mul(&wide(env, requested_shares))
                    .mul(&factor(env))
                    .mul(&factor(env)),
                &wide(env, self.total_supply).mul(&wide(env, COMMISSION_DENOMINATOR)),
            );
            self.indexes.deposit_index = narrow(
                env,
                &wide(env, self.indexes.deposit_index).add(&increase),
            );
        }
        Ok(fee)
    }

    /// Count `returned` base units against the outstanding loan. Over-payment is absorbed.
    pub fn flashloan_return(&mut self, returned: i128) {
        self.flashloan_shares = (self.flashloan_shares - returned.max(0)).max(0);
    }

    pub fn finalize_flashloan(&self) -> Result<(), Error> {
        if self.flashloan_shares == 0 {
            Ok(())
        } else {
            Err(Error::LoanNotRepaid)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{fixed_point::FIXED_POINT_FACTOR, liquidity_book::test::storage_with_indexes};

    fn lender_storage(e: &Env) -> FarmStorage {
        let mut storage = storage_with_indexes(e, FIXED_POINT_FACTOR, FIXED_POINT_FACTOR);
        storage.flashloan.available = true;
        storage.total_supply = 10_000_000 * FIXED_POINT_FACTOR;
        storage.base_shares = 10_000_000;
        storage
    }

    #[test]
    fn test_flashloan_repaid_in_full() {
        let e = Env::default();
        let mut storage = lender_storage(&e);

        let fee = storage.open_flashloan(&e, 1_000_000).unwrap();
        assert_eq!(fee, 1_500);
        assert_eq!(storage.flashloan_shares, 1_001_500);
        assert_eq!(storage.base_shares, 10_001_500);
        // 50 / 100_000 of the loan spread over 10^7 base units of deposits
        assert_eq!(storage.indexes.deposit_index, FIXED_POINT_FACTOR + 50_000_000);

        storage.flashloan_return(1_001_500);
        assert_eq!(storage.finalize_flashloan(), Ok(()));
    }

    #[test]
    fn test_flashloan_short_return_fails() {
        let e = Env::default();
        let mut storage = lender_storage(&e);

        storage.open_flashloan(&e, 1_000_000).unwrap();
        storage.flashloan_return(1_000_000);
        assert_eq!(storage.flashloan_shares, 1_500);
        assert_eq!(storage.finalize_flashloan(), Err(Error::LoanNotRepaid));

        storage.flashloan_return(5_000);
        assert_eq!(storage.flashloan_shares, 0);
        assert_eq!(storage.finalize_flashloan(), Ok(()));
    }

    #[test]
    fn test_flashloan_preconditions() {
        let e = Env::default();
        let mut storage = lender_storage(&e);
        assert_eq!(storage.open_flashloan(&e, 0), Err(Error::ZeroRequestedShares));

        storage.flashloan.available = false;
        assert_eq!(
            storage.open_flashloan(&e, 1_000),
            Err(Error::FlashloanUnavailable)
        );
    }
}
