//! Collateral account bookkeeping along one scenario path.

use chrono::NaiveDate;

#[derive(Clone, Debug, PartialEq)]
struct MarginCall {
    amount: f64,
    call_date: NaiveDate,
    pay_date: NaiveDate,
}

/// Collateral balance held against a netting set.
///
/// Positive balances are collateral held by us, negative balances collateral
/// posted. The balance is a step function of date: [`balance_at`] returns the
/// last recorded balance on or before a date.
///
/// [`balance_at`]: CollateralAccount::balance_at
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_exposure::collateral::CollateralAccount;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let mut account = CollateralAccount::new(0.0, d(1));
/// account.post_call(100.0, d(11), d(1));
/// assert_eq!(account.outstanding(), 100.0);
///
/// account.settle(d(11));
/// assert_eq!(account.balance_at(d(10)), 0.0);
/// assert_eq!(account.balance_at(d(11)), 100.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CollateralAccount {
    balances: Vec<(NaiveDate, f64)>,
    open_calls: Vec<MarginCall>,
}

impl CollateralAccount {
    /// Account opened with `balance` on `date`.
    pub fn new(balance: f64, date: NaiveDate) -> Self {
        Self {
            balances: vec![(date, balance)],
            open_calls: Vec::new(),
        }
    }

    /// Latest balance.
    pub fn balance(&self) -> f64 {
        self.balances.last().map_or(0.0, |(_, b)| *b)
    }

    /// Balance on `date`; zero before the account was opened.
    pub fn balance_at(&self, date: NaiveDate) -> f64 {
        let idx = self.balances.partition_point(|(d, _)| *d <= date);
        if idx == 0 {
            0.0
        } else {
            self.balances[idx - 1].1
        }
    }

    /// Sum of margin calls issued but not yet settled.
    pub fn outstanding(&self) -> f64 {
        self.open_calls.iter().map(|c| c.amount).sum()
    }

    /// Number of unsettled margin calls.
    pub fn open_call_count(&self) -> usize {
        self.open_calls.len()
    }

    /// Settles every open call whose pay date is on or before `date`.
    pub fn settle(&mut self, date: NaiveDate) {
        let (mut due, open): (Vec<_>, Vec<_>) = std::mem::take(&mut self.open_calls)
            .into_iter()
            .partition(|c| c.pay_date <= date);
        self.open_calls = open;
        due.sort_by_key(|c| (c.pay_date, c.call_date));
        for call in due {
            let balance = self.balance() + call.amount;
            self.record(call.pay_date, balance);
        }
    }

    /// Issues a margin call of `amount` on `call_date`, paid on `pay_date`.
    ///
    /// Calls paid on or before the call date settle immediately.
    pub fn post_call(&mut self, amount: f64, pay_date: NaiveDate, call_date: NaiveDate) {
        if pay_date <= call_date {
            let balance = self.balance() + amount;
            self.record(call_date, balance);
        } else {
            self.open_calls.push(MarginCall {
                amount,
                call_date,
                pay_date,
            });
        }
    }

    /// Returns all collateral on `date` and cancels open calls.
    pub fn close(&mut self, date: NaiveDate) {
        self.open_calls.clear();
        self.record(date, 0.0);
    }

    fn record(&mut self, date: NaiveDate, balance: f64) {
        // settlement dates never precede the last recorded date
        match self.balances.binary_search_by_key(&date, |(d, _)| *d) {
            Ok(idx) => self.balances[idx].1 = balance,
            Err(idx) => self.balances.insert(idx, (date, balance)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_balance_before_opening_is_zero() {
        let account = CollateralAccount::new(50.0, d(5));
        assert_eq!(account.balance_at(d(4)), 0.0);
        assert_eq!(account.balance_at(d(5)), 50.0);
        assert_eq!(account.balance_at(d(30)), 50.0);
    }

    #[test]
    fn test_immediate_call_settles_on_call_date() {
        let mut account = CollateralAccount::new(0.0, d(1));
        account.post_call(-20.0, d(2), d(2));
        assert_eq!(account.open_call_count(), 0);
        assert_eq!(account.balance_at(d(2)), -20.0);
    }

    #[test]
    fn test_lagged_calls_settle_in_pay_date_order() {
        let mut account = CollateralAccount::new(10.0, d(1));
        account.post_call(5.0, d(8), d(1));
        account.post_call(7.0, d(9), d(2));
        account.settle(d(7));
        assert_eq!(account.outstanding(), 12.0);

        account.settle(d(10));
        assert_eq!(account.outstanding(), 0.0);
        assert_eq!(account.balance_at(d(8)), 15.0);
        assert_eq!(account.balance_at(d(9)), 22.0);
        assert_eq!(account.balance(), 22.0);
    }

    #[test]
    fn test_close_zeroes_balance() {
        let mut account = CollateralAccount::new(10.0, d(1));
        account.post_call(5.0, d(20), d(10));
        account.close(d(15));
        assert_eq!(account.balance_at(d(14)), 10.0);
        assert_eq!(account.balance_at(d(15)), 0.0);
        assert_eq!(account.open_call_count(), 0);
    }
}
