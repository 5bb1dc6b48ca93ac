use serde::{Deserialize, Serialize};

use super::entry::{EntryType, LedgerEntry};
use super::money::Money;

/// Aggregated totals over a set of entries.
///
/// Either fetched from `GET /cash-summary/daily` or computed client-side by
/// [`Summary::from_entries`]; the two must agree for the same entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_in: Money,
    pub total_out: Money,
    pub balance: Money,
    pub count_in: u32,
    pub count_out: u32,
}

impl Default for Summary {
    fn default() -> Self {
        Summary {
            total_in: Money::zero(),
            total_out: Money::zero(),
            balance: Money::zero(),
            count_in: 0,
            count_out: 0,
        }
    }
}

impl Summary {
    /// Single left-to-right fold; the type of each entry decides which total
    /// it feeds, and `balance = total_in - total_out` throughout.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        entries.into_iter().fold(Summary::default(), |mut acc, entry| {
            match entry.entry_type {
                EntryType::In => {
                    acc.total_in = acc.total_in + entry.amount;
                    acc.count_in += 1;
                }
                EntryType::Out => {
                    acc.total_out = acc.total_out + entry.amount;
                    acc.count_out += 1;
                }
            }
            acc.balance = acc.total_in - acc.total_out;
            acc
        })
    }
}
