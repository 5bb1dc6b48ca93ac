use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entry::PaymentMethod;
use super::money::Money;

/// Type predicate of a filter; `All` means the predicate is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeFilter {
    #[default]
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl TypeFilter {
    fn as_param(self) -> Option<&'static str> {
        match self {
            TypeFilter::All => None,
            TypeFilter::In => Some("IN"),
            TypeFilter::Out => Some("OUT"),
        }
    }
}

/// The full predicate tuple understood by `GET /cash-entries`.
///
/// The live-ledger view populates `date` (plus `entry_type` and
/// `payment_method`); the report view uses the open date range and the text
/// and amount predicates. Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub entry_type: TypeFilter,
    pub date: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    pub payment_method: Option<PaymentMethod>,
}

impl EntryFilter {
    /// Filter used by the daily dashboard: one day, everything else open.
    pub fn for_day(date: NaiveDate) -> Self {
        EntryFilter { date: Some(date), ..EntryFilter::default() }
    }

    /// Query-string pairs for the service, omitting every absent predicate
    /// entirely so the service's own "no filter" default applies.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(date) = self.date {
            pairs.push(("date", date.to_string()));
        }
        if let Some(t) = self.entry_type.as_param() {
            pairs.push(("type", t.to_string()));
        }
        if let Some(pm) = self.payment_method {
            pairs.push(("paymentMethod", pm.as_param().to_string()));
        }
        if let Some(from) = self.date_from {
            pairs.push(("dateFrom", from.to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("dateTo", to.to_string()));
        }
        if let Some(category) = non_blank(&self.category) {
            pairs.push(("category", category));
        }
        if let Some(description) = non_blank(&self.description) {
            pairs.push(("description", description));
        }
        if let Some(min) = self.min_amount {
            pairs.push(("minAmount", min.to_string()));
        }
        if let Some(max) = self.max_amount {
            pairs.push(("maxAmount", max.to_string()));
        }
        pairs
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
