use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entry::{EntryType, PaymentMethod};
use super::money::Money;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
}

/// An entry under construction, not yet submitted.
///
/// Mutable by direct user edits and by [`EntryDraft::merge`]; exists only on
/// the client and is discarded once the entry is persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub amount: Money,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<NaiveDate>,
}

impl Default for EntryDraft {
    fn default() -> Self {
        EntryDraft {
            entry_type: EntryType::In,
            amount: Money::zero(),
            description: String::new(),
            category: None,
            payment_method: None,
            entry_date: None,
        }
    }
}

impl EntryDraft {
    /// Checks the draft before it is submitted; no network call happens on a
    /// draft that fails here.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.description.trim().is_empty() {
            return Err(DraftError::EmptyDescription);
        }
        if !self.amount.is_positive() {
            return Err(DraftError::NonPositiveAmount);
        }
        Ok(())
    }

    /// Folds a recognition result into the draft, field by field.
    ///
    /// A field the recognizer extracted overwrites the draft's value; an
    /// absent field preserves whatever is already there, including prior user
    /// edits. No field is ever cleared by an absent result.
    pub fn merge(mut self, result: &RecognitionResult) -> Self {
        if let Some(entry_type) = result.entry_type {
            self.entry_type = entry_type;
        }
        if let Some(amount) = result.amount {
            self.amount = amount;
        }
        if let Some(description) = &result.description {
            self.description = description.clone();
        }
        if let Some(category) = &result.category {
            self.category = Some(category.clone());
        }
        if let Some(payment_method) = result.payment_method {
            self.payment_method = Some(payment_method);
        }
        if let Some(entry_date) = result.entry_date {
            self.entry_date = Some(entry_date);
        }
        self
    }
}

/// Structured extraction from a receipt photo. The recognizer may supply
/// none, some, or all fields; each one is independently optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub confidence: f32,
}

impl RecognitionResult {
    /// Advisory confidence as a whole percentage; never blocks submission.
    pub fn confidence_pct(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn draft(description: &str, cents: i64) -> EntryDraft {
        EntryDraft {
            entry_type: EntryType::Out,
            amount: Money::from_cents(cents),
            description: description.to_string(),
            ..EntryDraft::default()
        }
    }

    #[test]
    fn validate_rejects_blank_description() {
        assert_eq!(draft("   ", 100).validate(), Err(DraftError::EmptyDescription));
        assert_eq!(draft("", 100).validate(), Err(DraftError::EmptyDescription));
    }

    #[test]
    fn validate_rejects_non_positive_amount() {
        assert_eq!(draft("café", 0).validate(), Err(DraftError::NonPositiveAmount));
    }

    #[test]
    fn validate_accepts_complete_draft() {
        assert!(draft("café", 450).validate().is_ok());
    }

    #[test]
    fn merge_with_empty_result_is_identity() {
        let d = draft("almoço", 1200);
        let merged = d.clone().merge(&RecognitionResult::default());
        assert_eq!(merged, d);
    }

    #[test]
    fn merge_overwrites_supplied_fields_only() {
        // A user who already typed a description keeps it when the
        // recognizer only finds an amount.
        let d = draft("almoço", 0);
        let result = RecognitionResult {
            amount: Some(Money::from_str("120.5").unwrap()),
            confidence: 0.73,
            ..RecognitionResult::default()
        };
        let merged = d.merge(&result);
        assert_eq!(merged.description, "almoço");
        assert_eq!(merged.amount.to_cents(), 12050);
        assert_eq!(result.confidence_pct(), 73);
    }

    #[test]
    fn merge_overwrites_prior_user_value_when_supplied() {
        let d = draft("velho", 100);
        let result = RecognitionResult {
            description: Some("novo".to_string()),
            ..RecognitionResult::default()
        };
        assert_eq!(d.merge(&result).description, "novo");
    }

    #[test]
    fn merge_never_clears_optional_fields() {
        let mut d = draft("mercado", 300);
        d.category = Some("alimentação".to_string());
        d.payment_method = Some(PaymentMethod::Pix);
        let merged = d.merge(&RecognitionResult::default());
        assert_eq!(merged.category.as_deref(), Some("alimentação"));
        assert_eq!(merged.payment_method, Some(PaymentMethod::Pix));
    }

    #[test]
    fn confidence_pct_clamps_out_of_range_values() {
        let r = RecognitionResult { confidence: 1.7, ..RecognitionResult::default() };
        assert_eq!(r.confidence_pct(), 100);
        let r = RecognitionResult { confidence: -0.2, ..RecognitionResult::default() };
        assert_eq!(r.confidence_pct(), 0);
    }

    #[test]
    fn draft_serializes_to_service_body() {
        let mut d = draft("fornecedor", 4590);
        d.payment_method = Some(PaymentMethod::Cash);
        d.entry_date = Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "OUT");
        assert_eq!(json["paymentMethod"], "CASH");
        assert_eq!(json["entryDate"], "2024-03-01");
        // Absent optionals are omitted, not sent as null.
        assert!(json.get("category").is_none());
    }

    #[test]
    fn recognition_result_tolerates_sparse_payload() {
        let r: RecognitionResult =
            serde_json::from_str(r#"{"amount": 120.5, "confidence": 0.73}"#).unwrap();
        assert_eq!(r.amount.unwrap().to_cents(), 12050);
        assert!(r.description.is_none());
        assert!(r.entry_type.is_none());
    }
}
