//! Collateral valuation at loan origination

use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;
use crate::gold_loan::model::PledgedItem;

/// Largest share of the collateral value that may be lent
pub const LOAN_TO_VALUE_RATIO: f64 = 0.8;

/// Appraised value of a set of pledged items
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollateralValuation {
    pub total_items_value: f64,
    pub max_loan_amount: f64,
}

impl CollateralValuation {
    /// Sum the market values of `items`
    pub fn appraise(items: &[PledgedItem]) -> Result<Self, ApiError> {
        for item in items {
            if item.weight < 0.0 {
                return Err(ApiError::ValidationError(
                    "Item weight cannot be negative".to_string(),
                ));
            }
            if item.market_value < 0.0 {
                return Err(ApiError::ValidationError(
                    "Item market value cannot be negative".to_string(),
                ));
            }
        }

        let total_items_value: f64 = items.iter().map(|i| i.market_value).sum();

        Ok(Self {
            total_items_value,
            max_loan_amount: total_items_value * LOAN_TO_VALUE_RATIO,
        })
    }

    /// Reject a loan amount above the loan-to-value ceiling
    pub fn check_loan_amount(&self, loan_amount: f64) -> Result<(), ApiError> {
        if loan_amount > self.max_loan_amount {
            return Err(ApiError::ValidationFailed {
                message: format!(
                    "Loan amount exceeds maximum allowed value ({})",
                    self.max_loan_amount
                ),
                details: json!({
                    "maxLoanAmount": self.max_loan_amount,
                    "totalItemsValue": self.total_items_value,
                    "requested": loan_amount,
                }),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gold_loan::model::PledgedItemType;

    fn item(item_type: PledgedItemType, market_value: f64) -> PledgedItem {
        PledgedItem {
            item_type,
            description: None,
            weight: 12.5,
            purity: 22.0,
            market_value,
        }
    }

    #[test]
    fn test_total_is_sum_of_market_values() {
        let valuation = CollateralValuation::appraise(&[
            item(PledgedItemType::Gold, 60_000.0),
            item(PledgedItemType::Silver, 15_000.0),
            item(PledgedItemType::Diamond, 25_000.0),
        ])
        .unwrap();

        assert_eq!(valuation.total_items_value, 100_000.0);
        assert_eq!(valuation.max_loan_amount, 80_000.0);
    }

    #[test]
    fn test_loan_at_ceiling_is_allowed() {
        let valuation = CollateralValuation::appraise(&[item(PledgedItemType::Gold, 125_000.0)]).unwrap();
        assert!(valuation.check_loan_amount(0.8 * 125_000.0).is_ok());
    }

    #[test]
    fn test_loan_above_ceiling_reports_ceiling() {
        let valuation = CollateralValuation::appraise(&[item(PledgedItemType::Gold, 125_000.0)]).unwrap();
        let err = valuation
            .check_loan_amount(0.8 * 125_000.0 + 0.01)
            .unwrap_err();

        assert!(err.to_string().contains("100000"));
        let details = err.details().cloned().unwrap();
        assert_eq!(details["maxLoanAmount"], 100_000.0);
        assert_eq!(details["totalItemsValue"], 125_000.0);
    }

    #[test]
    fn test_negative_values_rejected() {
        let mut bad = item(PledgedItemType::Gold, 1000.0);
        bad.weight = -1.0;
        assert!(CollateralValuation::appraise(&[bad]).is_err());

        assert!(CollateralValuation::appraise(&[item(PledgedItemType::Gold, -5.0)]).is_err());
    }

    #[test]
    fn test_empty_collateral_allows_only_zero() {
        let valuation = CollateralValuation::appraise(&[]).unwrap();
        assert_eq!(valuation.total_items_value, 0.0);
        assert!(valuation.check_loan_amount(0.0).is_ok());
        assert!(valuation.check_loan_amount(1.0).is_err());
    }
}
