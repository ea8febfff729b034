//! Building idempotent expense creation requests

use crate::traits::*;
use crate::types::*;

/// Creation method recorded on every expense this tool creates
pub const CREATION_METHOD: &str = "quickadd";

/// Builder for an [`ExpenseRequest`] from a bank transaction
#[derive(Debug)]
pub struct ExpenseRequestBuilder {
    request: ExpenseRequest,
    cost: ReconcileResult<MinorUnits>,
    plan: Option<SplitPlan>,
}

impl ExpenseRequestBuilder {
    /// Start from a transaction: cost, currency, description, date and marker
    pub fn new(transaction: &Transaction) -> Self {
        Self {
            request: ExpenseRequest {
                cost: 0,
                currency: transaction.currency.clone(),
                description: transaction.description.clone(),
                group_id: UNGROUPED,
                details: marker_for(&transaction.id),
                date: transaction.created,
                payment: false,
                creation_method: CREATION_METHOD.to_string(),
                users: Vec::new(),
            },
            cost: transaction.cost(),
            plan: None,
        }
    }

    /// Set the target group (`0` for ungrouped)
    pub fn group(mut self, group_id: GroupId) -> Self {
        self.request.group_id = group_id;
        self
    }

    /// Use this split plan for the per-user shares
    pub fn split(mut self, plan: SplitPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Build and validate with the default rules
    pub fn build(self) -> ReconcileResult<ExpenseRequest> {
        self.build_with(&DefaultExpenseValidator)
    }

    /// Build and validate with a custom validator
    pub fn build_with(mut self, validator: &dyn ExpenseValidator) -> ReconcileResult<ExpenseRequest> {
        self.request.cost = self.cost?;
        let plan = self
            .plan
            .ok_or_else(|| ReconcileError::InvalidSplit("No split plan provided".to_string()))?;

        if plan.total != self.request.cost {
            return Err(ReconcileError::InvalidSplit(format!(
                "Split total {} does not match cost {}",
                plan.total, self.request.cost
            )));
        }

        self.request.users = plan
            .shares
            .iter()
            .map(|share| UserShare {
                user_id: share.user_id,
                paid_share: if share.user_id == plan.payer {
                    plan.total
                } else {
                    0
                },
                owed_share: share.owed,
            })
            .collect();

        validator.validate_request(&self.request)?;
        Ok(self.request)
    }
}
