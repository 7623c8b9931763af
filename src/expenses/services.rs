use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::expenses::{
    dto::ExpenseInput,
    repo::ExpenseRepo,
    repo_types::Expense,
};

/// Owner-scoped expense operations. Input is validated here, before
/// anything reaches the store.
#[derive(Clone)]
pub struct ExpenseService {
    repo: Arc<dyn ExpenseRepo>,
}

impl ExpenseService {
    pub fn new(repo: Arc<dyn ExpenseRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, owner_id: i64) -> AppResult<Vec<Expense>> {
        self.repo.list_by_owner(owner_id).await
    }

    pub async fn create(&self, owner_id: i64, input: ExpenseInput) -> AppResult<Expense> {
        let new = input.into_new()?;
        let expense = self.repo.insert(owner_id, &new).await?;
        info!(user_id = owner_id, expense_id = expense.id, "expense created");
        Ok(expense)
    }

    pub async fn update(
        &self,
        owner_id: i64,
        expense_id: i64,
        input: ExpenseInput,
    ) -> AppResult<Expense> {
        let changes = input.into_changes()?;
        match self.repo.update_owned(owner_id, expense_id, &changes).await? {
            Some(expense) => {
                info!(user_id = owner_id, expense_id, "expense updated");
                Ok(expense)
            }
            None => {
                warn!(user_id = owner_id, expense_id, "update of absent or foreign expense");
                Err(AppError::NotFound("Expense"))
            }
        }
    }

    pub async fn delete(&self, owner_id: i64, expense_id: i64) -> AppResult<Expense> {
        match self.repo.delete_owned(owner_id, expense_id).await? {
            Some(expense) => {
                info!(user_id = owner_id, expense_id, "expense deleted");
                Ok(expense)
            }
            None => {
                warn!(user_id = owner_id, expense_id, "delete of absent or foreign expense");
                Err(AppError::NotFound("Expense"))
            }
        }
    }
}
