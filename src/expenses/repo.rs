use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::expenses::repo_types::{Expense, ExpenseChanges, ExpenseRow, NewExpense};

/// Expense persistence. Every method takes the owner and every statement
/// filters on it; a row owned by someone else behaves exactly like a
/// missing one.
#[async_trait]
pub trait ExpenseRepo: Send + Sync {
    /// Newest date first.
    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<Expense>>;
    async fn insert(&self, owner_id: i64, expense: &NewExpense) -> AppResult<Expense>;
    async fn update_owned(
        &self,
        owner_id: i64,
        expense_id: i64,
        changes: &ExpenseChanges,
    ) -> AppResult<Option<Expense>>;
    async fn delete_owned(&self, owner_id: i64, expense_id: i64) -> AppResult<Option<Expense>>;
}

#[derive(Clone)]
pub struct PgExpenseRepo {
    db: PgPool,
}

impl PgExpenseRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_expense(row: ExpenseRow) -> AppResult<Expense> {
    Ok(Expense::try_from(row)?)
}

#[async_trait]
impl ExpenseRepo for PgExpenseRepo {
    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<Expense>> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, user_id, name, amount, category, date
            FROM expenses
            WHERE user_id = $1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(into_expense).collect()
    }

    async fn insert(&self, owner_id: i64, expense: &NewExpense) -> AppResult<Expense> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            INSERT INTO expenses (user_id, name, amount, category, date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, amount, category, date
            "#,
        )
        .bind(owner_id)
        .bind(&expense.name)
        .bind(expense.amount)
        .bind(expense.category.as_str())
        .bind(expense.date)
        .fetch_one(&self.db)
        .await?;
        into_expense(row)
    }

    async fn update_owned(
        &self,
        owner_id: i64,
        expense_id: i64,
        changes: &ExpenseChanges,
    ) -> AppResult<Option<Expense>> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            UPDATE expenses
               SET name     = COALESCE($1, name),
                   amount   = COALESCE($2, amount),
                   category = COALESCE($3, category),
                   date     = COALESCE($4, date)
             WHERE id = $5 AND user_id = $6
            RETURNING id, user_id, name, amount, category, date
            "#,
        )
        .bind(changes.name.as_deref())
        .bind(changes.amount)
        .bind(changes.category.map(|c| c.as_str()))
        .bind(changes.date)
        .bind(expense_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_expense).transpose()
    }

    async fn delete_owned(&self, owner_id: i64, expense_id: i64) -> AppResult<Option<Expense>> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            DELETE FROM expenses
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, amount, category, date
            "#,
        )
        .bind(expense_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_expense).transpose()
    }
}
