//! In-process stores behind `AppState::in_memory`, used by the unit and HTTP
//! tests. They honor the same uniqueness and ownership rules as the Postgres
//! schema.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::repo::{UserRepo, EMAIL_TAKEN, USERNAME_TAKEN};
use crate::auth::repo_types::{NewUser, User};
use crate::error::{AppError, AppResult};
use crate::expenses::repo::ExpenseRepo;
use crate::expenses::repo_types::{Expense, ExpenseChanges, NewExpense};

fn lock<T>(m: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("in-memory store lock poisoned")))
}

struct Table<T> {
    rows: Vec<T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub struct MemoryUserRepo {
    table: Mutex<Table<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let table = lock(&self.table)?;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let table = lock(&self.table)?;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut table = lock(&self.table)?;
        if table.rows.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        if table.rows.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }
        let created = User {
            id: table.next_id(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        table.rows.push(created.clone());
        Ok(created)
    }
}

#[derive(Default)]
pub struct MemoryExpenseRepo {
    table: Mutex<Table<Expense>>,
}

#[async_trait]
impl ExpenseRepo for MemoryExpenseRepo {
    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<Expense>> {
        let table = lock(&self.table)?;
        let mut owned: Vec<Expense> = table
            .rows
            .iter()
            .filter(|e| e.user_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn insert(&self, owner_id: i64, expense: &NewExpense) -> AppResult<Expense> {
        let mut table = lock(&self.table)?;
        let created = Expense {
            id: table.next_id(),
            user_id: owner_id,
            name: expense.name.clone(),
            amount: expense.amount,
            category: expense.category,
            date: expense.date,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn update_owned(
        &self,
        owner_id: i64,
        expense_id: i64,
        changes: &ExpenseChanges,
    ) -> AppResult<Option<Expense>> {
        let mut table = lock(&self.table)?;
        Ok(table
            .rows
            .iter_mut()
            .find(|e| e.id == expense_id && e.user_id == owner_id)
            .map(|e| {
                changes.apply_to(e);
                e.clone()
            }))
    }

    async fn delete_owned(&self, owner_id: i64, expense_id: i64) -> AppResult<Option<Expense>> {
        let mut table = lock(&self.table)?;
        let pos = table
            .rows
            .iter()
            .position(|e| e.id == expense_id && e.user_id == owner_id);
        Ok(pos.map(|i| table.rows.remove(i)))
    }
}
