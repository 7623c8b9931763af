use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    expenses::{dto::ExpenseInput, repo_types::Expense},
    state::AppState,
};

pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
}

// Anything that is not an id cannot name one of the caller's expenses.
fn expense_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound("Expense"))
}

#[instrument(skip(state))]
pub async fn list_expenses(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Expense>>> {
    Ok(Json(state.expenses.list(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_expense(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ExpenseInput>, JsonRejection>,
) -> AppResult<(StatusCode, HeaderMap, Json<Expense>)> {
    let Json(payload) = payload?;
    let expense = state.expenses.create(user_id, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/expenses/{}", expense.id)) {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(expense)))
}

#[instrument(skip(state, payload))]
pub async fn update_expense(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ExpenseInput>, JsonRejection>,
) -> AppResult<Json<Expense>> {
    let id = expense_id(&id)?;
    let Json(payload) = payload?;
    Ok(Json(state.expenses.update(user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_expense(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Expense>> {
    let id = expense_id(&id)?;
    Ok(Json(state.expenses.delete(user_id, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ids() {
        assert_eq!(expense_id("12").unwrap(), 12);
        assert!(matches!(expense_id("abc"), Err(AppError::NotFound("Expense"))));
        assert!(matches!(expense_id("1; DROP TABLE"), Err(AppError::NotFound(_))));
    }
}
