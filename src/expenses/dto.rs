use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use time::{macros::format_description, Date};

use crate::error::{AppError, AppResult};
use crate::expenses::repo_types::{Category, ExpenseChanges, NewExpense};

pub const MAX_NAME_LEN: usize = 200;

/// Raw `POST`/`PUT /expenses` body. Kept loose so every bad field gets its
/// own message instead of a generic deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseInput {
    pub name: Option<String>,
    pub amount: Option<Value>,
    pub category: Option<String>,
    pub date: Option<String>,
}

impl ExpenseInput {
    /// Every field is required on create.
    pub fn into_new(self) -> AppResult<NewExpense> {
        Ok(NewExpense {
            name: parse_name(self.name.as_deref().ok_or_else(|| required("Name"))?)?,
            amount: parse_amount(self.amount.as_ref().ok_or_else(|| required("Amount"))?)?,
            category: parse_category(
                self.category.as_deref().ok_or_else(|| required("Category"))?,
            )?,
            date: parse_date(self.date.as_deref().ok_or_else(|| required("Date"))?)?,
        })
    }

    /// Absent fields stay untouched; present ones follow the create rules.
    pub fn into_changes(self) -> AppResult<ExpenseChanges> {
        Ok(ExpenseChanges {
            name: self.name.as_deref().map(parse_name).transpose()?,
            amount: self.amount.as_ref().map(parse_amount).transpose()?,
            category: self.category.as_deref().map(parse_category).transpose()?,
            date: self.date.as_deref().map(parse_date).transpose()?,
        })
    }
}

fn required(field: &str) -> AppError {
    AppError::invalid(format!("{field} is required"))
}

pub fn parse_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(required("Name"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::invalid(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(r"^-?\d+(?:\.(\d+))?$").unwrap();
}

fn not_a_number() -> AppError {
    AppError::invalid("Amount must be a number")
}

fn too_precise() -> AppError {
    AppError::invalid("Amount can have at most two decimal places")
}

/// Accepts a JSON number or a plain decimal string, as HTML forms send
/// strings. Precision is checked before sign.
pub fn parse_amount(raw: &Value) -> AppResult<Decimal> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Null | Value::String(_) => return Err(required("Amount")),
        _ => return Err(not_a_number()),
    };

    let amount = match AMOUNT_RE.captures(&text) {
        Some(caps) => {
            let fraction = caps.get(1).map_or("", |m| m.as_str());
            if fraction.trim_end_matches('0').len() > 2 {
                return Err(too_precise());
            }
            // Only digits got this far, so a parse failure means overflow.
            Decimal::from_str(&text).map_err(|_| AppError::invalid("Amount is too large"))?
        }
        // serde_json prints very large and very small floats with an exponent.
        None if raw.is_number() => {
            let amount = Decimal::from_scientific(&text).map_err(|_| not_a_number())?;
            if amount.normalize().scale() > 2 {
                return Err(too_precise());
            }
            amount
        }
        None => return Err(not_a_number()),
    };

    if amount <= Decimal::ZERO {
        return Err(AppError::invalid("Amount must be greater than zero"));
    }
    if amount >= Decimal::from(10_000_000_000_i64) {
        return Err(AppError::invalid("Amount is too large"));
    }
    Ok(amount)
}

pub fn parse_category(raw: &str) -> AppResult<Category> {
    if raw.trim().is_empty() {
        return Err(required("Category"));
    }
    raw.parse::<Category>().map_err(|_| {
        AppError::invalid("Category must be one of: food, transport, entertainment, utilities, other")
    })
}

pub fn parse_date(raw: &str) -> AppResult<Date> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(required("Date"));
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid("Date must be a valid YYYY-MM-DD date"))
}
