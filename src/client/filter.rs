use std::{fmt, str::FromStr};

use rust_decimal::Decimal;

use crate::expenses::repo_types::{Category, Expense, UnknownCategory};

/// The category picker: one stored category, or "all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, expense: &Expense) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => expense.category == c,
        }
    }

    pub fn apply<'a>(self, expenses: &'a [Expense]) -> impl Iterator<Item = &'a Expense> + 'a {
        expenses.iter().filter(move |e| self.matches(e))
    }

    /// Sum of the amounts that pass the filter.
    pub fn total(self, expenses: &[Expense]) -> Decimal {
        self.apply(expenses).map(|e| e.amount).sum()
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => f.write_str(c.as_str()),
        }
    }
}
