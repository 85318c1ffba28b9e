use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::price::cents_from_input;

/// One orderable exam type with its current price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamCatalogItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExamCatalogItem {
    /// Category shown on the price table; uncategorized exams group under a
    /// catch-all bucket.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("Other Exams")
    }
}

/// Catalog admin input errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Exam name is required.")]
    MissingName,

    #[error("Exam name cannot be empty.")]
    EmptyName,

    #[error("Exam price must be a number greater than or equal to zero.")]
    InvalidPrice,

    #[error("Price must be a number greater than or equal to zero.")]
    InvalidPriceUpdate,
}

/// Validated input for creating a catalog entry. New exams always start active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExam {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: i64,
}

impl NewExam {
    pub fn from_input(
        name: &str,
        description: Option<&str>,
        category: Option<&str>,
        price: f64,
    ) -> Result<Self, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::MissingName);
        }
        let price_cents = cents_from_input(price).ok_or(CatalogError::InvalidPrice)?;

        Ok(NewExam {
            name: name.to_string(),
            description: trim_to_option(description),
            category: trim_to_option(category),
            price_cents,
        })
    }
}

/// Validated rename/description/category/active edit. Price changes go through
/// the dedicated price update instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamDetailsUpdate {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub active: bool,
}

impl ExamDetailsUpdate {
    pub fn from_input(
        name: &str,
        description: Option<&str>,
        category: Option<&str>,
        active: bool,
    ) -> Result<Self, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        Ok(ExamDetailsUpdate {
            name: name.to_string(),
            description: trim_to_option(description),
            category: trim_to_option(category),
            active,
        })
    }
}

fn trim_to_option(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
