use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question/answer pair maintained by admins and read by vets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl FaqEntry {
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("General")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FaqError {
    #[error("Question and answer are required.")]
    MissingContent,
}

/// Validated FAQ creation input. New entries always start active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFaqEntry {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
}

impl NewFaqEntry {
    pub fn from_input(
        question: &str,
        answer: &str,
        category: Option<&str>,
    ) -> Result<Self, FaqError> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() || answer.is_empty() {
            return Err(FaqError::MissingContent);
        }

        Ok(NewFaqEntry {
            question: question.to_string(),
            answer: answer.to_string(),
            category: category
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
        })
    }
}
