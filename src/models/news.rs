use super::ValidationError;
use crate::core::{RoundFields, SentimentLabel};
use chrono::NaiveDateTime;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-ticker sentiment of one news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct NewsSentiment {
    pub ticker: String,
    pub title: String,
    pub url: String,
    pub published: NaiveDateTime,
    pub label: SentimentLabel,
    #[round(dp = 6)]
    pub score: Decimal,
    #[round(dp = 6)]
    pub relevance: Decimal,
}

impl NewsSentiment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.label.accepts(self.score) {
            return Err(ValidationError::SentimentScore {
                label: self.label,
                score: self.score,
            });
        }
        Ok(())
    }
}
