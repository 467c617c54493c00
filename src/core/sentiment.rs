use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// News sentiment label as published by the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SentimentLabel {
    Bearish,
    SomewhatBearish,
    Neutral,
    SomewhatBullish,
    Bullish,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 5] = [
        SentimentLabel::Bearish,
        SentimentLabel::SomewhatBearish,
        SentimentLabel::Neutral,
        SentimentLabel::SomewhatBullish,
        SentimentLabel::Bullish,
    ];

    /// Label text used by the API.
    pub fn api_name(self) -> &'static str {
        match self {
            SentimentLabel::Bearish => "Bearish",
            SentimentLabel::SomewhatBearish => "Somewhat-Bearish",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::SomewhatBullish => "Somewhat-Bullish",
            SentimentLabel::Bullish => "Bullish",
        }
    }

    /// Label for a score in `[-1, 1]`:
    /// `x <= -0.35` Bearish, `-0.35 < x <= -0.15` Somewhat-Bearish,
    /// `-0.15 < x < 0.15` Neutral, `0.15 <= x < 0.35` Somewhat-Bullish,
    /// `x >= 0.35` Bullish.
    pub fn for_score(score: Decimal) -> SentimentLabel {
        if score <= dec!(-0.35) {
            SentimentLabel::Bearish
        } else if score <= dec!(-0.15) {
            SentimentLabel::SomewhatBearish
        } else if score < dec!(0.15) {
            SentimentLabel::Neutral
        } else if score < dec!(0.35) {
            SentimentLabel::SomewhatBullish
        } else {
            SentimentLabel::Bullish
        }
    }

    pub fn accepts(self, score: Decimal) -> bool {
        score >= dec!(-1) && score <= dec!(1) && SentimentLabel::for_score(score) == self
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The API is inconsistent between "-" and "_" separators.
        let normalized = s.trim().replace('_', "-");
        SentimentLabel::ALL
            .into_iter()
            .find(|l| l.api_name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| format!("unknown sentiment label: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_boundaries() {
        assert_eq!(SentimentLabel::for_score(dec!(-0.35)), SentimentLabel::Bearish);
        assert_eq!(
            SentimentLabel::for_score(dec!(-0.15)),
            SentimentLabel::SomewhatBearish
        );
        assert_eq!(SentimentLabel::for_score(dec!(0)), SentimentLabel::Neutral);
        assert_eq!(
            SentimentLabel::for_score(dec!(0.15)),
            SentimentLabel::SomewhatBullish
        );
        assert_eq!(SentimentLabel::for_score(dec!(0.35)), SentimentLabel::Bullish);
    }

    #[test]
    fn accepts_only_scores_in_range() {
        assert!(SentimentLabel::Bullish.accepts(dec!(0.5)));
        assert!(!SentimentLabel::Bullish.accepts(dec!(0.2)));
        assert!(!SentimentLabel::Bullish.accepts(dec!(1.2)));
        assert!(SentimentLabel::Neutral.accepts(dec!(-0.1)));
    }

    #[test]
    fn parses_api_spellings() {
        assert_eq!(
            "Somewhat_Bullish".parse::<SentimentLabel>(),
            Ok(SentimentLabel::SomewhatBullish)
        );
        assert_eq!(
            "Somewhat-Bearish".parse::<SentimentLabel>(),
            Ok(SentimentLabel::SomewhatBearish)
        );
    }
}
