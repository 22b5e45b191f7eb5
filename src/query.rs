use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid since-year {0}: does not form a calendar date")]
    InvalidYear(i32),
}

/// A topical search bounded by a language filter and an optional earliest
/// year.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub term: String,
    pub lang: String,
    pub since_year: Option<i32>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, lang: impl Into<String>, since_year: Option<i32>) -> Self {
        Self {
            term: term.into(),
            lang: lang.into(),
            since_year,
        }
    }

    /// Compose the search expression: `<term> lang:<lang>`, plus
    /// ` since:<YYYY-01-01>` when an earliest year is set.
    pub fn build(&self) -> Result<String, QueryError> {
        let mut expr = format!("{} lang:{}", self.term, self.lang);
        if let Some(year) = self.since_year {
            let date = since_date(year).ok_or(QueryError::InvalidYear(year))?;
            expr.push_str(&format!(" since:{}", date.format("%Y-%m-%d")));
        }
        Ok(expr)
    }
}

/// January 1st of `year`, if `year` fits the four-digit `YYYY` form.
fn since_date(year: i32) -> Option<NaiveDate> {
    if !(1..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_term_and_lang() {
        let expr = SearchQuery::new("chatgpt datascience", "en", None)
            .build()
            .unwrap();
        assert_eq!(expr, "chatgpt datascience lang:en");
        assert_eq!(expr.matches("lang:").count(), 1);
    }

    #[test]
    fn appends_since_clause_for_valid_year() {
        let expr = SearchQuery::new("chatgpt", "en", Some(2023)).build().unwrap();
        assert_eq!(expr, "chatgpt lang:en since:2023-01-01");
        assert_eq!(expr.matches("since:").count(), 1);
    }

    #[test]
    fn respects_language_filter() {
        let expr = SearchQuery::new("chatgpt", "de", None).build().unwrap();
        assert_eq!(expr, "chatgpt lang:de");
    }

    #[test]
    fn build_is_deterministic() {
        let query = SearchQuery::new("gpt-4", "en", Some(2022));
        assert_eq!(query.build().unwrap(), query.build().unwrap());
    }

    #[test]
    fn early_years_keep_four_digits() {
        let expr = SearchQuery::new("plague", "en", Some(850)).build().unwrap();
        assert_eq!(expr, "plague lang:en since:0850-01-01");
    }

    #[test]
    fn five_digit_year_is_rejected() {
        let err = SearchQuery::new("chatgpt", "en", Some(10_000))
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidYear(10_000)));
        assert!(err.to_string().contains("10000"));
    }

    #[test]
    fn non_positive_years_are_rejected() {
        assert!(SearchQuery::new("x", "en", Some(0)).build().is_err());
        assert!(SearchQuery::new("x", "en", Some(-44)).build().is_err());
    }
}
