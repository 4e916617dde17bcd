//! Visibility oracles.
//!
//! # Responsibility
//! - Define the predicate projections consult to decide whether a dive is shown.
//! - Provide a keyword filter over the text fields shown in the dive list.
//!
//! # Invariants
//! - Oracles are pure: the same dive and store state give the same answer.
//! - An empty keyword query shows every dive.

use crate::model::dive::Dive;
use crate::repo::dive_repo::DiveRepository;
use regex::{Regex, RegexBuilder};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Decides whether one dive is visible.
pub trait VisibilityOracle {
    fn show_dive(&self, dive: &Dive, store: &dyn DiveRepository) -> bool;
}

impl<F> VisibilityOracle for F
where
    F: Fn(&Dive) -> bool,
{
    fn show_dive(&self, dive: &Dive, _store: &dyn DiveRepository) -> bool {
        self(dive)
    }
}

/// Oracle that shows every dive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowAll;

impl VisibilityOracle for ShowAll {
    fn show_dive(&self, _dive: &Dive, _store: &dyn DiveRepository) -> bool {
        true
    }
}

/// Filter construction error.
#[derive(Debug)]
pub enum FilterError {
    /// Raw pattern could not be compiled.
    InvalidPattern { pattern: String, message: String },
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid filter pattern `{pattern}`: {message}")
            }
        }
    }
}

impl Error for FilterError {}

/// Keyword filter options.
#[derive(Debug, Clone, Default)]
pub struct TextQuery {
    /// User query text.
    pub text: String,
    /// Whether to treat `text` as a regular expression.
    ///
    /// Default is `false` so type-as-you-search input never fails to compile.
    pub raw_pattern: bool,
}

impl TextQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw_pattern: false,
        }
    }
}

/// Case-insensitive keyword filter over location, country, buddy, suit,
/// notes, tags and the trip location.
#[derive(Debug, Clone)]
pub struct TextFilter {
    matcher: Option<Regex>,
}

impl TextFilter {
    pub fn new(query: &TextQuery) -> Result<Self, FilterError> {
        let trimmed = query.text.trim();
        if trimmed.is_empty() {
            return Ok(Self { matcher: None });
        }
        let pattern = if query.raw_pattern {
            trimmed.to_string()
        } else {
            regex::escape(trimmed)
        };
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| FilterError::InvalidPattern {
                pattern: pattern.clone(),
                message: err.to_string(),
            })?;
        Ok(Self {
            matcher: Some(matcher),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_none()
    }
}

impl VisibilityOracle for TextFilter {
    fn show_dive(&self, dive: &Dive, store: &dyn DiveRepository) -> bool {
        let Some(matcher) = &self.matcher else {
            return true;
        };

        let site = dive.site.and_then(|id| store.site(id));
        let trip = dive.trip.and_then(|id| store.trip(id));
        let site_fields = site
            .into_iter()
            .flat_map(|site| [site.name.as_str(), site.country.as_str()]);
        let trip_fields = trip.into_iter().map(|trip| trip.location.as_str());

        [dive.buddy.as_str(), dive.suit.as_str(), dive.notes.as_str()]
            .into_iter()
            .chain(dive.tags.iter().map(String::as_str))
            .chain(site_fields)
            .chain(trip_fields)
            .any(|field| matcher.is_match(field))
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterError, ShowAll, TextFilter, TextQuery, VisibilityOracle};
    use crate::model::dive::Dive;
    use crate::model::trip::DiveSite;
    use crate::repo::dive_repo::MemoryDiveRepository;

    #[test]
    fn empty_query_shows_everything() {
        let store = MemoryDiveRepository::new();
        let filter = TextFilter::new(&TextQuery::new("   ")).expect("empty query is valid");
        assert!(filter.is_empty());
        assert!(filter.show_dive(&Dive::new(0), &store));
        assert!(ShowAll.show_dive(&Dive::new(0), &store));
    }

    #[test]
    fn keyword_matches_site_name_case_insensitively() {
        let mut store = MemoryDiveRepository::new();
        let site = store.upsert_site(DiveSite::new("Blue Hole"));
        let mut dive = Dive::new(0);
        dive.site = Some(site);
        let other = Dive::new(10);

        let filter = TextFilter::new(&TextQuery::new("blue")).expect("valid query");
        assert!(filter.show_dive(&dive, &store));
        assert!(!filter.show_dive(&other, &store));
    }

    #[test]
    fn literal_query_escapes_regex_syntax() {
        let store = MemoryDiveRepository::new();
        let mut dive = Dive::new(0);
        dive.tags = vec!["c++".to_string()];
        let filter = TextFilter::new(&TextQuery::new("c++")).expect("literal query is valid");
        assert!(filter.show_dive(&dive, &store));
    }

    #[test]
    fn raw_pattern_rejects_invalid_regex() {
        let query = TextQuery {
            text: "(unclosed".to_string(),
            raw_pattern: true,
        };
        let err = TextFilter::new(&query).expect_err("invalid pattern must fail");
        assert!(matches!(err, FilterError::InvalidPattern { .. }));
    }

    #[test]
    fn closures_act_as_oracles() {
        let store = MemoryDiveRepository::new();
        let deep_only = |dive: &Dive| dive.max_depth_mm > 30_000;
        let mut dive = Dive::new(0);
        assert!(!deep_only.show_dive(&dive, &store));
        dive.max_depth_mm = 40_000;
        assert!(deep_only.show_dive(&dive, &store));
    }
}
