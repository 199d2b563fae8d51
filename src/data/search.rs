//! Wildcard patterns and wrap-around event search.
//!
//! Patterns use a single metacharacter: `*` matches any run of characters
//! (including none). Everything else is literal. Patterns are compiled once
//! into a regex and then matched against [`TraceEvent::full_text`].

use regex::Regex;

use super::event::TraceEvent;
use super::filter::FilterConfig;
use crate::error::PatternError;

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    /// Matches the pattern anywhere in the text.
    unanchored: Regex,
    /// Matches the pattern against the whole text.
    anchored: Regex,
}

impl WildcardPattern {
    /// Compile a wildcard pattern.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let body = wildcard_to_regex(pattern);
        let build = |re: String| {
            Regex::new(&re).map_err(|source| PatternError {
                pattern: pattern.to_string(),
                source,
            })
        };

        Ok(Self {
            source: pattern.to_string(),
            unanchored: build(body.clone())?,
            anchored: build(format!("^(?:{})$", body))?,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.unanchored.is_match(text)
    }

    /// True if the pattern spans all of `text`.
    pub fn matches_whole(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }

    /// True if the pattern occurs in the event's full text.
    pub fn matches_event(&self, event: &TraceEvent) -> bool {
        self.is_match(&event.full_text())
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Translate a wildcard pattern into regex syntax, escaping every literal run.
fn wildcard_to_regex(pattern: &str) -> String {
    pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}

/// Extract the non-wildcard literal parts of a pattern.
///
/// `"*Recovery*State*"` yields `["Recovery", "State"]`. Renderers use this
/// to highlight matched text.
pub fn literals(pattern: &str) -> Vec<&str> {
    pattern.split('*').filter(|part| !part.is_empty()).collect()
}

/// Search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

fn is_hit(event: &TraceEvent, pattern: &WildcardPattern, filter: &FilterConfig) -> bool {
    filter.matches(event) && pattern.matches_event(event)
}

/// Find the first visible match at or after `start`, wrapping to index 0.
///
/// Scans `start..len`, then `0..start`. Events rejected by `filter` are
/// skipped. Returns `None` if no visible event matches.
pub fn search_forward(
    events: &[TraceEvent],
    start: usize,
    pattern: &WildcardPattern,
    filter: &FilterConfig,
) -> Option<usize> {
    let start = start.min(events.len());
    (start..events.len())
        .chain(0..start)
        .find(|&i| is_hit(&events[i], pattern, filter))
}

/// Find the first visible match at or before `start`, wrapping to the end.
///
/// Scans `start` down to 0, then from the last index down to `start + 1`.
/// A `start` past the end begins at the last event.
pub fn search_backward(
    events: &[TraceEvent],
    start: usize,
    pattern: &WildcardPattern,
    filter: &FilterConfig,
) -> Option<usize> {
    if events.is_empty() {
        return None;
    }
    let start = start.min(events.len() - 1);
    (0..=start)
        .rev()
        .chain((start + 1..events.len()).rev())
        .find(|&i| is_hit(&events[i], pattern, filter))
}

/// Search in `direction` from `start`.
pub fn search(
    events: &[TraceEvent],
    start: usize,
    pattern: &WildcardPattern,
    filter: &FilterConfig,
    direction: Direction,
) -> Option<usize> {
    match direction {
        Direction::Forward => search_forward(events, start, pattern, filter),
        Direction::Backward => search_backward(events, start, pattern, filter),
    }
}

/// The last search, kept so it can be repeated with `n` / `N`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pattern: Option<WildcardPattern>,
    direction: Direction,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            pattern: None,
            direction: Direction::Forward,
        }
    }
}

impl SearchState {
    /// Compile `pattern` and search from just past `cursor` in `direction`.
    ///
    /// The compiled pattern is kept for [`repeat`](Self::repeat) even when
    /// nothing matches. An invalid pattern clears the search and matches
    /// nothing.
    pub fn begin(
        &mut self,
        events: &[TraceEvent],
        cursor: usize,
        pattern: &str,
        direction: Direction,
        filter: &FilterConfig,
    ) -> Option<usize> {
        self.direction = direction;
        self.pattern = WildcardPattern::compile(pattern).ok();
        self.run(events, cursor, direction, filter)
    }

    /// Repeat the last search from `cursor`.
    ///
    /// With `reverse` set, searches opposite to the original direction.
    pub fn repeat(
        &self,
        events: &[TraceEvent],
        cursor: usize,
        reverse: bool,
        filter: &FilterConfig,
    ) -> Option<usize> {
        let direction = if reverse {
            self.direction.reversed()
        } else {
            self.direction
        };
        self.run(events, cursor, direction, filter)
    }

    fn run(
        &self,
        events: &[TraceEvent],
        cursor: usize,
        direction: Direction,
        filter: &FilterConfig,
    ) -> Option<usize> {
        let pattern = self.pattern.as_ref()?;
        let start = match direction {
            Direction::Forward => cursor.saturating_add(1),
            // at the first event, the backward scan starts from the end
            Direction::Backward => cursor.checked_sub(1).unwrap_or(usize::MAX),
        };
        search(events, start, pattern, filter, direction)
    }

    /// True if a search pattern is active.
    pub fn is_active(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(WildcardPattern::as_str)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Forget the active pattern.
    pub fn clear(&mut self) {
        self.pattern = None;
    }
}
