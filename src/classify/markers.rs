//! Marker-based classifier
//!
//! Each signal is a case-insensitive alternation of literal marker phrases,
//! anchored on word boundaries where the phrase begins or ends with a word
//! character.

use crate::classify::{Classification, PageClassifier, PageSignals};
use regex::{Regex, RegexBuilder};

/// Terms that show up in creature metadata boxes
pub const DEFAULT_CREATURE_MARKERS: &[&str] =
    &["Hitpoints", "Experience Points", "Bestiary", "Creature"];

/// Terms that show up on equipment pages
pub const DEFAULT_ITEM_MARKERS: &[&str] = &[
    "Imbuement",
    "Imbuements",
    "It weighs",
    "You see",
    "Arm:",
    "Protection",
];

/// Classifier driven by two marker lists
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    creature: Regex,
    item: Regex,
}

impl MarkerClassifier {
    /// Builds a classifier from custom marker lists
    ///
    /// Markers are literal phrases; regex metacharacters are escaped.
    pub fn new<S: AsRef<str>>(
        creature_markers: &[S],
        item_markers: &[S],
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            creature: build_pattern(creature_markers)?,
            item: build_pattern(item_markers)?,
        })
    }

    /// Computes both signals for a page
    pub fn signals(&self, page_text: &str) -> PageSignals {
        PageSignals {
            looks_like_creature: self.creature.is_match(page_text),
            looks_like_item: self.item.is_match(page_text),
        }
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CREATURE_MARKERS, DEFAULT_ITEM_MARKERS)
            .expect("built-in markers are valid literals")
    }
}

impl PageClassifier for MarkerClassifier {
    fn classify(&self, page_text: &str) -> Classification {
        Classification::from_signals(self.signals(page_text))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Turns a marker list into one alternation
///
/// An empty list yields a pattern that never matches.
fn build_pattern<S: AsRef<str>>(markers: &[S]) -> Result<Regex, regex::Error> {
    let alternatives: Vec<String> = markers
        .iter()
        .map(|m| m.as_ref().trim())
        .filter(|m| !m.is_empty())
        .map(|marker| {
            let mut part = String::new();
            if marker.chars().next().is_some_and(is_word_char) {
                part.push_str(r"\b");
            }
            part.push_str(&regex::escape(marker));
            if marker.chars().last().is_some_and(is_word_char) {
                part.push_str(r"\b");
            }
            part
        })
        .collect();

    let pattern = if alternatives.is_empty() {
        // matches nothing
        r"\b\B".to_string()
    } else {
        format!("(?:{})", alternatives.join("|"))
    };

    RegexBuilder::new(&pattern).case_insensitive(true).build()
}
