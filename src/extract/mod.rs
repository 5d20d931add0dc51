//! Attribute extraction from item page prose
//!
//! The wiki offers no structured feed for item stats, so everything here is
//! heuristic pattern matching over the rendered text of a page that has
//! already been classified as an item.
//!
//! # Extracted fields
//!
//! | Field | Rule |
//! |-------|------|
//! | resistances | every `[protection] ELEMENT [+/-]DIGITS %`, last match per element wins |
//! | imbuement slots | count of "empty slot" occurrences |
//! | level | first "of level N or higher" |
//! | vocations | names after "only be wielded properly by", else `ANY` |

use crate::catalog::{AttributeRecord, Element, VocationTag};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static RESISTANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:protection\s+)?(physical|fire|ice|energy|earth|death|holy)\s*([+-]?\d+)\s*%",
    )
    .expect("resistance pattern is valid")
});

static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)of level\s+(\d+)\s+or higher").expect("level pattern is valid")
});

const IMBUEMENT_SLOT_PHRASE: &str = "empty slot";
const RESTRICTION_PHRASE: &str = "only be wielded properly by";

/// Extracts an [`AttributeRecord`] from item page text
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeExtractor;

impl AttributeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts every supported attribute
    ///
    /// Never fails; fields that cannot be found take their empty/default value.
    pub fn extract(&self, page_text: &str) -> AttributeRecord {
        let lowered = page_text.to_lowercase();

        AttributeRecord {
            resistances: extract_resistances(page_text),
            imbuement_slot_count: count_imbuement_slots(&lowered),
            level_requirement: extract_level(page_text),
            vocations: extract_vocations(&lowered),
        }
    }
}

/// Scans left to right; a later match for the same element overwrites
fn extract_resistances(text: &str) -> BTreeMap<Element, i32> {
    let mut resistances = BTreeMap::new();

    for caps in RESISTANCE_RE.captures_iter(text) {
        let Some(element) = Element::from_name(&caps[1]) else {
            continue;
        };
        match caps[2].parse::<i32>() {
            Ok(value) => {
                resistances.insert(element, value);
            }
            Err(e) => {
                tracing::debug!("Ignoring out-of-range {} value '{}': {}", element, &caps[2], e);
            }
        }
    }

    resistances
}

fn count_imbuement_slots(lowered: &str) -> u32 {
    let count = lowered.matches(IMBUEMENT_SLOT_PHRASE).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn extract_level(text: &str) -> Option<u32> {
    LEVEL_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|level| *level > 0)
}

fn extract_vocations(lowered: &str) -> BTreeSet<VocationTag> {
    let Some(position) = lowered.find(RESTRICTION_PHRASE) else {
        return VocationTag::unrestricted();
    };
    let remainder = &lowered[position + RESTRICTION_PHRASE.len()..];

    let found: BTreeSet<VocationTag> = VocationTag::NAMED
        .into_iter()
        .filter(|vocation| remainder.contains(vocation.prose_name()))
        .collect();

    if found.is_empty() {
        tracing::debug!("Restriction phrase present but no known vocation followed it");
        VocationTag::unrestricted()
    } else {
        found
    }
}
