//! Page classification
//!
//! Decides from rendered page text whether a page is a genuine equipment item.
//! Discovery deliberately over-accepts links, so this is where creature pages,
//! set overviews and disambiguation pages get rejected.

mod markers;

pub use markers::{MarkerClassifier, DEFAULT_CREATURE_MARKERS, DEFAULT_ITEM_MARKERS};

/// Outcome of classifying one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Item markers present and no creature markers
    Item,
    /// Creature markers present; these win over any item markers
    NonItem,
    /// Neither signal present
    Ambiguous,
}

impl Classification {
    /// Combines the two page signals
    ///
    /// The creature signal takes precedence: creature pages often mention
    /// "protection" in flavour text.
    pub fn from_signals(signals: PageSignals) -> Self {
        if signals.looks_like_creature {
            Self::NonItem
        } else if signals.looks_like_item {
            Self::Item
        } else {
            Self::Ambiguous
        }
    }

    /// Only `Item` is accepted; ambiguity is rejected like `NonItem`
    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item)
    }
}

/// Independent boolean signals computed from page text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageSignals {
    pub looks_like_creature: bool,
    pub looks_like_item: bool,
}

/// Classification port used by the crawl state machine
///
/// Implementations must be deterministic and must not perform I/O.
pub trait PageClassifier: Send + Sync {
    fn classify(&self, page_text: &str) -> Classification;
}
