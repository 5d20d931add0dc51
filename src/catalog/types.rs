//! Value types shared by the extractor, the catalog and the storage layer

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Damage/resistance element tracked by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Physical,
    Fire,
    Ice,
    Energy,
    Earth,
    Death,
    Holy,
}

impl Element {
    /// All elements in catalog order
    pub const ALL: [Element; 7] = [
        Self::Physical,
        Self::Fire,
        Self::Ice,
        Self::Energy,
        Self::Earth,
        Self::Death,
        Self::Holy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Fire => "fire",
            Self::Ice => "ice",
            Self::Energy => "energy",
            Self::Earth => "earth",
            Self::Death => "death",
            Self::Holy => "holy",
        }
    }

    /// Parses an element name, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|element| element.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vocation restriction tag
///
/// `Any` means the item carries no (recognised) restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VocationTag {
    Any,
    Knight,
    Paladin,
    Druid,
    Sorcerer,
    Monk,
}

impl VocationTag {
    /// Concrete vocations, in the order they are reported
    pub const NAMED: [VocationTag; 5] = [
        Self::Knight,
        Self::Paladin,
        Self::Druid,
        Self::Sorcerer,
        Self::Monk,
    ];

    /// Lowercase name as it appears in page prose
    pub fn prose_name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Knight => "knight",
            Self::Paladin => "paladin",
            Self::Druid => "druid",
            Self::Sorcerer => "sorcerer",
            Self::Monk => "monk",
        }
    }

    /// The unrestricted vocation set
    pub fn unrestricted() -> BTreeSet<VocationTag> {
        BTreeSet::from([Self::Any])
    }
}

impl fmt::Display for VocationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prose_name().to_uppercase())
    }
}

/// Equipment slot inferred from the seed page that produced a title
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SlotHint {
    Helmet,
    Armor,
    Legs,
    Boots,
    Shield,
    Offhand,
    Spellbook,
    Ring,
    Amulet,
    Quiver,
    /// Set/aggregate seed pages do not imply a slot
    #[default]
    #[serde(alias = "_set")]
    Unknown,
}

impl SlotHint {
    /// Every slot, `Unknown` last
    pub const ALL: [SlotHint; 11] = [
        Self::Helmet,
        Self::Armor,
        Self::Legs,
        Self::Boots,
        Self::Shield,
        Self::Offhand,
        Self::Spellbook,
        Self::Ring,
        Self::Amulet,
        Self::Quiver,
        Self::Unknown,
    ];

    /// Parses a slot name; `_set` reads as `Unknown`
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "_set" {
            return Some(Self::Unknown);
        }
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Helmet => "helmet",
            Self::Armor => "armor",
            Self::Legs => "legs",
            Self::Boots => "boots",
            Self::Shield => "shield",
            Self::Offhand => "offhand",
            Self::Spellbook => "spellbook",
            Self::Ring => "ring",
            Self::Amulet => "amulet",
            Self::Quiver => "quiver",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SlotHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads a slot that older data files may store as `null`
pub fn deserialize_slot<'de, D>(deserializer: D) -> Result<SlotHint, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SlotHint>::deserialize(deserializer)?.unwrap_or_default())
}

/// Attributes extracted from one item page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    /// Signed resistance percentages keyed by element
    pub resistances: BTreeMap<Element, i32>,

    /// Number of "empty slot" mentions, used as the imbuement socket count
    pub imbuement_slot_count: u32,

    /// Minimum level needed to wear the item properly
    pub level_requirement: Option<u32>,

    /// Never empty; `{Any}` when unrestricted
    pub vocations: BTreeSet<VocationTag>,
}

impl AttributeRecord {
    /// An item without resistances is not worth cataloguing
    pub fn is_catalog_worthy(&self) -> bool {
        !self.resistances.is_empty()
    }
}

/// One accepted item in the catalog
///
/// Field names on disk follow the established data file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_slot")]
    pub slot: SlotHint,

    #[serde(default)]
    pub level: Option<u32>,

    #[serde(rename = "voc", default = "VocationTag::unrestricted")]
    pub vocations: BTreeSet<VocationTag>,

    #[serde(rename = "res", default)]
    pub resistances: BTreeMap<Element, i32>,

    #[serde(rename = "imbueSlots", default)]
    pub imbuement_slot_count: u32,

    /// Canonical page URL; the dedup key
    #[serde(default)]
    pub source: String,
}

impl CatalogEntry {
    /// Builds an entry from an extracted record
    pub fn new(name: String, slot: SlotHint, source: String, record: AttributeRecord) -> Self {
        Self {
            name,
            slot,
            level: record.level_requirement,
            vocations: record.vocations,
            resistances: record.resistances,
            imbuement_slot_count: record.imbuement_slot_count,
            source,
        }
    }

    /// Identity used for deduplication
    ///
    /// Entries written without a source fall back to their name.
    pub fn dedup_key(&self) -> &str {
        let source = self.source.trim();
        if source.is_empty() {
            self.name.trim()
        } else {
            source
        }
    }
}
