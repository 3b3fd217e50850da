//! Region → representative coverage index.
//!
//! Derived, read-only state for map coloring and grouped lists: for every
//! region code in a representative's region set, that representative's
//! projection is appended to the region's entry. The index owns no lifecycle
//! of its own — consumers rebuild it from scratch whenever the underlying
//! collection changes, which is also what keeps it duplicate-free.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lightweight projection of a representative, as stored in the index.
///
/// `name` keeps co-assigned individuals as a single combined string
/// (e.g. `"Pat & Trina Tuel"`); splitting happens at presentation time via
/// [`split_display_names`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepCard {
    /// Combined display name, exactly as stored on the entity.
    pub name: String,
    /// The full region set the representative covers.
    pub regions: Vec<String>,
    /// Contact channel (URL, mailto, tel), if any.
    pub contact_url: Option<String>,
    /// Portrait image reference, if any.
    pub portrait: Option<String>,
}

/// Ordered mapping from region code to the representatives covering it.
/// Serializes as the bare map, keyed by region code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageIndex {
    by_region: BTreeMap<String, Vec<RepCard>>,
}

impl CoverageIndex {
    /// Build the index from a flat representative collection.
    ///
    /// Input order is preserved within each region's list. A region covered
    /// by nobody simply has no entry.
    pub fn build<I>(cards: I) -> Self
    where
        I: IntoIterator<Item = RepCard>,
    {
        let mut by_region: BTreeMap<String, Vec<RepCard>> = BTreeMap::new();
        for card in cards {
            for region in &card.regions {
                by_region
                    .entry(region.clone())
                    .or_default()
                    .push(card.clone());
            }
        }
        Self { by_region }
    }

    /// Representatives covering `region`, in collection order.
    /// Empty slice means no coverage — not an error.
    pub fn covering(&self, region: &str) -> &[RepCard] {
        self.by_region.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All covered region codes, sorted.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.by_region.keys().map(String::as_str)
    }

    /// Number of covered regions.
    pub fn len(&self) -> usize {
        self.by_region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_region.is_empty()
    }
}

/// Split a combined display name into individual names.
///
/// Names may encode multiple co-assigned individuals joined by `","` or
/// `"&"`. Pure presentation transform: it never affects identity or region
/// coverage, and applying it to an already-simple name returns that name.
pub fn split_display_names(name: &str) -> Vec<String> {
    name.split([',', '&'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(name: &str, regions: &[&str]) -> RepCard {
        RepCard {
            name: name.to_string(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            contact_url: None,
            portrait: None,
        }
    }

    #[test]
    fn each_region_gets_one_projection_per_covering_rep() {
        let index = CoverageIndex::build([
            card("Aaron", &["WA", "AK"]),
            card("Rick", &["CA", "NV"]),
            card("Pat & Trina", &["CA", "NV"]),
        ]);

        assert_eq!(index.covering("WA").len(), 1);
        let ca: Vec<_> = index.covering("CA").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(ca, ["Rick", "Pat & Trina"]);
        assert_eq!(index.covering("NV").len(), 2);
    }

    #[test]
    fn uncovered_region_has_no_entry() {
        let index = CoverageIndex::build([card("Aaron", &["WA"])]);
        assert!(index.covering("TX").is_empty());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let reps = [card("Aaron", &["WA", "AK"]), card("Todd", &["AZ", "NM", "UT"])];
        let first = CoverageIndex::build(reps.clone());
        let second = CoverageIndex::build(reps);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_collection_builds_empty_index() {
        let index = CoverageIndex::build([]);
        assert!(index.is_empty());
    }

    #[test]
    fn split_handles_commas_and_ampersands() {
        assert_eq!(split_display_names("Pat & Trina Tuel"), ["Pat", "Trina Tuel"]);
        assert_eq!(split_display_names("A, B & C"), ["A", "B", "C"]);
    }

    #[test]
    fn split_is_identity_for_simple_names() {
        assert_eq!(split_display_names("Aaron Schultz"), ["Aaron Schultz"]);
    }

    #[test]
    fn split_is_idempotent() {
        let once = split_display_names("Phil & Lilly");
        let twice: Vec<String> = once
            .iter()
            .flat_map(|n| split_display_names(n))
            .collect();
        assert_eq!(once, twice);
    }
}
