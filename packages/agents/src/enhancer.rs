//! Deterministic enrichment of model proposals with census ground truth.
//!
//! Nothing in here talks to the model. Proposals are paired with census
//! rows, positioned by a [`CoordinateResolver`], deduplicated and spread
//! across recommendations.

use std::collections::BTreeSet;
use std::sync::Arc;

use accessmap_analysis_models::{BoundingBox, CensusRecord, CoordinateMode, Coordinates};
use accessmap_geocoder::pseudo::name_seed;
use accessmap_geocoder::{DemographicBias, GeocodeCache, pseudo_coordinate};

/// Pairs model-written locations with census rows.
///
/// A location matches a row when either name contains the other,
/// case-insensitively, comparing against both the full location and the
/// part before the first comma. Unmatched locations take the next row not
/// yet paired.
#[derive(Debug)]
pub struct CensusIndex<'a> {
    rows: &'a [CensusRecord],
    lowered: Vec<String>,
    used: Vec<bool>,
}

impl<'a> CensusIndex<'a> {
    #[must_use]
    pub fn new(rows: &'a [CensusRecord]) -> Self {
        Self {
            rows,
            lowered: rows.iter().map(|r| r.place.to_lowercase()).collect(),
            used: vec![false; rows.len()],
        }
    }

    fn find_match(&self, location: &str) -> Option<usize> {
        let full = location.trim().to_lowercase();
        let place = full.split(',').next().unwrap_or_default().trim().to_string();
        if place.is_empty() {
            return None;
        }

        self.lowered.iter().position(|row| {
            !row.is_empty()
                && (row.contains(&place) || place.contains(row.as_str()) || full.contains(row.as_str()))
        })
    }

    /// The census row for `location`, or `None` once every row is taken.
    pub fn pair(&mut self, location: &str) -> Option<&'a CensusRecord> {
        let index = self
            .find_match(location)
            .or_else(|| self.used.iter().position(|used| !used))?;
        self.used[index] = true;
        Some(&self.rows[index])
    }
}

/// How a run positions its records. Chosen once per run.
#[derive(Debug, Clone)]
pub enum CoordinateResolver {
    /// Look place names up through the geocode cache. Misses drop the record.
    Geocoded {
        bounds: BoundingBox,
        cache: Arc<GeocodeCache>,
    },
    /// Derive a stable point from the place name.
    Pseudo { bounds: BoundingBox },
}

impl CoordinateResolver {
    #[must_use]
    pub const fn mode(&self) -> CoordinateMode {
        match self {
            Self::Geocoded { .. } => CoordinateMode::Geocoded,
            Self::Pseudo { .. } => CoordinateMode::Pseudo,
        }
    }

    #[must_use]
    pub const fn bounds(&self) -> &BoundingBox {
        match self {
            Self::Geocoded { bounds, .. } | Self::Pseudo { bounds } => bounds,
        }
    }

    /// Position for a record at `census`'s place.
    ///
    /// Coordinates the model supplied win and are clamped into the region.
    /// Otherwise the mode decides. Returns `None` only for a geocoding miss.
    pub async fn resolve(
        &self,
        embedded: Option<Coordinates>,
        census: &CensusRecord,
    ) -> Option<Coordinates> {
        if let Some(point) = embedded {
            return Some(self.bounds().clamp(point));
        }

        match self {
            Self::Geocoded { bounds, cache } => {
                let query = census.location_label();
                let resolved = cache.resolve(&query).await.map(|p| bounds.clamp(p));
                if resolved.is_none() {
                    log::warn!("GeocodeMiss: no coordinates for '{query}', dropping record");
                }
                resolved
            }
            Self::Pseudo { bounds } => Some(pseudo_coordinate(
                &census.place,
                bounds,
                DemographicBias {
                    percent_over_65: census.percent_over_65,
                    median_income: census.median_income,
                },
            )),
        }
    }
}

/// Keeps the first item per key, preserving order.
pub fn dedupe_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut seen = BTreeSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

/// Slice of `items` assigned to the `index`th of `count` recommendations.
///
/// Each gets `max(1, n / count)` consecutive items starting at
/// `(index * per) % n`. Slices shorter than two are padded from the head
/// when more than one item exists.
#[must_use]
pub fn distribute<T: Clone>(items: &[T], index: usize, count: usize) -> Vec<T> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }

    let per = (n / count.max(1)).max(1);
    let start = (index * per) % n;
    let mut end = (start + per).min(n);
    if end <= start {
        end = n;
    }

    let mut slice = items[start..end].to_vec();
    if slice.len() < 2 && n > 1 {
        slice.extend_from_slice(&items[..2 - slice.len()]);
    }
    slice
}

/// The model's confidence when it gave a usable one, otherwise a stable
/// 0.85-0.99 value derived from the place name.
#[must_use]
pub fn gap_confidence(proposed: Option<f64>, place: &str) -> f64 {
    proposed
        .filter(|c| (0.0..=1.0).contains(c))
        .unwrap_or_else(|| 0.85 + f64::from(name_seed(place) % 15) / 100.0)
}

/// `35000.0` becomes `"$35,000"`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_dollars(amount: f64) -> String {
    let whole = amount.round().abs() as u64;
    let digits = whole.to_string();

    let mut out = String::with_capacity(digits.len() + 4);
    if amount < 0.0 && whole > 0 {
        out.push('-');
    }
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(place: &str) -> CensusRecord {
        CensusRecord {
            place: place.to_string(),
            state: "CA".to_string(),
            percent_over_65: 0.1,
            percent_disabled: 0.1,
            median_income: Some(60_000.0),
            vulnerability_score: 3.0,
        }
    }

    #[test]
    fn census_pairing_matches_then_falls_back() {
        let rows = vec![row("Fresno"), row("Oakland"), row("Los Angeles")];
        let mut index = CensusIndex::new(&rows);

        assert_eq!(index.pair("oakland, CA").unwrap().place, "Oakland");
        assert_eq!(index.pair("East Los Angeles, CA").unwrap().place, "Los Angeles");
        // no match: next unused row
        assert_eq!(index.pair("Atlantis, CA").unwrap().place, "Fresno");
        // matches may repeat
        assert_eq!(index.pair("Fresno").unwrap().place, "Fresno");
        // nothing left to pair with
        assert!(index.pair("Nowhere").is_none());
        assert!(index.pair("").is_none());
    }

    #[test]
    fn dedupe_keeps_first_and_is_idempotent() {
        let items = vec![("a", 1), ("b", 1), ("a", 1), ("a", 2)];
        let once = dedupe_by_key(items, |(loc, kind)| (*loc, *kind));
        assert_eq!(once, vec![("a", 1), ("b", 1), ("a", 2)]);
        let twice = dedupe_by_key(once.clone(), |(loc, kind)| (*loc, *kind));
        assert_eq!(once, twice);
    }

    #[test]
    fn distribution_follows_slices() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(distribute(&items, 0, 3), vec![0, 1, 2]);
        assert_eq!(distribute(&items, 2, 3), vec![6, 7, 8]);
        // (3 * 3) % 10 = 9, slice of one, padded from the head
        assert_eq!(distribute(&items, 3, 3), vec![9, 0]);
    }

    #[test]
    fn distribution_with_more_recommendations_than_items() {
        let items = vec!["a", "b", "c"];
        // per = 1; start = 4 % 3 = 1
        assert_eq!(distribute(&items, 4, 8), vec!["b", "a"]);
        assert_eq!(distribute(&["only"], 5, 2), vec!["only"]);
        assert!(distribute::<u8>(&[], 0, 1).is_empty());
    }

    #[test]
    fn confidence_is_stable_and_bounded() {
        assert!((gap_confidence(Some(0.6), "Fresno") - 0.6).abs() < f64::EPSILON);
        let derived = gap_confidence(Some(1.7), "Fresno");
        assert!((0.85..=0.99).contains(&derived));
        assert!((derived - gap_confidence(None, "Fresno")).abs() < f64::EPSILON);
    }

    #[test]
    fn dollars_are_grouped() {
        assert_eq!(format_dollars(35_000.0), "$35,000");
        assert_eq!(format_dollars(999.4), "$999");
        assert_eq!(format_dollars(1_234_567.0), "$1,234,567");
    }

    #[tokio::test]
    async fn pseudo_resolver_clamps_embedded_and_derives_missing() {
        let bounds = BoundingBox::new(32.5, 42.0, -124.4, -114.1);
        let resolver = CoordinateResolver::Pseudo { bounds };
        assert_eq!(resolver.mode(), CoordinateMode::Pseudo);

        let fresno = row("Fresno");
        let clamped = resolver
            .resolve(Some(Coordinates::new(50.0, -119.0)), &fresno)
            .await
            .unwrap();
        assert!((clamped.lat - 42.0).abs() < f64::EPSILON);

        let first = resolver.resolve(None, &fresno).await.unwrap();
        let second = resolver.resolve(None, &fresno).await.unwrap();
        assert_eq!(first, second);
        assert!(bounds.contains(first));
    }
}
