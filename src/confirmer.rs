//! Multi-timeframe regime confirmation
//!
//! A thin signal that only shows up at one sampling granularity is usually an
//! aggregation artifact. The confirmer classifies each timeframe on its own
//! and reports how many agree with the majority label.

use crate::classifier::RegimeClassifier;
use crate::profile::HistoricalProfile;
use crate::types::{Observation, RegimeLabel, RegimeResult, Timeframe};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-timeframe labels and their agreement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confirmation {
    pub per_timeframe: BTreeMap<Timeframe, RegimeLabel>,
    pub details: BTreeMap<Timeframe, RegimeResult>,
    /// Most common label; None when no timeframe could be classified
    pub majority: Option<RegimeLabel>,
    /// Fraction of timeframes whose label equals the majority, in [0, 1]
    pub agreement: f64,
}

impl Confirmation {
    pub fn is_confirmed(&self, min_agreement: f64) -> bool {
        self.majority.is_some() && self.agreement >= min_agreement
    }
}

#[derive(Debug, Clone, Default)]
pub struct MultiTimeframeConfirmer {
    classifier: RegimeClassifier,
}

impl MultiTimeframeConfirmer {
    pub fn new(classifier: RegimeClassifier) -> Self {
        Self { classifier }
    }

    /// Classify every timeframe present in both maps and reduce to agreement
    pub fn confirm(
        &self,
        observations_by_timeframe: &BTreeMap<Timeframe, Observation>,
        profiles_by_timeframe: &BTreeMap<Timeframe, HistoricalProfile>,
    ) -> Confirmation {
        let mut per_timeframe = BTreeMap::new();
        let mut details = BTreeMap::new();

        for (timeframe, observation) in observations_by_timeframe {
            let Some(profile) = profiles_by_timeframe.get(timeframe) else {
                warn!("No profile for timeframe {}, skipping", timeframe);
                continue;
            };
            let result = self.classifier.classify(observation, profile);
            debug!("Timeframe {}: {}", timeframe, result);
            per_timeframe.insert(*timeframe, result.regime);
            details.insert(*timeframe, result);
        }

        let (majority, agreement) = majority_label(&per_timeframe);
        Confirmation {
            per_timeframe,
            details,
            majority,
            agreement,
        }
    }
}

/// Majority label and the fraction of timeframes matching it.
///
/// Ties go to the label reported by the narrowest timeframe among the tied
/// labels (map iteration is narrowest first).
pub fn majority_label(labels: &BTreeMap<Timeframe, RegimeLabel>) -> (Option<RegimeLabel>, f64) {
    if labels.is_empty() {
        return (None, 0.0);
    }

    let mut counts: BTreeMap<RegimeLabel, usize> = BTreeMap::new();
    for label in labels.values() {
        *counts.entry(*label).or_insert(0) += 1;
    }
    let top = counts.values().copied().max().unwrap_or(0);

    let majority = labels
        .values()
        .find(|label| counts.get(*label).copied() == Some(top))
        .copied();

    (majority, top as f64 / labels.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::week_with_wide_hour_three;
    use crate::types::{Category, MS_PER_HOUR};

    fn labels(pairs: &[(Timeframe, RegimeLabel)]) -> BTreeMap<Timeframe, RegimeLabel> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_unanimous_agreement_is_one() {
        let (majority, agreement) = majority_label(&labels(&[
            (Timeframe::M15, RegimeLabel::Thin),
            (Timeframe::H1, RegimeLabel::Thin),
            (Timeframe::H4, RegimeLabel::Thin),
        ]));
        assert_eq!(majority, Some(RegimeLabel::Thin));
        assert_eq!(agreement, 1.0);
    }

    #[test]
    fn test_one_dissenter_of_three() {
        let (majority, agreement) = majority_label(&labels(&[
            (Timeframe::M15, RegimeLabel::VeryThin),
            (Timeframe::H1, RegimeLabel::Normal),
            (Timeframe::H4, RegimeLabel::Normal),
        ]));
        assert_eq!(majority, Some(RegimeLabel::Normal));
        assert!((agreement - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_tie_goes_to_narrowest_timeframe() {
        let (majority, agreement) = majority_label(&labels(&[
            (Timeframe::H4, RegimeLabel::Normal),
            (Timeframe::M15, RegimeLabel::Thin),
        ]));
        assert_eq!(majority, Some(RegimeLabel::Thin));
        assert_eq!(agreement, 0.5);

        // three-way split: every label ties, narrowest wins
        let (majority, _) = majority_label(&labels(&[
            (Timeframe::M15, RegimeLabel::Thick),
            (Timeframe::H1, RegimeLabel::VeryThin),
            (Timeframe::H4, RegimeLabel::Normal),
        ]));
        assert_eq!(majority, Some(RegimeLabel::Thick));
    }

    #[test]
    fn test_empty_has_no_majority() {
        let (majority, agreement) = majority_label(&BTreeMap::new());
        assert_eq!(majority, None);
        assert_eq!(agreement, 0.0);
    }

    #[test]
    fn test_confirm_skips_timeframes_without_profile() {
        let history = week_with_wide_hour_three();
        let profile = HistoricalProfile::for_market("m", Category::Other, &history, 0);
        let wide = Observation {
            timestamp_ms: 3 * MS_PER_HOUR,
            spread: 400.0,
            mid_price: 10_000.0,
            bid_depth: 500.0,
            ask_depth: 500.0,
        };

        let observations: BTreeMap<_, _> = [
            (Timeframe::M15, wide),
            (Timeframe::H1, wide),
            (Timeframe::H4, Observation { spread: 100.0, ..wide }),
            (Timeframe::D1, wide),
        ]
        .into_iter()
        .collect();
        let profiles: BTreeMap<_, _> = [
            (Timeframe::M15, profile.clone()),
            (Timeframe::H1, profile.clone()),
            (Timeframe::H4, profile),
        ]
        .into_iter()
        .collect();

        let confirmation = MultiTimeframeConfirmer::default().confirm(&observations, &profiles);

        assert_eq!(confirmation.per_timeframe.len(), 3);
        assert!(!confirmation.per_timeframe.contains_key(&Timeframe::D1));
        assert_eq!(confirmation.per_timeframe[&Timeframe::H4], RegimeLabel::Normal);
        assert_eq!(confirmation.majority, Some(RegimeLabel::VeryThin));
        assert!((confirmation.agreement - 2.0 / 3.0).abs() < 1e-12);
        assert!(confirmation.is_confirmed(0.6));
        assert!(!confirmation.is_confirmed(0.9));
    }
}
