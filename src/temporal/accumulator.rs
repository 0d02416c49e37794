// 🧮 Chrono accumulator - partially parsed date/time components
//
// Each component remembers whether its role was actually determined
// (a 4-digit year, a month name, a day > 12, a seeded token) or only
// guessed from default token order. Guessed components are "ambiguous".

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// CHRONO FIELD
// ============================================================================

/// Granularity of one component, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChronoField {
    Year,
    Month,
    Day,
    Time,
}

// ============================================================================
// COMPONENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component<T> {
    pub value: T,
    pub ambiguous: bool,
}

impl<T> Component<T> {
    pub fn resolved(value: T) -> Self {
        Component {
            value,
            ambiguous: false,
        }
    }

    pub fn ambiguous(value: T) -> Self {
        Component {
            value,
            ambiguous: true,
        }
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChronoAccumulator {
    pub year: Option<Component<i32>>,
    pub month: Option<Component<u32>>,
    pub day: Option<Component<u32>>,
    pub time: Option<Component<NaiveTime>>,

    /// Set when some of the raw text could not be understood at all
    pub rejected: bool,
}

impl ChronoAccumulator {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none() && self.time.is_none()
    }

    pub fn is_set(&self, field: ChronoField) -> bool {
        match field {
            ChronoField::Year => self.year.is_some(),
            ChronoField::Month => self.month.is_some(),
            ChronoField::Day => self.day.is_some(),
            ChronoField::Time => self.time.is_some(),
        }
    }

    /// Finest component actually set
    pub fn last_parsed(&self) -> Option<ChronoField> {
        [
            ChronoField::Time,
            ChronoField::Day,
            ChronoField::Month,
            ChronoField::Year,
        ]
        .into_iter()
        .find(|field| self.is_set(*field))
    }

    /// True when at least one set component was only guessed from token order
    pub fn is_ambiguous(&self) -> bool {
        self.year.map_or(false, |c| c.ambiguous)
            || self.month.map_or(false, |c| c.ambiguous)
            || self.day.map_or(false, |c| c.ambiguous)
            || self.time.map_or(false, |c| c.ambiguous)
    }

    /// Fill every unset field of `self` from `other`. Set fields are never touched.
    pub fn merge_absent(self, other: &ChronoAccumulator) -> ChronoAccumulator {
        ChronoAccumulator {
            year: self.year.or(other.year),
            month: self.month.or(other.month),
            day: self.day.or(other.day),
            time: self.time.or(other.time),
            rejected: self.rejected,
        }
    }

    /// Complete `self` with context from `other`.
    ///
    /// An empty accumulator takes every field of `other`. Otherwise only unset
    /// fields coarser than the finest field of `self` are filled, so a bare
    /// "2010" never picks up a month or day.
    pub fn merge_replace(self, other: &ChronoAccumulator) -> ChronoAccumulator {
        let Some(finest) = self.last_parsed() else {
            return ChronoAccumulator {
                rejected: self.rejected,
                ..other.clone()
            };
        };

        let coarser = |field: ChronoField| field < finest;
        ChronoAccumulator {
            year: self.year.or(other.year.filter(|_| coarser(ChronoField::Year))),
            month: self.month.or(other.month.filter(|_| coarser(ChronoField::Month))),
            day: self.day.or(other.day.filter(|_| coarser(ChronoField::Day))),
            time: self.time,
            rejected: self.rejected,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_accumulator(
        year: Option<i32>,
        month: Option<u32>,
        day: Option<u32>,
    ) -> ChronoAccumulator {
        ChronoAccumulator {
            year: year.map(Component::resolved),
            month: month.map(Component::resolved),
            day: day.map(Component::resolved),
            ..Default::default()
        }
    }

    fn ymd(acc: &ChronoAccumulator) -> (Option<i32>, Option<u32>, Option<u32>) {
        (
            acc.year.map(|c| c.value),
            acc.month.map(|c| c.value),
            acc.day.map(|c| c.value),
        )
    }

    #[test]
    fn test_last_parsed_is_finest_set_field() {
        assert_eq!(ChronoAccumulator::default().last_parsed(), None);
        assert_eq!(
            create_test_accumulator(Some(2010), None, None).last_parsed(),
            Some(ChronoField::Year)
        );
        assert_eq!(
            create_test_accumulator(None, Some(4), Some(17)).last_parsed(),
            Some(ChronoField::Day)
        );

        let mut with_time = create_test_accumulator(Some(1999), Some(4), Some(17));
        with_time.time = NaiveTime::from_hms_opt(12, 26, 0).map(Component::resolved);
        assert_eq!(with_time.last_parsed(), Some(ChronoField::Time));
    }

    #[test]
    fn test_ambiguity_flag() {
        let mut acc = create_test_accumulator(Some(2008), None, None);
        assert!(!acc.is_ambiguous());

        acc.day = Some(Component::ambiguous(2));
        assert!(acc.is_ambiguous());
    }

    // Per field: (self, other) in {set, absent}²

    #[test]
    fn test_merge_absent_set_set_keeps_self() {
        let merged = create_test_accumulator(Some(2011), Some(2), Some(3))
            .merge_absent(&create_test_accumulator(Some(2010), Some(5), Some(6)));
        assert_eq!(ymd(&merged), (Some(2011), Some(2), Some(3)));
    }

    #[test]
    fn test_merge_absent_set_absent_keeps_self() {
        let merged = create_test_accumulator(Some(2011), Some(2), Some(3))
            .merge_absent(&ChronoAccumulator::default());
        assert_eq!(ymd(&merged), (Some(2011), Some(2), Some(3)));
    }

    #[test]
    fn test_merge_absent_absent_set_takes_other() {
        let merged = ChronoAccumulator::default()
            .merge_absent(&create_test_accumulator(Some(2010), Some(5), Some(6)));
        assert_eq!(ymd(&merged), (Some(2010), Some(5), Some(6)));
    }

    #[test]
    fn test_merge_absent_absent_absent_stays_empty() {
        let merged = ChronoAccumulator::default().merge_absent(&ChronoAccumulator::default());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_absent_fills_finer_fields_too() {
        let mut to = ChronoAccumulator::default();
        to.time = NaiveTime::from_hms_opt(12, 52, 17).map(Component::resolved);

        let merged = to.merge_absent(&create_test_accumulator(Some(1999), Some(4), Some(17)));

        assert_eq!(ymd(&merged), (Some(1999), Some(4), Some(17)));
        assert_eq!(merged.time.map(|c| c.value), NaiveTime::from_hms_opt(12, 52, 17));
    }

    #[test]
    fn test_merge_replace_set_set_keeps_self() {
        let merged = create_test_accumulator(Some(2011), Some(2), Some(3))
            .merge_replace(&create_test_accumulator(Some(1999), Some(10), Some(1)));
        assert_eq!(ymd(&merged), (Some(2011), Some(2), Some(3)));
    }

    #[test]
    fn test_merge_replace_set_absent_keeps_self() {
        let merged = create_test_accumulator(Some(2011), None, None)
            .merge_replace(&ChronoAccumulator::default());
        assert_eq!(ymd(&merged), (Some(2011), None, None));
    }

    #[test]
    fn test_merge_replace_absent_set_fills_coarser_only() {
        // "10 March" knows month + day, lacks the year
        let merged = create_test_accumulator(None, Some(3), Some(10))
            .merge_replace(&create_test_accumulator(Some(1999), Some(10), Some(1)));
        assert_eq!(ymd(&merged), (Some(1999), Some(3), Some(10)));

        // "2010" must not inherit month/day from the atomic fields
        let merged = create_test_accumulator(Some(2010), None, None)
            .merge_replace(&create_test_accumulator(Some(1999), Some(10), Some(1)));
        assert_eq!(ymd(&merged), (Some(2010), None, None));
    }

    #[test]
    fn test_merge_replace_empty_self_takes_everything() {
        let merged = ChronoAccumulator::default()
            .merge_replace(&create_test_accumulator(Some(1999), Some(10), Some(1)));
        assert_eq!(ymd(&merged), (Some(1999), Some(10), Some(1)));
    }

    #[test]
    fn test_merge_replace_absent_absent_stays_empty() {
        let merged = ChronoAccumulator::default().merge_replace(&ChronoAccumulator::default());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merges_keep_rejected_flag_of_self() {
        let rejected = ChronoAccumulator {
            rejected: true,
            ..Default::default()
        };
        let other = create_test_accumulator(Some(1999), None, None);

        assert!(rejected.clone().merge_absent(&other).rejected);
        assert!(rejected.merge_replace(&other).rejected);
    }
}
