use crate::error::DomainError;
use scopelint_types::{LineRange, LineSet};
use std::num::IntErrorKind;
use std::str::FromStr;

/// Number of context lines added above and below every changed line before
/// handing ranges to a fixer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineExpansion(u32);

impl LineExpansion {
    pub const NONE: LineExpansion = LineExpansion(0);

    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 0 {
            return Err(not_a_valid_expansion());
        }
        u32::try_from(value)
            .map(LineExpansion)
            .map_err(|_| expansion_too_large())
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for LineExpansion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(value) => LineExpansion::new(value),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Err(expansion_too_large()),
            Err(_) => Err(not_a_valid_expansion()),
        }
    }
}

fn not_a_valid_expansion() -> DomainError {
    DomainError::invalid_argument("fix line expansion must be a non-negative integer")
}

fn expansion_too_large() -> DomainError {
    DomainError::invalid_argument(format!(
        "fix line expansion must be at most {}",
        u32::MAX
    ))
}

/// Collapses `lines`, each padded by `pad` on both sides, into the minimal list
/// of disjoint ranges covering them.
///
/// Ranges that overlap or touch after padding are merged, so consecutive
/// output ranges are always separated by at least one uncovered line. Lower
/// bounds are clamped at line 1.
pub fn collapse(lines: &LineSet, pad: LineExpansion) -> Vec<LineRange> {
    let pad = pad.get();
    let mut ranges = Vec::new();
    let mut open: Option<(u32, u32)> = None;

    for line in lines.iter() {
        let lo = line.saturating_sub(pad).max(1);
        let hi = line.saturating_add(pad);
        open = match open {
            Some((start, end)) if lo > end.saturating_add(1) => {
                ranges.extend(LineRange::new(start, end));
                Some((lo, hi))
            }
            Some((start, end)) => Some((start, end.max(hi))),
            None => Some((lo, hi)),
        };
    }
    if let Some((start, end)) = open {
        ranges.extend(LineRange::new(start, end));
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(ranges: &[LineRange]) -> Vec<(u32, u32)> {
        ranges.iter().map(|r| (r.start(), r.end())).collect()
    }

    fn pad(n: i64) -> LineExpansion {
        LineExpansion::new(n).unwrap()
    }

    #[test]
    fn single_line_padded() {
        assert_eq!(pairs(&collapse(&LineSet::from([5]), pad(1))), vec![(4, 6)]);
    }

    #[test]
    fn touching_padded_ranges_merge() {
        assert_eq!(
            pairs(&collapse(&LineSet::from([5, 6, 8]), pad(1))),
            vec![(4, 9)]
        );
    }

    #[test]
    fn lower_bound_clamped_at_one() {
        assert_eq!(pairs(&collapse(&LineSet::from([1]), pad(2))), vec![(1, 3)]);
    }

    #[test]
    fn empty_input_yields_no_ranges() {
        assert!(collapse(&LineSet::new(), pad(1)).is_empty());
    }

    #[test]
    fn adjacent_lines_merge_without_padding() {
        assert_eq!(
            pairs(&collapse(&LineSet::from([3, 4, 9]), LineExpansion::NONE)),
            vec![(3, 4), (9, 9)]
        );
    }

    #[test]
    fn lines_one_apart_stay_separate_without_padding() {
        assert_eq!(
            pairs(&collapse(&LineSet::from([2, 4]), LineExpansion::NONE)),
            vec![(2, 2), (4, 4)]
        );
    }

    #[test]
    fn huge_lines_do_not_overflow() {
        assert_eq!(
            pairs(&collapse(&LineSet::from([u32::MAX - 1, u32::MAX]), pad(5))),
            vec![(u32::MAX - 6, u32::MAX)]
        );
    }

    #[test]
    fn negative_expansion_rejected() {
        let err = LineExpansion::new(-1).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument { .. }));
    }

    #[test]
    fn oversized_expansion_has_its_own_message() {
        let too_large = format!("fix line expansion must be at most {}", u32::MAX);

        let err = LineExpansion::new(i64::from(u32::MAX) + 1).unwrap_err();
        assert!(err.to_string().contains(&too_large));

        let err = "99999999999999999999".parse::<LineExpansion>().unwrap_err();
        assert!(err.to_string().contains(&too_large));

        let err = "-99999999999999999999".parse::<LineExpansion>().unwrap_err();
        assert!(err.to_string().contains("non-negative"));

        assert_eq!(LineExpansion::new(i64::from(u32::MAX)).unwrap().get(), u32::MAX);
    }

    #[test]
    fn expansion_parses_from_str() {
        assert_eq!("3".parse::<LineExpansion>().unwrap().get(), 3);
        assert_eq!(" 0 ".parse::<LineExpansion>().unwrap(), LineExpansion::NONE);
        assert!("-2".parse::<LineExpansion>().is_err());
        assert!("two".parse::<LineExpansion>().is_err());
        assert!("1.5".parse::<LineExpansion>().is_err());
    }
}
