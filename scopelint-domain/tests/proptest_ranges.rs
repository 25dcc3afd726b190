//! Property-based tests for range collapsing and finding order.
//!
//! These tests verify that:
//! - Every changed line stays covered after collapsing
//! - Ranges never start below line 1
//! - Output ranges are sorted, disjoint and separated by at least one line
//! - Finding order does not depend on the order tools reported in

use proptest::prelude::*;
use scopelint_domain::{LineExpansion, collapse, merge_findings};
use scopelint_types::{Finding, LineSet};

fn arb_lines() -> impl Strategy<Value = LineSet> {
    prop::collection::vec(1u32..500, 0..60).prop_map(|v| v.into_iter().collect())
}

fn arb_pad() -> impl Strategy<Value = LineExpansion> {
    (0i64..10).prop_map(|n| LineExpansion::new(n).unwrap())
}

proptest! {
    #[test]
    fn every_padded_line_is_covered(lines in arb_lines(), pad in arb_pad()) {
        let ranges = collapse(&lines, pad);
        for line in lines.iter() {
            let lo = line.saturating_sub(pad.get()).max(1);
            let hi = line + pad.get();
            prop_assert!(
                ranges.iter().any(|r| r.start() <= lo && hi <= r.end()),
                "line {} (padded {}-{}) not covered by {:?}", line, lo, hi, ranges
            );
        }
    }

    #[test]
    fn ranges_start_at_one_or_later(lines in arb_lines(), pad in arb_pad()) {
        for r in collapse(&lines, pad) {
            prop_assert!(r.start() >= 1);
            prop_assert!(r.start() <= r.end());
        }
    }

    #[test]
    fn ranges_are_separated(lines in arb_lines(), pad in arb_pad()) {
        let ranges = collapse(&lines, pad);
        for pair in ranges.windows(2) {
            prop_assert!(pair[0].end() + 1 < pair[1].start(), "{:?} not separated", pair);
        }
    }

    #[test]
    fn ranges_are_minimal(lines in arb_lines(), pad in arb_pad()) {
        // Every covered line lies within `pad` of some changed line, so no
        // range could be split or shrunk.
        for r in collapse(&lines, pad) {
            for covered in r.start()..=r.end() {
                prop_assert!(
                    lines.iter().any(|l| l.abs_diff(covered) <= pad.get()),
                    "line {} in {:?} is not near any changed line", covered, r
                );
            }
        }
    }

    #[test]
    fn empty_input_only_for_empty_output(lines in arb_lines(), pad in arb_pad()) {
        prop_assert_eq!(collapse(&lines, pad).is_empty(), lines.is_empty());
    }

    #[test]
    fn merge_order_is_deterministic(
        keys in prop::collection::vec((prop::option::of(1u32..50), prop::option::of(1u32..5)), 0..30)
    ) {
        let findings: Vec<Finding> = keys
            .iter()
            .map(|(line, column)| Finding {
                line: *line,
                column: *column,
                message: Some("m".to_string()),
                ..Finding::default()
            })
            .collect();
        let mut reversed = findings.clone();
        reversed.reverse();

        let a = merge_findings(vec![findings]);
        let b = merge_findings(vec![reversed]);
        let a_keys: Vec<_> = a.iter().map(Finding::sort_key).collect();
        let b_keys: Vec<_> = b.iter().map(Finding::sort_key).collect();
        prop_assert_eq!(&a_keys, &b_keys);
        prop_assert!(a_keys.windows(2).all(|w| w[0] <= w[1]));
    }
}
