//! Tests for the alignment primitives working together.

use glyph_anchor::align::noise::{noise_indices, retain_unremoved, tolerance};
use glyph_anchor::align::{align, search, similarity, AlignMode, AlignmentWindow, EditOp, SearchOutcome};
use glyph_anchor::coordinates::CoordinateSynthesizer;
use glyph_anchor::glyph::Glyph;
use glyph_anchor::text::{EquivalenceTable, NormalizerConfig, ScriptNormalizer};

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

mod edit_distance {
    use super::*;

    #[test]
    fn test_exact_infix_match() {
        let alignment = align(&chars("hello"), &chars("hello world"), AlignMode::Infix, &EquivalenceTable::new());
        assert_eq!(alignment.edit_distance, 0);
        assert_eq!(alignment.primary_location(), Some((0, 4)));
        assert_eq!(similarity(alignment.edit_distance, 5), 1.0);
    }

    #[test]
    fn test_equivalences_cost_nothing() {
        let table = EquivalenceTable::from_pairs(&[('m', 'n'), ('>', 'i')]);
        let alignment = align(&chars("gnoji"), &chars("xxgmoj>xx"), AlignMode::Infix, &table);
        assert_eq!(alignment.edit_distance, 0);
        assert_eq!(alignment.primary_location(), Some((2, 6)));

        let plain = align(&chars("gnoji"), &chars("xxgmoj>xx"), AlignMode::Infix, &EquivalenceTable::new());
        assert_eq!(plain.edit_distance, 2);
    }

    #[test]
    fn test_global_trace_shows_inserted_noise() {
        let alignment = align(&chars("abcdefgh"), &chars("abc###defgh"), AlignMode::Global, &EquivalenceTable::new());
        assert_eq!(alignment.edit_distance, 3);
        assert_eq!(
            alignment.trace.iter().filter(|op| **op == EditOp::Insertion).count(),
            3
        );
    }
}

mod windowed_search {
    use super::*;

    #[test]
    fn test_cursor_bounds_the_search() {
        let sequence = chars("dan dan dan");
        let target = chars("dan");
        let outcome = search(&target, &sequence, &AlignmentWindow::new(4, 1), &EquivalenceTable::new()).unwrap();
        let result = outcome.result().unwrap();
        assert_eq!(result.best_match_start, 4);
        assert_eq!(result.similarity, 1.0);
    }

    #[test]
    fn test_script_equivalence_through_lens() {
        let normalizer = ScriptNormalizer::new(NormalizerConfig {
            transliterate: true,
            ..Default::default()
        });
        let lens = normalizer.lens_for_language(Some("sr"));
        let target = lens.apply_all("Rade".chars());
        let sequence = lens.apply_all("Раде".chars());

        let outcome = search(&target, &sequence, &AlignmentWindow::new(0, 1), &EquivalenceTable::new()).unwrap();
        match outcome {
            SearchOutcome::Match(result) => {
                assert_eq!(result.similarity, 1.0);
                assert_eq!(result.range(), 0..4);
            },
            SearchOutcome::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_threshold_turns_weak_match_into_no_match() {
        let outcome = search(&chars("parlament"), &chars("xyzxyzxyz"), &AlignmentWindow::new(0, 2), &EquivalenceTable::new())
            .unwrap();
        assert_eq!(outcome.accepted(0.7), SearchOutcome::NoMatch);
    }
}

mod noise_runs {
    use super::*;
    use glyph_anchor::align::EditOp::{Insertion as I, Match as M};

    #[test]
    fn test_short_gap_confirmed_by_matches_survives() {
        let mut trace = vec![M, M, M];
        trace.extend([I, I, I]);
        trace.extend([M; 6]);
        assert!(noise_indices(&trace, tolerance(20, 5)).is_empty());
    }

    #[test]
    fn test_long_gap_with_two_matches_is_removed() {
        let mut trace = vec![M, M, M];
        trace.extend([I; 10]);
        trace.extend([M, M]);
        trace.push(EditOp::Deletion);
        trace.push(M);
        let removed = noise_indices(&trace, tolerance(20, 5));
        assert_eq!(removed, (3..13).collect::<Vec<_>>());

        let sequence: Vec<usize> = (0..16).collect();
        let kept = retain_unremoved(&sequence, &removed);
        assert_eq!(kept, vec![0, 1, 2, 13, 14, 15]);
    }

    #[test]
    fn test_filter_on_real_alignment() {
        let target = chars("abcdefgh");
        let sequence = chars("abcde##########fgh");
        let trace = align(&target, &sequence, AlignMode::Global, &EquivalenceTable::new()).trace;
        let removed = noise_indices(&trace, tolerance(target.len(), 5));
        let kept: String = retain_unremoved(&sequence, &removed).into_iter().collect();
        assert_eq!(kept, "abcdefgh");
    }
}

mod coordinates {
    use super::*;

    #[test]
    fn test_line_break_splits_span() {
        let glyphs = vec![
            Glyph::new("a", 500.0, 690.0, 505.0, 700.0, 1),
            Glyph::new("b", 40.0, 40.0, 45.0, 50.0, 1),
        ];
        let span = CoordinateSynthesizer::default().synthesize_slice(&glyphs).unwrap();
        assert!(span.is_broken);
        assert_eq!(span.corners.len(), 4);
    }

    #[test]
    fn test_small_drift_is_not_a_break() {
        let glyphs = vec![
            Glyph::new("a", 10.0, 690.0, 15.0, 700.0, 1),
            Glyph::new("b", 15.0, 691.0, 20.0, 701.0, 1),
        ];
        let span = CoordinateSynthesizer::default().synthesize_slice(&glyphs).unwrap();
        assert!(!span.is_broken);
        assert_eq!(span.corners.len(), 2);
    }

    #[test]
    fn test_pages_are_zero_based() {
        let glyphs = vec![Glyph::new("a", 10.0, 10.0, 15.0, 20.0, 1)];
        let span = CoordinateSynthesizer::default().synthesize_slice(&glyphs).unwrap();
        assert_eq!((span.from_page, span.to_page), (0, 0));
    }

    #[test]
    fn test_empty_run_has_no_span() {
        assert!(CoordinateSynthesizer::default().synthesize_slice(&[]).is_none());
    }
}
