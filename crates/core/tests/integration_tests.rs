//! Integration tests for binpack-core.

use binpack_core::{
    items_from_sizes, lower_bound, Algorithm, BinCollection, BinPacker, Config, CspConfig,
    CspEncoding, Error, Item, PackingList, PackingSummary, Size, VariableSelection,
};
use serde::Deserialize;

fn bin_sizes(collection: &BinCollection) -> Vec<Vec<Size>> {
    collection
        .bins()
        .iter()
        .map(|bin| bin.items().iter().map(|item| item.size()).collect())
        .collect()
}

fn solve(capacity: Size, sizes: &[Size], algorithm: Algorithm) -> BinCollection {
    let list = PackingList::from_sizes(capacity, sizes.iter().copied(), algorithm);
    let collection = BinPacker::default().solve(&list).unwrap();
    assert!(collection.is_valid_packing_of(&list.items));
    collection
}

mod heuristic_tests {
    use super::*;

    const SIZES: [Size; 7] = [6, 5, 4, 3, 2, 2, 1];

    #[test]
    fn test_next_fit_fixture() {
        let bins = solve(10, &SIZES, Algorithm::NextFit);
        assert_eq!(bin_sizes(&bins), vec![vec![6], vec![5, 4], vec![3, 2, 2, 1]]);
    }

    #[test]
    fn test_first_fit_fixture() {
        for algorithm in [Algorithm::FirstFit, Algorithm::FirstFitDecreasing] {
            let bins = solve(10, &SIZES, algorithm);
            assert_eq!(
                bin_sizes(&bins),
                vec![vec![6, 3], vec![5, 4], vec![2, 2, 1]],
                "{algorithm}"
            );
        }
    }

    #[test]
    fn test_best_fit_fixture() {
        for algorithm in [Algorithm::BestFit, Algorithm::BestFitDecreasing] {
            let bins = solve(10, &SIZES, algorithm);
            assert_eq!(
                bin_sizes(&bins),
                vec![vec![6, 4], vec![5, 3, 2], vec![2, 1]],
                "{algorithm}"
            );
        }
    }

    #[test]
    fn test_mffd_fixture() {
        let bins = solve(10, &SIZES, Algorithm::ModifiedFirstFitDecreasing);
        assert_eq!(bin_sizes(&bins), vec![vec![6, 4], vec![5, 3, 2], vec![2, 1]]);
    }

    #[test]
    fn test_decreasing_variants_sort_input() {
        let shuffled = [1, 4, 2, 6, 3, 2, 5];
        let bins = solve(10, &shuffled, Algorithm::FirstFitDecreasing);
        assert_eq!(bin_sizes(&bins), vec![vec![6, 3], vec![5, 4], vec![2, 2, 1]]);
    }

    #[test]
    fn test_empty_item_list() {
        for algorithm in Algorithm::HEURISTICS {
            let bins = solve(10, &[], algorithm);
            assert_eq!(bins.total_bins(), 0, "{algorithm}");
        }
    }

    #[test]
    fn test_empty_item_list_without_compaction() {
        let packer = BinPacker::new(Config::new().with_compact_bins(false));

        let list = PackingList::from_sizes(10, [], Algorithm::ModifiedFirstFitDecreasing);
        assert_eq!(packer.solve(&list).unwrap().total_bins(), 0);

        // item-by-item rules keep their initial bin
        let list = list.with_algorithm(Algorithm::FirstFit);
        assert_eq!(packer.solve(&list).unwrap().total_bins(), 1);
    }

    #[test]
    fn test_items_equal_to_capacity() {
        for algorithm in Algorithm::HEURISTICS {
            let bins = solve(10, &[10, 10, 10], algorithm);
            assert_eq!(bins.total_bins(), 3, "{algorithm}");
            assert!(bins.bins().iter().all(|bin| bin.remaining() == 0));
        }
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn test_rejects_oversized_item() {
        let list = PackingList::from_sizes(10, [3, 11], Algorithm::BestFit);
        assert_eq!(
            BinPacker::default().solve(&list),
            Err(Error::ItemTooLarge {
                index: 1,
                size: 11,
                capacity: 10
            })
        );
    }

    #[test]
    fn test_rejects_count_mismatch() {
        let mut list = PackingList::from_sizes(10, [3, 4], Algorithm::NextFit);
        list.count = 3;
        let err = BinPacker::default().solve(&list).unwrap_err();
        assert_eq!(
            err,
            Error::ItemCountMismatch {
                declared: 3,
                actual: 2
            }
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_unknown_algorithm_name() {
        assert_eq!(
            "WorstFit".parse::<Algorithm>(),
            Err(Error::UnknownAlgorithm("WorstFit".to_string()))
        );
    }

    #[test]
    fn test_constraint_programming_needs_lower_bound() {
        let list = PackingList::from_sizes(10, [3, 4], Algorithm::ConstraintProgramming);
        assert_eq!(
            BinPacker::default().solve(&list),
            Err(Error::MissingLowerBound)
        );
    }
}

mod constraint_tests {
    use super::*;

    const TIGHT: [Size; 8] = [7, 5, 4, 4, 3, 3, 2, 2];

    fn tight_list() -> PackingList {
        PackingList::from_sizes(10, TIGHT, Algorithm::ConstraintProgramming)
            .with_computed_lower_bound()
            .unwrap()
    }

    #[test]
    fn test_lower_bound_beats_first_fit_decreasing() {
        let list = tight_list();
        assert_eq!(list.lower_bound, Some(3));

        let ffd = BinPacker::default()
            .solve(&list.clone().with_algorithm(Algorithm::FirstFitDecreasing))
            .unwrap();
        assert_eq!(ffd.total_bins(), 4);
    }

    #[test]
    fn test_both_encodings_reach_lower_bound() {
        let list = tight_list();
        for encoding in [CspEncoding::Placement, CspEncoding::Indicator] {
            let config = Config::new().with_csp(CspConfig::new().with_encoding(encoding));
            let bins = BinPacker::new(config).solve(&list).unwrap();
            assert_eq!(bins.total_bins(), 3, "{encoding:?}");
            assert_eq!(bins.used_bins(), 3, "{encoding:?}");
            assert!(bins.is_valid_packing_of(&list.items));
        }
    }

    #[test]
    fn test_minimum_remaining_values() {
        let config = Config::new().with_csp(
            CspConfig::new().with_variable_selection(VariableSelection::MinimumRemainingValues),
        );
        let bins = BinPacker::new(config).solve(&tight_list()).unwrap();
        assert_eq!(bins.total_bins(), 3);
    }

    #[test]
    fn test_too_small_bound_is_unsatisfiable() {
        let list = tight_list().with_lower_bound(2);
        for encoding in [CspEncoding::Placement, CspEncoding::Indicator] {
            let config = Config::new().with_csp(CspConfig::new().with_encoding(encoding));
            let err = BinPacker::new(config).solve(&list).unwrap_err();
            assert_eq!(err, Error::Unsatisfiable { bins: 2 });
            assert!(!err.is_configuration());
        }
    }

    #[test]
    fn test_slack_adds_bins_that_compaction_removes() {
        let config = Config::new().with_csp(CspConfig::new().with_bin_slack(1.5));
        let bins = BinPacker::new(config).solve(&tight_list()).unwrap();
        assert!(bins.total_bins() <= 5);
        assert!(bins.bins().iter().all(|bin| !bin.is_empty()));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        // 13 items of 4 cannot share 6 bins; the search would run long
        let list = PackingList::from_sizes(10, [4; 13], Algorithm::ConstraintProgramming)
            .with_lower_bound(6);
        let config = Config::new().with_csp(CspConfig::new().with_symmetry_breaking(false));
        let packer = BinPacker::new(config);

        std::thread::scope(|scope| {
            let handle = scope.spawn(|| packer.solve(&list));
            // solve clears the flag on entry, so keep raising it
            while !handle.is_finished() {
                packer.cancel();
                std::thread::sleep(std::time::Duration::from_millis(5));
            }
            let result = handle.join().unwrap();
            assert_eq!(result, Err(Error::Unsatisfiable { bins: 6 }));
        });
    }
}

mod reference_tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct ReferenceInstance {
        capacity: Size,
        count: usize,
        items: Vec<Size>,
        lower_bound: usize,
    }

    fn load() -> ReferenceInstance {
        let text = include_str!("fixtures/reference_lb57.json");
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_reference_lower_bound() {
        let reference = load();
        assert_eq!(reference.items.len(), reference.count);
        let items: Vec<Item> = items_from_sizes(reference.items.iter().copied());
        assert_eq!(lower_bound(&items, reference.capacity), Ok(57));
        assert_eq!(reference.lower_bound, 57);
    }

    #[test]
    fn test_reference_heuristics() {
        let reference = load();
        let expected = [
            (Algorithm::NextFit, 79),
            (Algorithm::FirstFit, 65),
            (Algorithm::FirstFitDecreasing, 58),
            (Algorithm::BestFit, 61),
            (Algorithm::BestFitDecreasing, 58),
            (Algorithm::ModifiedFirstFitDecreasing, 58),
        ];
        for (algorithm, bins) in expected {
            let collection = solve(reference.capacity, &reference.items, algorithm);
            assert_eq!(collection.total_bins(), bins, "{algorithm}");

            let summary = PackingSummary::new(&collection, Some(reference.lower_bound));
            assert_eq!(summary.gap, Some(bins - 57));
            assert_eq!(summary.total_usage, 5529);
        }
    }
}
