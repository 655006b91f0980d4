//! Turns a folder size into the list of page requests to make.
//!
//! Ordered feeds read the first `min(T, N)` items as consecutive pages.
//! Randomized feeds pick `N` distinct positions out of `T` uniformly and
//! cover them with as few windows as a greedy left-to-right pass allows,
//! keeping only the picked positions from each window.

use rand::Rng;

/// Upstream maximum for the `limit` parameter of a folder page.
pub const MAX_PER_REQUEST_LIMIT: usize = 24;

pub const DEFAULT_DISPLAY_CAP: usize = 250;

/// Which positions of a fetched window end up in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepPositions {
    All,
    /// Relative positions, ascending.
    Only(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub offset: usize,
    pub limit: usize,
    pub keep: KeepPositions,
}

impl QueryWindow {
    /// Relative positions to keep, clamped to the number of results returned.
    pub fn kept_positions(&self, returned: usize) -> Vec<usize> {
        match &self.keep {
            KeepPositions::All => (0..returned.min(self.limit)).collect(),
            KeepPositions::Only(positions) => positions
                .iter()
                .copied()
                .filter(|&p| p < returned)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    /// Maximum items shown for one folder (`N`).
    pub display_cap: usize,
    /// Maximum items per upstream request (`L`).
    pub per_request_limit: usize,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            display_cap: DEFAULT_DISPLAY_CAP,
            per_request_limit: MAX_PER_REQUEST_LIMIT,
        }
    }
}

/// Plan the windows needed to show a folder of `total_items` items.
///
/// Returns no windows for an empty folder.
pub fn plan_queries<R: Rng + ?Sized>(
    total_items: usize,
    limits: PlanLimits,
    randomize: bool,
    rng: &mut R,
) -> Vec<QueryWindow> {
    let per_request = limits.per_request_limit.max(1);
    if !randomize || total_items <= limits.display_cap {
        return plan_consecutive(total_items.min(limits.display_cap), per_request);
    }
    let picked = pick_positions(total_items, limits.display_cap, rng);
    coalesce(&picked, per_request)
}

/// Consecutive pages covering `0..count`, all full except possibly the last.
pub fn plan_consecutive(count: usize, per_request_limit: usize) -> Vec<QueryWindow> {
    (0..count)
        .step_by(per_request_limit.max(1))
        .map(|offset| QueryWindow {
            offset,
            limit: per_request_limit.min(count - offset),
            keep: KeepPositions::All,
        })
        .collect()
}

/// `amount` distinct positions out of `0..total`, uniformly, ascending.
pub fn pick_positions<R: Rng + ?Sized>(total: usize, amount: usize, rng: &mut R) -> Vec<usize> {
    let mut picked = rand::seq::index::sample(rng, total, amount.min(total)).into_vec();
    picked.sort_unstable();
    picked
}

/// Cover ascending positions with the fewest windows a greedy pass allows.
///
/// Each window starts at the first uncovered position and absorbs every
/// following position that still fits within `per_request_limit`. Its limit
/// is trimmed to end at the last absorbed position.
pub fn coalesce(sorted: &[usize], per_request_limit: usize) -> Vec<QueryWindow> {
    let per_request = per_request_limit.max(1);
    let mut windows = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let start = sorted[i];
        let mut keep = Vec::new();
        while i < sorted.len() && sorted[i] < start + per_request {
            keep.push(sorted[i] - start);
            i += 1;
        }
        let last = keep.last().copied().unwrap_or(0);
        windows.push(QueryWindow {
            offset: start,
            limit: last + 1,
            keep: KeepPositions::Only(keep),
        });
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn limits(cap: usize, per: usize) -> PlanLimits {
        PlanLimits {
            display_cap: cap,
            per_request_limit: per,
        }
    }

    fn absolute_positions(windows: &[QueryWindow]) -> Vec<usize> {
        windows
            .iter()
            .flat_map(|w| {
                w.kept_positions(w.limit)
                    .into_iter()
                    .map(move |p| w.offset + p)
            })
            .collect()
    }

    #[test]
    fn test_empty_folder_plans_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(plan_queries(0, PlanLimits::default(), true, &mut rng).is_empty());
        assert!(plan_queries(0, PlanLimits::default(), false, &mut rng).is_empty());
    }

    #[test]
    fn test_ordered_plan_is_consecutive() {
        let mut rng = StdRng::seed_from_u64(1);
        let windows = plan_queries(1000, limits(250, 24), false, &mut rng);
        assert_eq!(windows.len(), 11);
        for (i, w) in windows.iter().enumerate() {
            assert_eq!(w.offset, i * 24);
            assert_eq!(w.keep, KeepPositions::All);
        }
        assert_eq!(windows.last().unwrap().limit, 250 - 240);
        assert_eq!(absolute_positions(&windows), (0..250).collect::<Vec<_>>());
    }

    #[test]
    fn test_small_folder_reads_everything_even_when_randomized() {
        let mut rng = StdRng::seed_from_u64(7);
        let windows = plan_queries(30, limits(250, 24), true, &mut rng);
        assert_eq!(
            windows,
            vec![
                QueryWindow { offset: 0, limit: 24, keep: KeepPositions::All },
                QueryWindow { offset: 24, limit: 6, keep: KeepPositions::All },
            ]
        );
    }

    #[test]
    fn test_randomized_plan_covers_exactly_cap_distinct_positions() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let windows = plan_queries(5000, limits(250, 24), true, &mut rng);
            let positions = absolute_positions(&windows);
            let distinct: HashSet<_> = positions.iter().copied().collect();
            assert_eq!(positions.len(), 250);
            assert_eq!(distinct.len(), 250);
            assert!(positions.iter().all(|&p| p < 5000));
            for w in &windows {
                assert!(w.limit >= 1 && w.limit <= 24);
            }
        }
    }

    #[test]
    fn test_randomized_windows_are_minimal() {
        let mut rng = StdRng::seed_from_u64(42);
        let windows = plan_queries(800, limits(250, 24), true, &mut rng);
        for pair in windows.windows(2) {
            // The next window's first position could not have joined this one.
            assert!(pair[1].offset >= pair[0].offset + 24);
        }
        for w in &windows {
            let KeepPositions::Only(keep) = &w.keep else {
                panic!("randomized windows keep chosen positions only");
            };
            assert_eq!(keep.first(), Some(&0));
            assert_eq!(keep.last().map(|l| l + 1), Some(w.limit));
        }
    }

    #[test]
    fn test_coalesce_example() {
        let windows = coalesce(&[3, 5, 30, 31, 60], 24);
        assert_eq!(
            windows,
            vec![
                QueryWindow { offset: 3, limit: 3, keep: KeepPositions::Only(vec![0, 2]) },
                QueryWindow { offset: 30, limit: 2, keep: KeepPositions::Only(vec![0, 1]) },
                QueryWindow { offset: 60, limit: 1, keep: KeepPositions::Only(vec![0]) },
            ]
        );
    }

    #[test]
    fn test_coalesce_window_boundary() {
        // 24 is one past the window starting at 0.
        let windows = coalesce(&[0, 23, 24], 24);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].limit, 24);
        assert_eq!(windows[1].offset, 24);
    }

    #[test]
    fn test_seeded_plans_are_reproducible() {
        let a = plan_queries(10_000, limits(250, 24), true, &mut StdRng::seed_from_u64(9));
        let b = plan_queries(10_000, limits(250, 24), true, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_kept_positions_clamped_to_short_page() {
        let w = QueryWindow { offset: 0, limit: 24, keep: KeepPositions::All };
        assert_eq!(w.kept_positions(3), vec![0, 1, 2]);
        let w = QueryWindow { offset: 10, limit: 6, keep: KeepPositions::Only(vec![0, 5]) };
        assert_eq!(w.kept_positions(4), vec![0]);
    }
}
