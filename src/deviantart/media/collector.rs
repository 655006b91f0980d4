//! Thread-safe accumulator for the media of one feed.

use std::collections::HashSet;
use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Collected, MediaItem};
use crate::deviantart::error::ApiError;

#[derive(Default)]
struct Gathered {
    items: Vec<(usize, MediaItem)>,
    seen: HashSet<usize>,
}

/// Collects items from concurrently completing windows.
///
/// Ordered feeds must supply an absolute index below the display cap, and
/// each index at most once. Randomized feeds accept items with or without
/// an index and shuffle on the way out.
pub struct MediaCollector {
    randomize: bool,
    display_cap: usize,
    inner: Mutex<Gathered>,
}

impl std::fmt::Debug for MediaCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCollector")
            .field("randomize", &self.randomize)
            .field("display_cap", &self.display_cap)
            .field("len", &self.len())
            .finish()
    }
}

impl MediaCollector {
    pub fn new(randomize: bool, display_cap: usize) -> Self {
        Self {
            randomize,
            display_cap,
            inner: Mutex::new(Gathered::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Gathered> {
        // Every critical section leaves the state consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add(&self, entry: Collected) -> Result<(), ApiError> {
        if self.randomize {
            let mut inner = self.lock();
            let slot = inner.items.len();
            inner.items.push((slot, entry.into_item()));
            return Ok(());
        }

        let Collected::Ordered { index, item } = entry else {
            return Err(ApiError::ContractViolation(
                "ordered feed received an item without a position".into(),
            ));
        };
        if index >= self.display_cap {
            return Err(ApiError::ContractViolation(format!(
                "position {index} is outside the display cap of {}",
                self.display_cap
            )));
        }
        let mut inner = self.lock();
        if !inner.seen.insert(index) {
            return Err(ApiError::ContractViolation(format!(
                "position {index} was collected twice"
            )));
        }
        inner.items.push((index, item));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Final feed: shuffled for randomized feeds, by position otherwise.
    pub fn into_media(self) -> Vec<MediaItem> {
        self.into_media_with(&mut rand::thread_rng())
    }

    pub fn into_media_with<R: Rng + ?Sized>(self, rng: &mut R) -> Vec<MediaItem> {
        let mut items = self
            .inner
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .items;
        if self.randomize {
            items.shuffle(rng);
        } else {
            items.sort_unstable_by_key(|(index, _)| *index);
        }
        items.into_iter().map(|(_, item)| item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deviantart::media::MediaKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn item(n: usize) -> MediaItem {
        MediaItem {
            url: format!("https://img.example/{n}.jpg"),
            title: format!("art {n}"),
            kind: MediaKind::Image,
        }
    }

    fn ordered(n: usize) -> Collected {
        Collected::Ordered { index: n, item: item(n) }
    }

    #[test]
    fn test_ordered_feed_sorts_by_position() {
        let collector = MediaCollector::new(false, 250);
        for n in [5, 1, 3] {
            collector.add(ordered(n)).unwrap();
        }
        let urls: Vec<_> = collector.into_media().into_iter().map(|i| i.title).collect();
        assert_eq!(urls, vec!["art 1", "art 3", "art 5"]);
    }

    #[test]
    fn test_ordered_feed_rejects_missing_position() {
        let collector = MediaCollector::new(false, 250);
        assert!(matches!(
            collector.add(Collected::Unordered(item(0))),
            Err(ApiError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_ordered_feed_rejects_out_of_range_position() {
        let collector = MediaCollector::new(false, 10);
        assert!(collector.add(ordered(9)).is_ok());
        assert!(matches!(
            collector.add(ordered(10)),
            Err(ApiError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_ordered_feed_rejects_duplicate_position() {
        let collector = MediaCollector::new(false, 10);
        collector.add(ordered(4)).unwrap();
        assert!(matches!(
            collector.add(ordered(4)),
            Err(ApiError::ContractViolation(_))
        ));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_randomized_feed_accepts_both_variants() {
        let collector = MediaCollector::new(true, 2);
        collector.add(Collected::Unordered(item(0))).unwrap();
        collector.add(ordered(900)).unwrap();
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_randomized_feed_is_a_shuffle() {
        let build = || {
            let c = MediaCollector::new(true, 250);
            for n in 0..50 {
                c.add(Collected::Unordered(item(n))).unwrap();
            }
            c
        };
        let a = build().into_media_with(&mut StdRng::seed_from_u64(1));
        let b = build().into_media_with(&mut StdRng::seed_from_u64(2));

        let mut sorted_a: Vec<_> = a.iter().map(|i| i.url.clone()).collect();
        sorted_a.sort();
        let mut expected: Vec<_> = (0..50).map(|n| item(n).url).collect();
        expected.sort();
        assert_eq!(sorted_a, expected);
        assert_ne!(a, b);
    }

    #[test]
    fn test_randomized_feed_order_varies_across_runs() {
        let trials = 1000;
        let mut upstream_order = 0;
        let mut first_seen = HashSet::new();
        for _ in 0..trials {
            let c = MediaCollector::new(true, 250);
            for n in 0..5 {
                c.add(Collected::Unordered(item(n))).unwrap();
            }
            let titles: Vec<_> = c.into_media().into_iter().map(|i| i.title).collect();
            assert_eq!(titles.len(), 5);
            if titles == (0..5).map(|n| format!("art {n}")).collect::<Vec<_>>() {
                upstream_order += 1;
            }
            first_seen.insert(titles[0].clone());
        }
        // 1 in 120 orders is the upstream one; allow generous slack.
        assert!(upstream_order < 50, "upstream order came back {upstream_order} times");
        assert_eq!(first_seen.len(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds() {
        let collector = Arc::new(MediaCollector::new(false, 200));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let c = Arc::clone(&collector);
                tokio::spawn(async move {
                    for n in (t * 25)..(t * 25 + 25) {
                        c.add(ordered(n)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }
        let collector = Arc::try_unwrap(collector).unwrap();
        let media = collector.into_media();
        assert_eq!(media.len(), 200);
        assert!(media.iter().enumerate().all(|(i, m)| m.title == format!("art {i}")));
    }
}
