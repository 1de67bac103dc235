//! Ordering and matching over the catalog: popular, recent, related and search.
//!
//! Everything here is a pure function of the catalog. Ties always fall back to
//! catalog declaration order.

use std::cmp::Reverse;

use crate::catalog::{Catalog, VideoRecord};

const SHARED_TAG_SCORE: u32 = 2;
const SAME_CATEGORY_SCORE: u32 = 3;
const SAME_CREATOR_SCORE: u32 = 4;

/// Most viewed first.
pub fn popular_videos(catalog: &Catalog, limit: usize) -> Vec<&VideoRecord> {
  let mut videos: Vec<&VideoRecord> = catalog.videos().iter().collect();
  // `sort_by_key` is stable, so equal view counts keep catalog order.
  videos.sort_by_key(|v| Reverse(v.views));
  videos.truncate(limit);
  videos
}

/// Most recently uploaded first.
pub fn recent_videos(catalog: &Catalog, limit: usize) -> Vec<&VideoRecord> {
  let mut videos: Vec<&VideoRecord> = catalog.videos().iter().collect();
  videos.sort_by_key(|v| Reverse(v.upload_date));
  videos.truncate(limit);
  videos
}

/// Relatedness of `candidate` to `current`.
///
/// Each tag of the candidate found in the current record's tags scores once,
/// so a tag repeated on the candidate counts every time it appears.
pub fn related_score(current: &VideoRecord, candidate: &VideoRecord) -> u32 {
  let shared_tags = candidate.tags.iter().filter(|tag| current.tags.contains(tag)).count() as u32;
  let mut score = shared_tags * SHARED_TAG_SCORE;
  if candidate.category == current.category {
    score += SAME_CATEGORY_SCORE;
  }
  if candidate.creator.id == current.creator.id {
    score += SAME_CREATOR_SCORE;
  }
  score
}

/// Records most related to `video_id`, excluding the record itself.
/// An unknown id yields an empty list.
pub fn related_videos<'a>(catalog: &'a Catalog, video_id: &str, limit: usize) -> Vec<&'a VideoRecord> {
  let Some(current) = catalog.get(video_id) else {
    return Vec::new();
  };

  let mut scored: Vec<(u32, usize, &VideoRecord)> = catalog
    .videos()
    .iter()
    .enumerate()
    .filter(|(_, v)| v.id != video_id)
    .map(|(idx, v)| (related_score(current, v), idx, v))
    .collect();
  // The catalog index is part of the key so the order does not depend on sort stability.
  scored.sort_unstable_by_key(|&(score, idx, _)| (Reverse(score), idx));
  scored.into_iter().take(limit).map(|(_, _, v)| v).collect()
}

/// `None` means every category.
pub fn videos_by_category<'a>(catalog: &'a Catalog, category: Option<&str>) -> Vec<&'a VideoRecord> {
  match category {
    None => catalog.videos().iter().collect(),
    Some(category) => catalog.videos().iter().filter(|v| v.category == category).collect(),
  }
}

/// Narrow an already-ordered section to a category, keeping the section's order.
pub fn filter_by_category<'a>(videos: Vec<&'a VideoRecord>, category: Option<&str>) -> Vec<&'a VideoRecord> {
  match category {
    None => videos,
    Some(category) => videos.into_iter().filter(|v| v.category == category).collect(),
  }
}

/// Check if a record matches an already lowercased, trimmed needle.
/// Matches title, creator name, any tag or description.
fn matches_query(video: &VideoRecord, needle: &str) -> bool {
  video.title.to_lowercase().contains(needle)
    || video.creator.name.to_lowercase().contains(needle)
    || video.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    || video.description.to_lowercase().contains(needle)
}

/// Case-insensitive substring search. A blank query matches nothing.
pub fn search_videos<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a VideoRecord> {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return Vec::new();
  }
  catalog.videos().iter().filter(|v| matches_query(v, &needle)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::tests::record;

  fn builtin() -> Catalog {
    Catalog::builtin().unwrap()
  }

  fn ids<'a>(videos: &[&'a VideoRecord]) -> Vec<&'a str> {
    videos.iter().map(|v| v.id.as_str()).collect()
  }

  // --- popular / recent ---

  #[test]
  fn popular_sorted_by_views_and_limited() {
    let catalog = builtin();
    for limit in [0, 1, 5, 12, 50] {
      let videos = popular_videos(&catalog, limit);
      assert!(videos.len() <= limit);
      assert!(videos.windows(2).all(|w| w[0].views >= w[1].views));
    }
    assert_eq!(ids(&popular_videos(&catalog, 3)), ["5", "12", "1"]);
  }

  #[test]
  fn popular_ties_keep_catalog_order() {
    let catalog = Catalog::new(vec![
      record("a", 10, "2023-01-01", "c1", "X", &[]),
      record("b", 20, "2023-01-01", "c1", "X", &[]),
      record("c", 10, "2023-01-01", "c1", "X", &[]),
    ])
    .unwrap();
    assert_eq!(ids(&popular_videos(&catalog, 10)), ["b", "a", "c"]);
  }

  #[test]
  fn recent_sorted_by_date() {
    let catalog = builtin();
    let videos = recent_videos(&catalog, 12);
    assert_eq!(videos.len(), 12);
    assert!(videos.windows(2).all(|w| w[0].upload_date >= w[1].upload_date));
    assert_eq!(videos[0].id, "8");
    assert_eq!(videos[11].id, "5");
  }

  #[test]
  fn recent_ties_keep_catalog_order() {
    let catalog = Catalog::new(vec![
      record("a", 0, "2023-01-01", "c1", "X", &[]),
      record("b", 0, "2023-05-01", "c1", "X", &[]),
      record("c", 0, "2023-01-01", "c1", "X", &[]),
    ])
    .unwrap();
    assert_eq!(ids(&recent_videos(&catalog, 10)), ["b", "a", "c"]);
  }

  // --- related ---

  #[test]
  fn related_ranks_same_creator_movies_first() {
    let catalog = builtin();
    let related = related_videos(&catalog, "1", 4);
    let related_ids = ids(&related);
    assert_eq!(related_ids.len(), 4);
    assert!(!related_ids.contains(&"1"));
    // Elephant Dream: 2 shared tags + category + creator = 11; Sintel likewise.
    assert_eq!(&related_ids[..2], ["2", "5"]);
    assert!(related.iter().all(|v| v.category == "Movies"));
  }

  #[test]
  fn related_is_stable_across_calls() {
    let catalog = builtin();
    for video in catalog.videos() {
      let first = ids(&related_videos(&catalog, &video.id, 11));
      let second = ids(&related_videos(&catalog, &video.id, 11));
      assert_eq!(first, second);
      assert_eq!(first.len(), 11);
    }
  }

  #[test]
  fn related_unknown_id_is_empty() {
    assert!(related_videos(&builtin(), "missing", 4).is_empty());
  }

  #[test]
  fn related_ties_fall_back_to_catalog_order() {
    let catalog = Catalog::new(vec![
      record("x", 0, "2023-01-01", "c1", "A", &["t"]),
      record("p", 0, "2023-01-01", "c9", "B", &[]),
      record("q", 0, "2023-01-01", "c9", "B", &[]),
      record("r", 0, "2023-01-01", "c9", "A", &[]),
      record("s", 0, "2023-01-01", "c9", "B", &[]),
    ])
    .unwrap();
    assert_eq!(ids(&related_videos(&catalog, "x", 10)), ["r", "p", "q", "s"]);
  }

  #[test]
  fn related_score_counts_duplicate_candidate_tags() {
    let current = record("x", 0, "2023-01-01", "c1", "A", &["rock", "jazz"]);
    let candidate = record("y", 0, "2023-01-01", "c2", "B", &["rock", "rock", "pop"]);
    assert_eq!(related_score(&current, &candidate), 4);
    let same_everything = record("z", 0, "2023-01-01", "c1", "A", &["jazz"]);
    assert_eq!(related_score(&current, &same_everything), 2 + 3 + 4);
  }

  // --- category ---

  #[test]
  fn by_category_none_returns_everything_once() {
    let catalog = builtin();
    let all = videos_by_category(&catalog, None);
    assert_eq!(all.len(), catalog.len());
    let mut seen = ids(&all);
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), catalog.len());
  }

  #[test]
  fn by_category_is_case_sensitive() {
    let catalog = builtin();
    assert_eq!(ids(&videos_by_category(&catalog, Some("Technology"))), ["3", "4", "12"]);
    assert!(videos_by_category(&catalog, Some("technology")).is_empty());
  }

  #[test]
  fn filter_keeps_section_order() {
    let catalog = builtin();
    let popular = popular_videos(&catalog, 10);
    let movies = filter_by_category(popular, Some("Movies"));
    assert_eq!(ids(&movies), ["5", "1", "9", "6", "2"]);
  }

  // --- search ---

  #[test]
  fn search_blank_query_is_empty() {
    let catalog = builtin();
    assert!(search_videos(&catalog, "").is_empty());
    assert!(search_videos(&catalog, "   ").is_empty());
  }

  #[test]
  fn search_bunny() {
    let catalog = builtin();
    let results = ids(&search_videos(&catalog, "bunny"));
    assert_eq!(results, ["1"]);
  }

  #[test]
  fn search_is_case_insensitive_and_trimmed() {
    let catalog = builtin();
    assert_eq!(ids(&search_videos(&catalog, "  BUNNY ")), ["1"]);
  }

  #[test]
  fn search_matches_creator_tags_and_description() {
    let catalog = builtin();
    assert_eq!(ids(&search_videos(&catalog, "garage419")), ["7", "8", "10", "11"]);
    assert_eq!(ids(&search_videos(&catalog, "shelby")), ["10"]);
    // Only in descriptions.
    assert_eq!(ids(&search_videos(&catalog, "iron throne")), ["3"]);
  }

  #[test]
  fn search_preserves_catalog_order() {
    let catalog = builtin();
    assert_eq!(ids(&search_videos(&catalog, "chromecast")), ["3", "4", "12"]);
  }
}
