//! Course catalog filtering and sorting.
//!
//! The whole course list is fetched up front; this module is a pure
//! predicate/comparator pipeline over that in-memory slice. Empty filter sets
//! mean "show all" (deliberate policy), and sorting is stable so ties keep
//! the content store's returned order.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{AccessLevel, Course};

// Matches "<N hours> <M mins>" with either half optional.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)(?:(\d+)\s*hours?)?\s*(?:(\d+)\s*mins?)?")
    .expect("duration pattern is well-formed")
});

/// Parse a free-text course duration into total minutes.
/// Unparsable text defaults to zero; this never fails.
pub fn parse_duration_minutes(duration: &str) -> u32 {
  let Some(caps) = DURATION_RE.captures(duration) else { return 0 };
  let hours = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(0);
  let mins = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(0);
  hours * 60 + mins
}

/// Duration filter buckets, in minutes: [0,30], (30,60], (60,120], (120,inf).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurationBucket {
  UpToHalfHour,
  HalfToFullHour,
  OneToTwoHours,
  AboveTwoHours,
}

impl DurationBucket {
  /// Parse the catalog query token for a bucket.
  pub fn from_param(s: &str) -> Option<Self> {
    match s {
      "0-30" => Some(Self::UpToHalfHour),
      "30-60" => Some(Self::HalfToFullHour),
      "1-2h" => Some(Self::OneToTwoHours),
      "above-2h" => Some(Self::AboveTwoHours),
      _ => None,
    }
  }

  pub fn contains(self, minutes: u32) -> bool {
    match self {
      Self::UpToHalfHour => minutes <= 30,
      Self::HalfToFullHour => minutes > 30 && minutes <= 60,
      Self::OneToTwoHours => minutes > 60 && minutes <= 120,
      Self::AboveTwoHours => minutes > 120,
    }
  }
}

/// Catalog sort keys. `relevancy` and `created-up` are the same ordering
/// (creation date descending); documented duplication, keep them aligned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
  Relevancy,
  CreatedUp,
  RatingUp,
  RatingDown,
}

impl SortKey {
  pub fn from_param(s: &str) -> Option<Self> {
    match s {
      "relevancy" => Some(Self::Relevancy),
      "created-up" => Some(Self::CreatedUp),
      "rating-up" => Some(Self::RatingUp),
      "rating-down" => Some(Self::RatingDown),
      _ => None,
    }
  }
}

impl Default for SortKey {
  fn default() -> Self { SortKey::Relevancy }
}

/// User-selected filter criteria. Empty vectors pass everything.
#[derive(Clone, Debug, Default)]
pub struct CatalogFilter {
  pub access_levels: Vec<AccessLevel>,
  pub durations: Vec<DurationBucket>,
}

impl CatalogFilter {
  fn admits(&self, course: &Course) -> bool {
    if !self.access_levels.is_empty() && !self.access_levels.contains(&course.access_level) {
      return false;
    }
    if !self.durations.is_empty() {
      let minutes = parse_duration_minutes(&course.duration);
      if !self.durations.iter().any(|b| b.contains(minutes)) {
        return false;
      }
    }
    true
  }
}

/// Produce the display order: filter, then stable-sort by the active key.
pub fn filter_and_sort(courses: &[Course], filter: &CatalogFilter, sort: SortKey) -> Vec<Course> {
  let mut out: Vec<Course> = courses.iter().filter(|c| filter.admits(c)).cloned().collect();
  out.sort_by(|a, b| match sort {
    SortKey::Relevancy | SortKey::CreatedUp => b.created_at.cmp(&a.created_at),
    SortKey::RatingUp => a.rating.partial_cmp(&b.rating).unwrap_or(std::cmp::Ordering::Equal),
    SortKey::RatingDown => b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal),
  });
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ContentOrigin, CourseType};
  use chrono::{TimeZone, Utc};

  fn course(id: &str, access: AccessLevel, duration: &str, rating: f32, day: u32) -> Course {
    Course {
      id: id.into(),
      title: id.into(),
      description: String::new(),
      access_level: access,
      course_type: CourseType::Standard,
      duration: duration.into(),
      rating,
      preview_image_url: String::new(),
      slug: id.into(),
      created_at: Utc.with_ymd_and_hms(2024, 10, day, 12, 0, 0).unwrap(),
      updated_at: None,
      face_module_id: None,
      lessons: vec![],
      origin: ContentOrigin::Seed,
    }
  }

  #[test]
  fn duration_parsing_matches_expected_minutes() {
    assert_eq!(parse_duration_minutes("1 hour 30 mins"), 90);
    assert_eq!(parse_duration_minutes("45 mins"), 45);
    assert_eq!(parse_duration_minutes("2 hours"), 120);
    assert_eq!(parse_duration_minutes(""), 0);
    assert_eq!(parse_duration_minutes("about a day"), 0);
    assert_eq!(parse_duration_minutes("1 Hour 5 Min"), 65);
  }

  #[test]
  fn empty_filters_show_the_full_list() {
    let courses = vec![
      course("a", AccessLevel::Free, "10 mins", 3.0, 1),
      course("b", AccessLevel::Premium, "3 hours", 5.0, 2),
      course("c", AccessLevel::Free, "50 mins", 4.0, 3),
    ];
    let out = filter_and_sort(&courses, &CatalogFilter::default(), SortKey::default());
    assert_eq!(out.len(), 3);
    // default sort is creation date descending
    let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
  }

  #[test]
  fn access_filter_is_inclusive_membership() {
    let courses = vec![
      course("free", AccessLevel::Free, "10 mins", 0.0, 1),
      course("paid", AccessLevel::Premium, "10 mins", 0.0, 2),
    ];
    let filter = CatalogFilter { access_levels: vec![AccessLevel::Premium], durations: vec![] };
    let out = filter_and_sort(&courses, &filter, SortKey::default());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "paid");
  }

  #[test]
  fn duration_buckets_have_half_open_bounds() {
    assert!(DurationBucket::UpToHalfHour.contains(0));
    assert!(DurationBucket::UpToHalfHour.contains(30));
    assert!(!DurationBucket::UpToHalfHour.contains(31));
    assert!(DurationBucket::HalfToFullHour.contains(31));
    assert!(DurationBucket::HalfToFullHour.contains(60));
    assert!(DurationBucket::OneToTwoHours.contains(61));
    assert!(DurationBucket::OneToTwoHours.contains(120));
    assert!(DurationBucket::AboveTwoHours.contains(121));
    assert!(!DurationBucket::AboveTwoHours.contains(120));
  }

  #[test]
  fn course_passes_if_any_selected_bucket_matches() {
    let courses = vec![
      course("short", AccessLevel::Free, "20 mins", 0.0, 1),
      course("mid", AccessLevel::Free, "1 hour", 0.0, 2),
      course("long", AccessLevel::Free, "2 hours 10 mins", 0.0, 3),
    ];
    let filter = CatalogFilter {
      access_levels: vec![],
      durations: vec![DurationBucket::UpToHalfHour, DurationBucket::AboveTwoHours],
    };
    let out = filter_and_sort(&courses, &filter, SortKey::default());
    let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["long", "short"]);
  }

  #[test]
  fn rating_sorts_run_both_directions() {
    let courses = vec![
      course("mid", AccessLevel::Free, "10 mins", 3.0, 1),
      course("top", AccessLevel::Free, "10 mins", 5.0, 2),
      course("low", AccessLevel::Free, "10 mins", 1.0, 3),
    ];
    let up = filter_and_sort(&courses, &CatalogFilter::default(), SortKey::RatingUp);
    assert_eq!(up.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["low", "mid", "top"]);
    let down = filter_and_sort(&courses, &CatalogFilter::default(), SortKey::RatingDown);
    assert_eq!(down.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["top", "mid", "low"]);
  }

  #[test]
  fn equal_keys_keep_fetched_order() {
    let courses = vec![
      course("first", AccessLevel::Free, "10 mins", 4.0, 5),
      course("second", AccessLevel::Free, "10 mins", 4.0, 5),
      course("third", AccessLevel::Free, "10 mins", 4.0, 5),
    ];
    for sort in [SortKey::Relevancy, SortKey::RatingUp, SortKey::RatingDown] {
      let out = filter_and_sort(&courses, &CatalogFilter::default(), sort);
      let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
      assert_eq!(ids, vec!["first", "second", "third"]);
    }
  }

  #[test]
  fn relevancy_and_created_up_agree() {
    let courses = vec![
      course("old", AccessLevel::Free, "10 mins", 1.0, 1),
      course("new", AccessLevel::Free, "10 mins", 5.0, 9),
    ];
    let a = filter_and_sort(&courses, &CatalogFilter::default(), SortKey::Relevancy);
    let b = filter_and_sort(&courses, &CatalogFilter::default(), SortKey::CreatedUp);
    let ids = |v: &[Course]| v.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));
    assert_eq!(ids(&a), vec!["new".to_string(), "old".to_string()]);
  }
}
