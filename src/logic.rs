//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Turning raw catalog query params into the filter/sort pipeline inputs
//!   - Producing the filtered, sorted course listing
//!   - Mapping workflow errors to the step the client should navigate back to

use tracing::{debug, instrument, warn};

use crate::catalog::{filter_and_sort, CatalogFilter, DurationBucket, SortKey};
use crate::domain::{AccessLevel, ExerciseStep};
use crate::protocol::{to_course_out, CourseOut};
use crate::state::{AppState, SessionError};

/// Parse comma-separated filter tokens. Unknown tokens are dropped with a
/// warning; an empty or absent param selects nothing, which means "show all".
pub fn catalog_filter_from_params(access: Option<&str>, duration: Option<&str>) -> CatalogFilter {
  let mut filter = CatalogFilter::default();

  for token in split_tokens(access) {
    match token {
      "premium" => filter.access_levels.push(AccessLevel::Premium),
      "free" => filter.access_levels.push(AccessLevel::Free),
      other => warn!(target: "catalog", token = other, "Ignoring unknown access filter token"),
    }
  }

  for token in split_tokens(duration) {
    match DurationBucket::from_param(token) {
      Some(bucket) => filter.durations.push(bucket),
      None => warn!(target: "catalog", token, "Ignoring unknown duration filter token"),
    }
  }

  filter
}

/// Unknown sort keys fall back to the default rather than erroring.
pub fn sort_key_from_param(sort: Option<&str>) -> SortKey {
  match sort {
    None | Some("") => SortKey::default(),
    Some(raw) => SortKey::from_param(raw).unwrap_or_else(|| {
      warn!(target: "catalog", token = raw, "Ignoring unknown sort key");
      SortKey::default()
    }),
  }
}

fn split_tokens(raw: Option<&str>) -> impl Iterator<Item = &str> {
  raw
    .unwrap_or("")
    .split(',')
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// The filtered, sorted catalog listing.
#[instrument(level = "info", skip(state))]
pub async fn list_catalog(
  state: &AppState,
  access: Option<&str>,
  duration: Option<&str>,
  sort: Option<&str>,
) -> Vec<CourseOut> {
  let filter = catalog_filter_from_params(access, duration);
  let sort = sort_key_from_param(sort);
  let courses = state.list_courses().await;
  let shown = filter_and_sort(&courses, &filter, sort);
  debug!(target: "catalog", total = courses.len(), shown = shown.len(), ?sort, "Catalog listing computed");
  shown.iter().map(to_course_out).collect()
}

/// For premature step transitions, the step the client should return to.
/// Handled by immediate redirect; the state that step produces is required
/// before the requested one makes sense.
pub fn redirect_step_for(err: &SessionError) -> Option<ExerciseStep> {
  match err {
    SessionError::IncompleteSelection => Some(ExerciseStep::Recreate),
    SessionError::NoResultYet => Some(ExerciseStep::Recreate),
    SessionError::WrongStep { required, .. } => Some(*required),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_params_select_nothing() {
    let filter = catalog_filter_from_params(None, Some(""));
    assert!(filter.access_levels.is_empty());
    assert!(filter.durations.is_empty());
  }

  #[test]
  fn tokens_are_split_and_unknowns_dropped()  {
    let filter = catalog_filter_from_params(Some("premium, free,bogus"), Some("0-30,never"));
    assert_eq!(filter.access_levels, vec![AccessLevel::Premium, AccessLevel::Free]);
    assert_eq!(filter.durations, vec![DurationBucket::UpToHalfHour]);
  }

  #[test]
  fn unknown_sort_falls_back_to_relevancy() {
    assert_eq!(sort_key_from_param(Some("upside-down")), SortKey::Relevancy);
    assert_eq!(sort_key_from_param(Some("rating-down")), SortKey::RatingDown);
    assert_eq!(sort_key_from_param(None), SortKey::Relevancy);
  }

  #[test]
  fn premature_results_redirect_to_recreate() {
    assert_eq!(redirect_step_for(&SessionError::NoResultYet), Some(ExerciseStep::Recreate));
    assert_eq!(
      redirect_step_for(&SessionError::UnknownSession("x".into())),
      None
    );
  }
}
