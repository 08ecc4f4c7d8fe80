//! Deterministic core of the face-recreation exercise.
//!
//! Flow:
//! 1) An attempt starts from a module target; the answer key is derived from
//!    the module's component pools.
//! 2) The user picks one option per region, then one lineup candidate.
//! 3) `verify_lineup` folds picks, answer key and the candidate's flag into
//!    an `ExerciseResult`.
//!
//! All functions here are pure; no network, no clock, no stores.

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::domain::{
  ComponentOption, CorrectComponents, ExerciseResult, FaceComponents, LineupCandidate, Region,
  Selections,
};

/// Region match scores 1 point each; the overall lineup match scores 3.
/// Fixed product policy, not derived from data.
const REGION_POINTS: u8 = 1;
const FACE_POINTS: u8 = 3;

/// Base face asset drawn under the component overlays.
const BASE_FACE_URL: &str = "/images/face.png";

/// Derive the answer key from a module's component pools.
///
/// The content model carries no link from the correct lineup candidate to its
/// constituent components; the shipped rule is "first entry per region",
/// independent of which candidate is flagged correct. Changing this changes
/// observable scores, so it stays as-is. Empty pools yield `None` and the
/// region then always scores false.
pub fn derive_correct_components(components: &FaceComponents) -> CorrectComponents {
  CorrectComponents {
    eyes: components.eyes.first().map(|o| o.id.clone()),
    nose: components.noses.first().map(|o| o.id.clone()),
    mouth: components.mouths.first().map(|o| o.id.clone()),
  }
}

/// Score one attempt from the picks, the answer key, and the chosen lineup
/// candidate. `face_correct` comes straight off the candidate's content flag,
/// never from the component comparison.
pub fn verify_lineup(
  selections: &Selections,
  correct: &CorrectComponents,
  picked: &LineupCandidate,
) -> ExerciseResult {
  let eyes_correct = region_matches(selections.eyes.as_deref(), correct.eyes.as_deref());
  let nose_correct = region_matches(selections.nose.as_deref(), correct.nose.as_deref());
  let mouth_correct = region_matches(selections.mouth.as_deref(), correct.mouth.as_deref());
  let face_correct = picked.correct;

  let mut total_points = 0;
  for hit in [eyes_correct, nose_correct, mouth_correct] {
    if hit {
      total_points += REGION_POINTS;
    }
  }
  if face_correct {
    total_points += FACE_POINTS;
  }

  ExerciseResult { eyes_correct, nose_correct, mouth_correct, face_correct, total_points }
}

fn region_matches(selected: Option<&str>, correct: Option<&str>) -> bool {
  matches!((selected, correct), (Some(s), Some(c)) if s == c)
}

/// One layer of the composed face preview. Offsets are fractions of the base
/// face box, matching the fixed placement of the original renderer.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PreviewLayer {
  pub role: &'static str,
  pub image_url: String,
  pub top_pct: f32,
  pub left_pct: f32,
  pub width_pct: f32,
}

/// Compose the preview layer list for the current picks: the base face plus
/// one overlay per decided region. A pick whose id is not in the option pool
/// simply produces no layer; no decision logic lives here.
pub fn preview_layers(selections: &Selections, components: &FaceComponents) -> Vec<PreviewLayer> {
  let mut layers = vec![PreviewLayer {
    role: "base",
    image_url: BASE_FACE_URL.to_string(),
    top_pct: 0.0,
    left_pct: 0.0,
    width_pct: 100.0,
  }];

  let placements: [(Region, &[ComponentOption], f32, f32, f32); 3] = [
    (Region::Eyes, &components.eyes, 40.0, 37.5, 24.0),
    (Region::Nose, &components.noses, 52.0, 39.0, 23.0),
    (Region::Mouth, &components.mouths, 62.0, 41.0, 20.0),
  ];

  for (region, pool, top_pct, left_pct, width_pct) in placements {
    let Some(chosen) = selections.get(region) else { continue };
    if let Some(option) = pool.iter().find(|o| o.id == chosen) {
      layers.push(PreviewLayer {
        role: region_role(region),
        image_url: option.image_url.clone(),
        top_pct,
        left_pct,
        width_pct,
      });
    }
  }

  layers
}

fn region_role(region: Region) -> &'static str {
  match region {
    Region::Eyes => "eyes",
    Region::Nose => "nose",
    Region::Mouth => "mouth",
  }
}

/// Shuffle every region pool in place. Option lists mix static fillers with
/// store assets and are served in a random order per attempt.
pub fn shuffle_components(components: &mut FaceComponents) {
  let mut rng = rand::thread_rng();
  components.eyes.shuffle(&mut rng);
  components.noses.shuffle(&mut rng);
  components.mouths.shuffle(&mut rng);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn opt(id: &str) -> ComponentOption {
    ComponentOption { id: id.into(), image_url: format!("/img/{id}.png"), label: id.into() }
  }

  fn candidate(correct: bool) -> LineupCandidate {
    LineupCandidate { id: "l1".into(), image_url: "/img/l1.png".into(), label: "Face 1".into(), correct }
  }

  fn picks(eyes: &str, nose: &str, mouth: &str) -> Selections {
    Selections { eyes: Some(eyes.into()), nose: Some(nose.into()), mouth: Some(mouth.into()) }
  }

  fn key(eyes: &str, nose: &str, mouth: &str) -> CorrectComponents {
    CorrectComponents { eyes: Some(eyes.into()), nose: Some(nose.into()), mouth: Some(mouth.into()) }
  }

  #[test]
  fn perfect_score_is_six() {
    let r = verify_lineup(&picks("e1", "n1", "m1"), &key("e1", "n1", "m1"), &candidate(true));
    assert_eq!(
      r,
      ExerciseResult {
        eyes_correct: true,
        nose_correct: true,
        mouth_correct: true,
        face_correct: true,
        total_points: 6,
      }
    );
  }

  #[test]
  fn partial_match_counts_regions_only() {
    let r = verify_lineup(&picks("e1", "n2", "m1"), &key("e1", "n1", "m1"), &candidate(false));
    assert!(r.eyes_correct && !r.nose_correct && r.mouth_correct && !r.face_correct);
    assert_eq!(r.total_points, 2);
  }

  #[test]
  fn zero_match_scores_zero() {
    let r = verify_lineup(&picks("e2", "n2", "m2"), &key("e1", "n1", "m1"), &candidate(false));
    assert_eq!(
      r,
      ExerciseResult {
        eyes_correct: false,
        nose_correct: false,
        mouth_correct: false,
        face_correct: false,
        total_points: 0,
      }
    );
  }

  #[test]
  fn scoring_is_deterministic() {
    let s = picks("e1", "n1", "m2");
    let c = key("e1", "n1", "m1");
    let l = candidate(true);
    assert_eq!(verify_lineup(&s, &c, &l), verify_lineup(&s, &c, &l));
  }

  #[test]
  fn changing_one_region_moves_points_by_one() {
    let c = key("e1", "n1", "m1");
    let l = candidate(true);
    let before = verify_lineup(&picks("e1", "n2", "m1"), &c, &l);
    let after = verify_lineup(&picks("e1", "n1", "m1"), &c, &l);
    assert_eq!(after.total_points, before.total_points + 1);
    assert_eq!(after.eyes_correct, before.eyes_correct);
    assert_eq!(after.mouth_correct, before.mouth_correct);
    assert_eq!(after.face_correct, before.face_correct);
  }

  #[test]
  fn face_flag_is_independent_of_picks() {
    for (s, c) in [
      (picks("e1", "n1", "m1"), key("e1", "n1", "m1")),
      (picks("x", "y", "z"), key("e1", "n1", "m1")),
      (Selections::default(), CorrectComponents::default()),
    ] {
      assert!(verify_lineup(&s, &c, &candidate(true)).face_correct);
      assert!(!verify_lineup(&s, &c, &candidate(false)).face_correct);
    }
  }

  #[test]
  fn missing_answer_key_degrades_to_false() {
    let s = picks("e1", "n1", "m1");
    let no_key = CorrectComponents::default();
    let r = verify_lineup(&s, &no_key, &candidate(false));
    assert_eq!(r.total_points, 0);
    let r = verify_lineup(&s, &no_key, &candidate(true));
    assert_eq!(r.total_points, 3); // only the lineup flag can score
  }

  #[test]
  fn unset_selection_never_matches() {
    let s = Selections { eyes: None, nose: Some("n1".into()), mouth: None };
    let r = verify_lineup(&s, &key("e1", "n1", "m1"), &candidate(false));
    assert!(!r.eyes_correct && r.nose_correct && !r.mouth_correct);
    assert_eq!(r.total_points, 1);
  }

  #[test]
  fn points_stay_in_bounds() {
    let ids = ["e1", "zz"];
    for e in ids {
      for n in ids {
        for m in ids {
          for face in [true, false] {
            let r = verify_lineup(&picks(e, n, m), &key("e1", "e1", "e1"), &candidate(face));
            assert!(r.total_points <= 6);
          }
        }
      }
    }
  }

  #[test]
  fn answer_key_is_first_entry_per_region() {
    let components = FaceComponents {
      eyes: vec![opt("e-a"), opt("e-b")],
      noses: vec![opt("n-a")],
      mouths: vec![],
    };
    let key = derive_correct_components(&components);
    assert_eq!(key.eyes.as_deref(), Some("e-a"));
    assert_eq!(key.nose.as_deref(), Some("n-a"));
    assert_eq!(key.mouth, None);
  }

  #[test]
  fn preview_always_includes_base_and_skips_unknown_ids() {
    let components = FaceComponents {
      eyes: vec![opt("e1")],
      noses: vec![opt("n1")],
      mouths: vec![opt("m1")],
    };
    let s = Selections { eyes: Some("e1".into()), nose: Some("nope".into()), mouth: None };
    let layers = preview_layers(&s, &components);
    let roles: Vec<&str> = layers.iter().map(|l| l.role).collect();
    assert_eq!(roles, vec!["base", "eyes"]);
    assert_eq!(layers[1].image_url, "/img/e1.png");
  }
}
