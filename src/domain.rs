//! Domain models used by the backend: courses, lessons, face modules, and the
//! per-attempt scoring records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may open a course?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
  Premium,
  Free,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CourseType {
  Standard,
  FaceRecreate,
}
impl Default for CourseType {
  fn default() -> Self { CourseType::Standard }
}

/// Where did we get the content from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
  LocalBank, // from user-provided TOML bank
  Remote,    // fetched from the hosted content store
  Seed,      // built-in seeds (last resort)
}

/// Module video: either an external link or an uploaded asset URL.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "video_type", rename_all = "snake_case")]
pub enum VideoSource {
  Link { url: String },
  Upload { url: String },
}

/// An independently selectable facial feature.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Region {
  Eyes,
  Nose,
  Mouth,
}

/// One selectable visual asset for a face region.
/// Ids are either statically assigned (filler assets) or asset ids from the
/// content store; immutable once fetched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentOption {
  pub id: String,
  pub image_url: String,
  pub label: String,
}

/// One of the faces shown at the verification step. Content authoring intends
/// exactly five per target with exactly one `correct: true`, but the runtime
/// does not enforce either.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineupCandidate {
  pub id: String,
  pub image_url: String,
  pub label: String,
  pub correct: bool,
}

/// Option pools for the three regions, in the order they should be offered.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FaceComponents {
  pub eyes: Vec<ComponentOption>,
  pub noses: Vec<ComponentOption>,
  pub mouths: Vec<ComponentOption>,
}

/// One face-reconstruction challenge: a target face plus its lineup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Target {
  pub face_url: String,
  pub lineup: Vec<LineupCandidate>,
}

/// A face-recreation module document (video, instruction, component pools,
/// targets). Referenced by courses and lessons.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FaceModule {
  pub id: String,
  pub title: String,
  pub instruction: String,
  pub video: Option<VideoSource>,
  pub components: FaceComponents,
  pub targets: Vec<Target>,
  pub origin: ContentOrigin,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
  pub id: String,
  pub title: String,
  pub description: String,
  pub duration: String,
  #[serde(default)]
  pub video_url: Option<String>,
  pub order: u32,
}

/// Course document as listed in the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
  pub id: String,
  pub title: String,
  pub description: String,
  pub access_level: AccessLevel,
  #[serde(default)]
  pub course_type: CourseType,
  pub duration: String, // free text, e.g. "1 hour 30 mins"
  #[serde(default)]
  pub rating: f32,
  #[serde(default)]
  pub preview_image_url: String,
  pub slug: String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub face_module_id: Option<String>,
  #[serde(default)]
  pub lessons: Vec<Lesson>,
  pub origin: ContentOrigin,
}

/// The user's in-progress component picks. `None` means "not yet decided".
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selections {
  pub eyes: Option<String>,
  pub nose: Option<String>,
  pub mouth: Option<String>,
}

impl Selections {
  /// Overwrite exactly one region. No validation that the id exists in the
  /// offered option list; callers are trusted.
  pub fn set(&mut self, region: Region, component_id: String) {
    match region {
      Region::Eyes => self.eyes = Some(component_id),
      Region::Nose => self.nose = Some(component_id),
      Region::Mouth => self.mouth = Some(component_id),
    }
  }

  pub fn get(&self, region: Region) -> Option<&str> {
    match region {
      Region::Eyes => self.eyes.as_deref(),
      Region::Nose => self.nose.as_deref(),
      Region::Mouth => self.mouth.as_deref(),
    }
  }

  pub fn complete(&self) -> bool {
    self.eyes.is_some() && self.nose.is_some() && self.mouth.is_some()
  }
}

/// Answer-key component ids, populated once per attempt. `None` per region
/// means "no correct answer available" and scores that region false.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorrectComponents {
  pub eyes: Option<String>,
  pub nose: Option<String>,
  pub mouth: Option<String>,
}

/// Scoring outcome of one attempt. The weighting is a fixed product policy:
/// 1 point per region, 3 for the lineup match, 6 max.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseResult {
  pub eyes_correct: bool,
  pub nose_correct: bool,
  pub mouth_correct: bool,
  pub face_correct: bool,
  pub total_points: u8,
}

/// The three workflow steps of an attempt, in order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStep {
  Recreate,
  Lineup,
  Results,
}
