//! Minimal client for the hosted structured-content store.
//!
//! We only issue read-only GROQ queries against the store's query endpoint
//! and decode the nested document JSON into domain types. All correctness
//! comparison happens locally after the full document is retrieved; the
//! store is an opaque document fetch with no transactional guarantees.
//!
//! NOTE: We never log the API token and keep payload truncations short.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::domain::{
  AccessLevel, ComponentOption, ContentOrigin, Course, CourseType, FaceComponents, FaceModule,
  Lesson, LineupCandidate, Target, VideoSource,
};
use crate::util::trunc_for_log;

const ALL_COURSES_QUERY: &str = r#"*[_type == "course"]{
  _id, title, description, accessLevel, duration, rating, courseType,
  previewImage{asset->{_id, url}},
  slug, createdAt, updatedAt,
  "faceCreateModule": faceCreateModule->{_id},
  "lessons": *[_type == "lesson" && course._ref == ^._id]{
    _id, title, description, duration, videoURL, order
  } | order(order asc)
} | order(createdAt desc)"#;

const FACE_MODULE_QUERY: &str = r#"*[_type == "faceCreate" && _id == $id][0]{
  _id, title, instruction,
  moduleVideo{videoType, videoURL, uploadedVideo{asset->{_id, url}}},
  faceComponents{
    eyes[]{asset->{_id, url}},
    noses[]{asset->{_id, url}},
    mouths[]{asset->{_id, url}}
  },
  targets[]{
    targetFace{asset->{_id, url}},
    lineupFaces[]{image{asset->{_id, url}}, correct, asset->{_id, url}}
  }
}"#;

#[derive(Clone)]
pub struct ContentStore {
  pub client: reqwest::Client,
  pub base_url: String,
  pub dataset: String,
  token: Option<String>,
}

impl ContentStore {
  /// Construct the client if we find CONTENT_PROJECT_ID; otherwise None.
  pub fn from_env() -> Option<Self> {
    let project = std::env::var("CONTENT_PROJECT_ID").ok()?;
    let dataset = std::env::var("CONTENT_DATASET").unwrap_or_else(|_| "production".into());
    let api_version =
      std::env::var("CONTENT_API_VERSION").unwrap_or_else(|_| "2024-10-01".into());
    let token = std::env::var("CONTENT_TOKEN").ok();

    // A stalled fetch is bounded by this timeout; the caller sees one error,
    // no retries. Dropping the request future cancels the fetch.
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    let base_url = format!("https://{project}.api.sanity.io/v{api_version}");
    Some(Self { client, base_url, dataset, token })
  }

  /// Run one GROQ query and decode the `result` field of the envelope.
  #[instrument(level = "info", skip(self, groq, params), fields(dataset = %self.dataset))]
  async fn query<T: for<'a> Deserialize<'a>>(
    &self,
    groq: &str,
    params: &[(&str, String)],
  ) -> Result<T, String> {
    #[derive(Deserialize)]
    struct Envelope<T> {
      result: T,
    }

    let url = format!("{}/data/query/{}", self.base_url, self.dataset);
    let mut req = self
      .client
      .get(&url)
      .header(USER_AGENT, "gezicht-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .query(&[("query", groq)])
      .query(params);
    if let Some(token) = &self.token {
      req = req.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let res = req.send().await.map_err(|e| e.to_string())?;
    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("content store HTTP {}: {}", status, trunc_for_log(&body, 300)));
    }

    let envelope: Envelope<T> = res.json().await.map_err(|e| e.to_string())?;
    Ok(envelope.result)
  }

  /// Fetch all course documents, ordered by creation date descending.
  #[instrument(level = "info", skip(self))]
  pub async fn fetch_courses(&self) -> Result<Vec<Course>, String> {
    let docs: Vec<CourseDoc> = self.query(ALL_COURSES_QUERY, &[]).await?;
    let courses: Vec<Course> = docs.into_iter().map(course_from_doc).collect();
    info!(target: "gezicht_backend", count = courses.len(), "Fetched course documents");
    Ok(courses)
  }

  /// Fetch one face-module document by id; Ok(None) when it does not exist.
  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn fetch_face_module(&self, id: &str) -> Result<Option<FaceModule>, String> {
    // GROQ params are JSON-encoded values.
    let id_param = serde_json::to_string(id).map_err(|e| e.to_string())?;
    let doc: Option<ModuleDoc> =
      self.query(FACE_MODULE_QUERY, &[("$id", id_param)]).await?;
    Ok(doc.map(module_from_doc))
  }
}

// --- Store document DTOs ---

#[derive(Deserialize)]
struct AssetDoc {
  #[serde(rename = "_id")]
  id: String,
  #[serde(default)]
  url: String,
}

#[derive(Deserialize, Default)]
struct ImageDoc {
  #[serde(default)]
  asset: Option<AssetDoc>,
}

#[derive(Deserialize)]
struct SlugDoc {
  current: String,
}

#[derive(Deserialize)]
struct RefDoc {
  #[serde(rename = "_id")]
  id: String,
}

#[derive(Deserialize)]
struct LessonDoc {
  #[serde(rename = "_id")]
  id: String,
  title: String,
  #[serde(default)]
  description: String,
  #[serde(default)]
  duration: String,
  #[serde(rename = "videoURL", default)]
  video_url: Option<String>,
  #[serde(default)]
  order: u32,
}

#[derive(Deserialize)]
struct CourseDoc {
  #[serde(rename = "_id")]
  id: String,
  title: String,
  #[serde(default)]
  description: String,
  #[serde(rename = "accessLevel")]
  access_level: AccessLevel,
  #[serde(default)]
  duration: String,
  #[serde(default)]
  rating: f32,
  #[serde(rename = "courseType", default)]
  course_type: Option<CourseType>,
  #[serde(rename = "previewImage", default)]
  preview_image: Option<ImageDoc>,
  slug: SlugDoc,
  #[serde(rename = "createdAt", default)]
  created_at: Option<String>,
  #[serde(rename = "updatedAt", default)]
  updated_at: Option<String>,
  #[serde(rename = "faceCreateModule", default)]
  face_module: Option<RefDoc>,
  #[serde(default)]
  lessons: Vec<LessonDoc>,
}

#[derive(Deserialize)]
struct VideoDoc {
  #[serde(rename = "videoType", default)]
  video_type: Option<String>,
  #[serde(rename = "videoURL", default)]
  video_url: Option<String>,
  #[serde(rename = "uploadedVideo", default)]
  uploaded_video: Option<ImageDoc>,
}

#[derive(Deserialize, Default)]
struct ComponentsDoc {
  #[serde(default)]
  eyes: Vec<ImageDoc>,
  #[serde(default)]
  noses: Vec<ImageDoc>,
  #[serde(default)]
  mouths: Vec<ImageDoc>,
}

/// Lineup entries come in two authored formats: the new object form
/// (`image` + `correct`) and the legacy bare image. Both decode here.
#[derive(Deserialize)]
struct LineupFaceDoc {
  #[serde(default)]
  image: Option<ImageDoc>,
  #[serde(default)]
  correct: Option<bool>,
  #[serde(default)]
  asset: Option<AssetDoc>,
}

#[derive(Deserialize)]
struct TargetDoc {
  #[serde(rename = "targetFace", default)]
  target_face: Option<ImageDoc>,
  #[serde(rename = "lineupFaces", default)]
  lineup_faces: Vec<LineupFaceDoc>,
}

#[derive(Deserialize)]
struct ModuleDoc {
  #[serde(rename = "_id")]
  id: String,
  #[serde(default)]
  title: String,
  #[serde(default)]
  instruction: String,
  #[serde(rename = "moduleVideo", default)]
  module_video: Option<VideoDoc>,
  #[serde(rename = "faceComponents", default)]
  face_components: Option<ComponentsDoc>,
  #[serde(default)]
  targets: Vec<TargetDoc>,
}

// --- Conversions into domain types ---

fn parse_store_date(raw: Option<&str>, doc_id: &str) -> Option<DateTime<Utc>> {
  let raw = raw?;
  match DateTime::parse_from_rfc3339(raw) {
    Ok(d) => Some(d.with_timezone(&Utc)),
    Err(e) => {
      warn!(target: "gezicht_backend", %doc_id, raw, error = %e, "Unparsable store datetime");
      None
    }
  }
}

fn course_from_doc(doc: CourseDoc) -> Course {
  let created_at =
    parse_store_date(doc.created_at.as_deref(), &doc.id).unwrap_or_else(Utc::now);
  let updated_at = parse_store_date(doc.updated_at.as_deref(), &doc.id);
  Course {
    created_at,
    updated_at,
    title: doc.title,
    description: doc.description,
    access_level: doc.access_level,
    course_type: doc.course_type.unwrap_or_default(),
    duration: doc.duration,
    rating: doc.rating,
    preview_image_url: doc
      .preview_image
      .and_then(|i| i.asset)
      .map(|a| a.url)
      .unwrap_or_default(),
    slug: doc.slug.current,
    face_module_id: doc.face_module.map(|r| r.id),
    lessons: doc
      .lessons
      .into_iter()
      .map(|l| Lesson {
        id: l.id,
        title: l.title,
        description: l.description,
        duration: l.duration,
        video_url: l.video_url,
        order: l.order,
      })
      .collect(),
    id: doc.id,
    origin: ContentOrigin::Remote,
  }
}

fn options_from_images(images: Vec<ImageDoc>, label: &str) -> Vec<ComponentOption> {
  images
    .into_iter()
    .filter_map(|i| i.asset)
    .map(|a| ComponentOption { id: a.id, image_url: a.url, label: label.to_string() })
    .collect()
}

fn video_from_doc(doc: VideoDoc) -> Option<VideoSource> {
  match doc.video_type.as_deref() {
    Some("link") => doc.video_url.map(|url| VideoSource::Link { url }),
    Some("upload") => doc
      .uploaded_video
      .and_then(|v| v.asset)
      .map(|a| VideoSource::Upload { url: a.url }),
    _ => None,
  }
}

fn module_from_doc(doc: ModuleDoc) -> FaceModule {
  let components = doc.face_components.unwrap_or_default();

  // Pools offer the fixed fillers next to the store assets. Store assets
  // stay in front: the answer key is the first entry per region and must
  // not move when the fillers are appended.
  let fillers = crate::seeds::filler_components();
  let mut eyes = options_from_images(components.eyes, "Store Eye");
  let mut noses = options_from_images(components.noses, "Store Nose");
  let mut mouths = options_from_images(components.mouths, "Store Mouth");
  eyes.extend(fillers.eyes);
  noses.extend(fillers.noses);
  mouths.extend(fillers.mouths);

  let targets = doc
    .targets
    .into_iter()
    .map(|t| Target {
      face_url: t
        .target_face
        .and_then(|f| f.asset)
        .map(|a| a.url)
        .unwrap_or_default(),
      lineup: t
        .lineup_faces
        .into_iter()
        .enumerate()
        .filter_map(|(idx, f)| lineup_from_doc(idx, f))
        .collect(),
    })
    .collect();

  FaceModule {
    id: doc.id,
    title: doc.title,
    instruction: doc.instruction,
    video: doc.module_video.and_then(video_from_doc),
    components: FaceComponents { eyes, noses, mouths },
    targets,
    origin: ContentOrigin::Remote,
  }
}

fn lineup_from_doc(idx: usize, doc: LineupFaceDoc) -> Option<LineupCandidate> {
  // New format first; legacy bare images carry no correctness flag.
  let (asset, correct) = match (doc.image.and_then(|i| i.asset), doc.asset) {
    (Some(asset), _) => (asset, doc.correct.unwrap_or(false)),
    (None, Some(asset)) => (asset, false),
    (None, None) => return None,
  };
  Some(LineupCandidate {
    id: asset.id,
    image_url: asset.url,
    label: format!("Face {}", idx + 1),
    correct,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lineup_decoding_handles_both_authored_formats() {
    let new_format: LineupFaceDoc = serde_json::from_str(
      r#"{"image": {"asset": {"_id": "img-1", "url": "/a.png"}}, "correct": true}"#,
    )
    .expect("new format");
    let got = lineup_from_doc(0, new_format).expect("candidate");
    assert_eq!(got.id, "img-1");
    assert!(got.correct);

    let legacy: LineupFaceDoc =
      serde_json::from_str(r#"{"asset": {"_id": "img-2", "url": "/b.png"}}"#).expect("legacy");
    let got = lineup_from_doc(4, legacy).expect("candidate");
    assert_eq!(got.id, "img-2");
    assert_eq!(got.label, "Face 5");
    assert!(!got.correct);
  }

  #[test]
  fn course_doc_maps_nested_fields() {
    let doc: CourseDoc = serde_json::from_str(
      r#"{
        "_id": "c1",
        "title": "Cursus",
        "accessLevel": "premium",
        "duration": "1 hour 30 mins",
        "rating": 4.5,
        "courseType": "faceRecreate",
        "previewImage": {"asset": {"_id": "img", "url": "/p.png"}},
        "slug": {"current": "cursus"},
        "createdAt": "2024-11-02T10:00:00Z",
        "faceCreateModule": {"_id": "m1"},
        "lessons": []
      }"#,
    )
    .expect("course doc");
    let course = course_from_doc(doc);
    assert_eq!(course.slug, "cursus");
    assert_eq!(course.preview_image_url, "/p.png");
    assert_eq!(course.face_module_id.as_deref(), Some("m1"));
    assert_eq!(course.course_type, CourseType::FaceRecreate);
    assert_eq!(course.origin, ContentOrigin::Remote);
  }

  #[test]
  fn module_pools_mix_store_assets_with_fillers() {
    let doc: ModuleDoc = serde_json::from_str(
      r#"{
        "_id": "m1",
        "title": "Module",
        "faceComponents": {
          "eyes": [
            {"asset": {"_id": "store-eye-1", "url": "/e1.png"}},
            {"asset": {"_id": "store-eye-2", "url": "/e2.png"}}
          ],
          "noses": [{"asset": {"_id": "store-nose-1", "url": "/n1.png"}}],
          "mouths": [{"asset": {"_id": "store-mouth-1", "url": "/m1.png"}}]
        },
        "targets": []
      }"#,
    )
    .expect("module doc");
    let module = module_from_doc(doc);

    // Store assets first, fillers appended behind them.
    assert_eq!(module.components.eyes[0].id, "store-eye-1");
    assert!(module.components.eyes.iter().any(|o| o.id == "eyes-filler-1"));
    assert!(module.components.noses.iter().any(|o| o.id == "nose-filler-2"));
    assert!(module.components.mouths.iter().any(|o| o.id == "mouth-filler-1"));

    // The answer key still comes off the store entries.
    let key = crate::exercise::derive_correct_components(&module.components);
    assert_eq!(key.eyes.as_deref(), Some("store-eye-1"));
    assert_eq!(key.nose.as_deref(), Some("store-nose-1"));
    assert_eq!(key.mouth.as_deref(), Some("store-mouth-1"));
  }

  #[test]
  fn module_doc_without_pools_still_offers_fillers() {
    let doc: ModuleDoc = serde_json::from_str(
      r#"{"_id": "m1", "title": "", "targets": []}"#,
    )
    .expect("module doc");
    let module = module_from_doc(doc);
    assert!(module.components.eyes.iter().all(|o| o.id.starts_with("eyes-filler")));
    assert!(!module.components.eyes.is_empty());
    assert!(module.targets.is_empty());
    assert!(module.video.is_none());
  }
}
