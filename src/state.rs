//! Application state: in-memory content stores, exercise sessions, and the
//! optional remote content client.
//!
//! This module owns:
//!   - the course store (by id, with a slug index and the fetched order)
//!   - the face-module store
//!   - the session store (one entry per exercise attempt)
//!
//! Sessions replace the original app's page-shared context: each attempt is
//! an explicitly-scoped state object keyed by id, never a process singleton.
//! A session copies its option pools and lineup at start, so an attempt is
//! self-contained and a later store refresh cannot change a running attempt.

use std::{collections::HashMap, fmt, sync::Arc};

use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_bank_config_from_env, BankConfig, ModuleCfg};
use crate::content::ContentStore;
use crate::domain::{
    ContentOrigin, CorrectComponents, Course, ExerciseResult, ExerciseStep, FaceComponents,
    FaceModule, LineupCandidate, Region, Selections, Target, VideoSource,
};
use crate::exercise::{derive_correct_components, shuffle_components, verify_lineup};
use crate::seeds::{seed_courses, seed_face_module};

/// One face-recreation attempt. Owns the picks, the answer key, and (once
/// computed) the result.
#[derive(Clone, Debug)]
pub struct ExerciseSession {
    pub id: String,
    pub module_id: String,
    pub target_index: usize,
    pub target_face_url: String,
    pub step: ExerciseStep,
    pub components: FaceComponents,
    pub lineup: Vec<LineupCandidate>,
    pub selections: Selections,
    pub correct: CorrectComponents,
    pub result: Option<ExerciseResult>,
}

/// Workflow errors surfaced to the API layer. All are terminal for the
/// current request; recovery is navigating back, never an automatic retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    UnknownSession(String),
    UnknownModule(String),
    UnknownTarget { module_id: String, target_index: usize },
    EmptyLineup { module_id: String, target_index: usize },
    IncompleteSelection,
    WrongStep { current: ExerciseStep, required: ExerciseStep },
    UnknownCandidate(String),
    NoResultYet,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSession(id) => write!(f, "Unknown session: {id}"),
            Self::UnknownModule(id) => write!(f, "Unknown face module: {id}"),
            Self::UnknownTarget { module_id, target_index } => {
                write!(f, "Module {module_id} has no target {target_index}")
            }
            Self::EmptyLineup { module_id, target_index } => write!(
                f,
                "Target {target_index} of module {module_id} has no lineup faces; content failed to load"
            ),
            Self::IncompleteSelection => {
                write!(f, "Choose eyes, nose and mouth before going to the lineup")
            }
            Self::WrongStep { current, required } => {
                write!(f, "Step is {current:?}, this action needs {required:?}")
            }
            Self::UnknownCandidate(id) => write!(f, "Unknown lineup candidate: {id}"),
            Self::NoResultYet => write!(f, "No result for this attempt yet"),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub courses_by_id: Arc<RwLock<HashMap<String, Course>>>,
    pub course_order: Arc<RwLock<Vec<String>>>,
    pub slug_index: Arc<RwLock<HashMap<String, String>>>,
    pub modules: Arc<RwLock<HashMap<String, FaceModule>>>,
    pub sessions: Arc<RwLock<HashMap<String, ExerciseSession>>>,
    pub content: Option<ContentStore>,
}

impl AppState {
    /// Build state from env: load the TOML bank, insert seeds, build indices,
    /// init the remote content client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let mut courses = HashMap::<String, Course>::new();
        let mut order = Vec::<String>::new();
        let mut slugs = HashMap::<String, String>::new();
        let mut modules = HashMap::<String, FaceModule>::new();

        if let Some(bank) = load_bank_config_from_env() {
            insert_bank(&bank, &mut courses, &mut order, &mut slugs, &mut modules);
        }

        // Always insert built-in seeds, but don't overwrite existing entries.
        for course in seed_courses() {
            if courses.contains_key(&course.id) {
                continue;
            }
            order.push(course.id.clone());
            slugs.insert(course.slug.clone(), course.id.clone());
            courses.insert(course.id.clone(), course);
        }
        let seed_module = seed_face_module();
        modules.entry(seed_module.id.clone()).or_insert(seed_module);

        // Inventory summary by origin.
        let mut count_by_origin: HashMap<ContentOrigin, usize> = HashMap::new();
        for course in courses.values() {
            *count_by_origin.entry(course.origin).or_insert(0) += 1;
        }
        for (origin, count) in count_by_origin {
            info!(target: "catalog", ?origin, count, "Startup course inventory");
        }

        let content = ContentStore::from_env();
        if let Some(store) = &content {
            info!(target: "gezicht_backend", base_url = %store.base_url, dataset = %store.dataset, "Remote content store enabled.");
        } else {
            info!(target: "gezicht_backend", "Remote content store disabled (no CONTENT_PROJECT_ID). Serving bank/seed content.");
        }

        Self {
            courses_by_id: Arc::new(RwLock::new(courses)),
            course_order: Arc::new(RwLock::new(order)),
            slug_index: Arc::new(RwLock::new(slugs)),
            modules: Arc::new(RwLock::new(modules)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            content,
        }
    }

    /// Pull the full course list from the remote store and merge it in. The
    /// stores are only touched after the whole fetch succeeded, so a failed
    /// or abandoned fetch never leaves a half-written catalog.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh_from_remote(&self) -> Result<usize, String> {
        let Some(store) = &self.content else {
            return Err("remote content store not configured".into());
        };
        let fetched = store.fetch_courses().await?;
        let count = fetched.len();

        let mut courses = self.courses_by_id.write().await;
        let mut order = self.course_order.write().await;
        let mut slugs = self.slug_index.write().await;

        // Remote content replaces earlier remote content and shadows seeds;
        // the fetched order becomes the tie-breaking display order.
        courses.retain(|_, c| c.origin != ContentOrigin::Remote);
        order.clear();
        slugs.clear();
        for course in fetched {
            order.push(course.id.clone());
            slugs.insert(course.slug.clone(), course.id.clone());
            courses.insert(course.id.clone(), course);
        }
        let mut local: Vec<&Course> =
            courses.values().filter(|c| c.origin != ContentOrigin::Remote).collect();
        local.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for course in local {
            order.push(course.id.clone());
            slugs.entry(course.slug.clone()).or_insert_with(|| course.id.clone());
        }

        info!(target: "catalog", count, "Remote course refresh applied");
        Ok(count)
    }

    /// Courses in display (fetched) order.
    pub async fn list_courses(&self) -> Vec<Course> {
        let courses = self.courses_by_id.read().await;
        let order = self.course_order.read().await;
        order.iter().filter_map(|id| courses.get(id).cloned()).collect()
    }

    #[instrument(level = "debug", skip(self), fields(%slug))]
    pub async fn course_by_slug(&self, slug: &str) -> Option<Course> {
        let id = { self.slug_index.read().await.get(slug).cloned() }?;
        self.courses_by_id.read().await.get(&id).cloned()
    }

    /// Face module by id: the store first, then one remote fetch (cached on
    /// success). Misses are served from whatever we have; never retried.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn get_module(&self, id: &str) -> Option<FaceModule> {
        if let Some(module) = { self.modules.read().await.get(id).cloned() } {
            return Some(module);
        }
        let store = self.content.as_ref()?;
        match store.fetch_face_module(id).await {
            Ok(Some(module)) => {
                self.modules.write().await.insert(module.id.clone(), module.clone());
                info!(target: "exercise", %id, "Face module fetched from remote store");
                Some(module)
            }
            Ok(None) => {
                warn!(target: "exercise", %id, "Face module not found in remote store");
                None
            }
            Err(e) => {
                error!(target: "exercise", %id, error = %e, "Face module fetch failed");
                None
            }
        }
    }

    /// Start an attempt for one module target. Copies the (shuffled) option
    /// pools and the lineup into the session and derives the answer key once.
    #[instrument(level = "info", skip(self), fields(%module_id, target_index))]
    pub async fn start_session(
        &self,
        module_id: &str,
        target_index: usize,
    ) -> Result<ExerciseSession, SessionError> {
        let module = self
            .get_module(module_id)
            .await
            .ok_or_else(|| SessionError::UnknownModule(module_id.to_string()))?;
        let target: &Target = module.targets.get(target_index).ok_or(SessionError::UnknownTarget {
            module_id: module_id.to_string(),
            target_index,
        })?;
        if target.lineup.is_empty() {
            return Err(SessionError::EmptyLineup {
                module_id: module_id.to_string(),
                target_index,
            });
        }

        let correct = derive_correct_components(&module.components);
        let mut components = module.components.clone();
        shuffle_components(&mut components);

        let session = ExerciseSession {
            id: Uuid::new_v4().to_string(),
            module_id: module_id.to_string(),
            target_index,
            target_face_url: target.face_url.clone(),
            step: ExerciseStep::Recreate,
            components,
            lineup: target.lineup.clone(),
            selections: Selections::default(),
            correct,
            result: None,
        };
        self.sessions.write().await.insert(session.id.clone(), session.clone());
        info!(target: "exercise", session_id = %session.id, %module_id, "Attempt started");
        Ok(session)
    }

    pub async fn get_session(&self, id: &str) -> Result<ExerciseSession, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))
    }

    /// Overwrite one region pick. The guard for a complete set only applies
    /// at the proceed-to-lineup action, not here.
    #[instrument(level = "info", skip(self), fields(%session_id, ?region))]
    pub async fn set_selection(
        &self,
        session_id: &str,
        region: Region,
        component_id: String,
    ) -> Result<ExerciseSession, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;
        session.selections.set(region, component_id);
        Ok(session.clone())
    }

    /// Advance recreate -> lineup. All three regions must be decided.
    #[instrument(level = "info", skip(self), fields(%session_id))]
    pub async fn proceed_to_lineup(
        &self,
        session_id: &str,
    ) -> Result<ExerciseSession, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;
        if session.step != ExerciseStep::Recreate {
            return Err(SessionError::WrongStep {
                current: session.step,
                required: ExerciseStep::Recreate,
            });
        }
        if !session.selections.complete() {
            return Err(SessionError::IncompleteSelection);
        }
        session.step = ExerciseStep::Lineup;
        Ok(session.clone())
    }

    /// Submit the single lineup pick, compute and store the result, and move
    /// to the results step. Pure local computation; no network.
    #[instrument(level = "info", skip(self), fields(%session_id, %candidate_id))]
    pub async fn submit_pick(
        &self,
        session_id: &str,
        candidate_id: &str,
    ) -> Result<ExerciseResult, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;
        if session.step != ExerciseStep::Lineup {
            return Err(SessionError::WrongStep {
                current: session.step,
                required: ExerciseStep::Lineup,
            });
        }
        let picked = session
            .lineup
            .iter()
            .find(|c| c.id == candidate_id)
            .ok_or_else(|| SessionError::UnknownCandidate(candidate_id.to_string()))?;

        let result = verify_lineup(&session.selections, &session.correct, picked);
        session.result = Some(result);
        session.step = ExerciseStep::Results;
        info!(
            target: "exercise",
            %session_id,
            total_points = result.total_points,
            face_correct = result.face_correct,
            "Lineup pick verified"
        );
        Ok(result)
    }

    /// The stored result, or a premature-navigation error when the attempt
    /// has not reached the results step.
    pub async fn result(&self, session_id: &str) -> Result<ExerciseResult, SessionError> {
        let session = self.get_session(session_id).await?;
        session.result.ok_or(SessionError::NoResultYet)
    }
}

fn insert_bank(
    bank: &BankConfig,
    courses: &mut HashMap<String, Course>,
    order: &mut Vec<String>,
    slugs: &mut HashMap<String, String>,
    modules: &mut HashMap<String, FaceModule>,
) {
    for cfg in &bank.modules {
        let module = module_from_cfg(cfg);
        modules.insert(module.id.clone(), module);
    }

    for cfg in &bank.courses {
        let id = cfg.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let created_at = cfg
            .created_at
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(chrono::Utc::now);
        let course = Course {
            id: id.clone(),
            title: cfg.title.clone(),
            description: cfg.description.clone(),
            access_level: cfg.access_level,
            course_type: if cfg.face_module.is_some() {
                crate::domain::CourseType::FaceRecreate
            } else {
                crate::domain::CourseType::Standard
            },
            duration: cfg.duration.clone(),
            rating: cfg.rating,
            preview_image_url: cfg.preview_image_url.clone(),
            slug: cfg.slug.clone(),
            created_at,
            updated_at: None,
            face_module_id: cfg.face_module.clone(),
            lessons: vec![],
            origin: ContentOrigin::LocalBank,
        };
        order.push(id.clone());
        slugs.insert(course.slug.clone(), id.clone());
        courses.insert(id, course);
    }
}

fn module_from_cfg(cfg: &ModuleCfg) -> FaceModule {
    let option = |a: &crate::config::AssetCfg, fallback: &str| crate::domain::ComponentOption {
        id: a.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
        image_url: a.url.clone(),
        label: a.label.clone().unwrap_or_else(|| fallback.to_string()),
    };
    FaceModule {
        id: cfg.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
        title: cfg.title.clone(),
        instruction: cfg.instruction.clone(),
        video: cfg.video_url.clone().map(|url| VideoSource::Link { url }),
        components: FaceComponents {
            eyes: cfg.eyes.iter().map(|a| option(a, "Eyes")).collect(),
            noses: cfg.noses.iter().map(|a| option(a, "Nose")).collect(),
            mouths: cfg.mouths.iter().map(|a| option(a, "Mouth")).collect(),
        },
        targets: cfg
            .targets
            .iter()
            .map(|t| Target {
                face_url: t.face_url.clone(),
                lineup: t
                    .lineup
                    .iter()
                    .enumerate()
                    .map(|(idx, l)| LineupCandidate {
                        id: l.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                        image_url: l.url.clone(),
                        label: format!("Face {}", idx + 1),
                        correct: l.correct,
                    })
                    .collect(),
            })
            .collect(),
        origin: ContentOrigin::LocalBank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Region;
    use crate::seeds::SEED_MODULE_ID;

    #[tokio::test]
    async fn full_attempt_reaches_a_result() {
        let state = AppState::new();
        let session = state.start_session(SEED_MODULE_ID, 0).await.expect("session");
        assert_eq!(session.step, ExerciseStep::Recreate);
        assert_eq!(session.lineup.len(), 5);

        // The answer key is the first pool entry per region; pick it for a
        // full regional score.
        let correct = session.correct.clone();
        state
            .set_selection(&session.id, Region::Eyes, correct.eyes.clone().expect("eyes key"))
            .await
            .expect("set eyes");
        state
            .set_selection(&session.id, Region::Nose, correct.nose.clone().expect("nose key"))
            .await
            .expect("set nose");
        state
            .set_selection(&session.id, Region::Mouth, correct.mouth.clone().expect("mouth key"))
            .await
            .expect("set mouth");

        state.proceed_to_lineup(&session.id).await.expect("proceed");
        let winner = session.lineup.iter().find(|c| c.correct).expect("seed has a correct face");
        let result = state.submit_pick(&session.id, &winner.id).await.expect("submit");
        assert_eq!(result.total_points, 6);
        assert_eq!(state.result(&session.id).await.expect("stored result"), result);
    }

    #[tokio::test]
    async fn lineup_is_gated_on_a_complete_selection() {
        let state = AppState::new();
        let session = state.start_session(SEED_MODULE_ID, 0).await.expect("session");
        state
            .set_selection(&session.id, Region::Eyes, "eyes-filler-1".into())
            .await
            .expect("set eyes");
        let err = state.proceed_to_lineup(&session.id).await.expect_err("incomplete");
        assert_eq!(err, SessionError::IncompleteSelection);
    }

    #[tokio::test]
    async fn premature_result_fetch_is_rejected() {
        let state = AppState::new();
        let session = state.start_session(SEED_MODULE_ID, 0).await.expect("session");
        let err = state.result(&session.id).await.expect_err("no result yet");
        assert_eq!(err, SessionError::NoResultYet);
    }

    #[tokio::test]
    async fn pick_requires_the_lineup_step() {
        let state = AppState::new();
        let session = state.start_session(SEED_MODULE_ID, 0).await.expect("session");
        let err = state.submit_pick(&session.id, "seed-l1").await.expect_err("wrong step");
        assert!(matches!(err, SessionError::WrongStep { .. }));
    }

    #[tokio::test]
    async fn unknown_target_index_is_an_error() {
        let state = AppState::new();
        let err = state.start_session(SEED_MODULE_ID, 9).await.expect_err("no such target");
        assert!(matches!(err, SessionError::UnknownTarget { .. }));
    }

    #[tokio::test]
    async fn session_components_are_a_private_copy() {
        let state = AppState::new();
        let session = state.start_session(SEED_MODULE_ID, 0).await.expect("session");
        let module = state.get_module(SEED_MODULE_ID).await.expect("module");
        // Same pool contents (order may differ after the shuffle).
        assert_eq!(session.components.eyes.len(), module.components.eyes.len());
        for opt in &module.components.eyes {
            assert!(session.components.eyes.iter().any(|o| o.id == opt.id));
        }
    }
}
