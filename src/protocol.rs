//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::catalog::parse_duration_minutes;
use crate::domain::{
    Course, ExerciseResult, ExerciseStep, FaceComponents, FaceModule, Lesson, LineupCandidate,
    Region, Selections, VideoSource,
};
use crate::exercise::{preview_layers, PreviewLayer};
use crate::state::ExerciseSession;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListCourses {
        #[serde(default)]
        access: Option<String>,
        #[serde(default)]
        duration: Option<String>,
        #[serde(default)]
        sort: Option<String>,
    },
    StartSession {
        #[serde(rename = "moduleId")]
        module_id: String,
        #[serde(default)]
        target: usize,
    },
    SetSelection {
        #[serde(rename = "sessionId")]
        session_id: String,
        region: Region,
        #[serde(rename = "componentId")]
        component_id: String,
    },
    ProceedToLineup {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    SubmitPick {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "candidateId")]
        candidate_id: String,
    },
    GetResult {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Courses {
        courses: Vec<CourseOut>,
    },
    Session {
        session: SessionOut,
    },
    Result {
        result: ResultOut,
    },
    Error {
        message: String,
        /// Step the client should navigate back to, when the error is a
        /// premature step transition. The SPA swaps its trailing path segment.
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect_to: Option<ExerciseStep>,
    },
}

/// Catalog listing entry shared by WS and HTTP.
#[derive(Debug, Serialize)]
pub struct CourseOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub access_level: crate::domain::AccessLevel,
    pub course_type: crate::domain::CourseType,
    pub duration: String,
    pub duration_minutes: u32,
    pub rating: f32,
    pub preview_image_url: String,
    pub slug: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub face_module_id: Option<String>,
    pub lessons: Vec<Lesson>,
}

pub fn to_course_out(c: &Course) -> CourseOut {
    CourseOut {
        id: c.id.clone(),
        title: c.title.clone(),
        description: c.description.clone(),
        access_level: c.access_level,
        course_type: c.course_type,
        duration: c.duration.clone(),
        duration_minutes: parse_duration_minutes(&c.duration),
        rating: c.rating,
        preview_image_url: c.preview_image_url.clone(),
        slug: c.slug.clone(),
        created_at: c.created_at,
        face_module_id: c.face_module_id.clone(),
        lessons: c.lessons.clone(),
    }
}

/// Face-module DTO: everything the intro/recreate screens need. Correctness
/// flags are stripped from the lineup; scoring stays server-side.
#[derive(Debug, Serialize)]
pub struct ModuleOut {
    pub id: String,
    pub title: String,
    pub instruction: String,
    pub video: Option<VideoSource>,
    pub components: FaceComponents,
    pub targets: Vec<TargetOut>,
}

#[derive(Debug, Serialize)]
pub struct TargetOut {
    pub face_url: String,
    pub lineup: Vec<LineupFaceOut>,
}

#[derive(Debug, Serialize)]
pub struct LineupFaceOut {
    pub id: String,
    pub image_url: String,
    pub label: String,
}

pub fn to_module_out(m: &FaceModule) -> ModuleOut {
    ModuleOut {
        id: m.id.clone(),
        title: m.title.clone(),
        instruction: m.instruction.clone(),
        video: m.video.clone(),
        components: m.components.clone(),
        targets: m.targets.iter().map(to_target_out).collect(),
    }
}

fn to_target_out(t: &crate::domain::Target) -> TargetOut {
    TargetOut {
        face_url: t.face_url.clone(),
        lineup: t.lineup.iter().map(to_lineup_face_out).collect(),
    }
}

fn to_lineup_face_out(c: &LineupCandidate) -> LineupFaceOut {
    LineupFaceOut { id: c.id.clone(), image_url: c.image_url.clone(), label: c.label.clone() }
}

/// Session snapshot: current step, picks, option pools, lineup, and the
/// composed preview. The answer key is never serialized.
#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub id: String,
    pub module_id: String,
    pub target_index: usize,
    pub target_face_url: String,
    pub step: ExerciseStep,
    pub components: FaceComponents,
    pub lineup: Vec<LineupFaceOut>,
    pub selections: Selections,
    pub preview: Vec<PreviewLayer>,
}

pub fn to_session_out(s: &ExerciseSession) -> SessionOut {
    SessionOut {
        id: s.id.clone(),
        module_id: s.module_id.clone(),
        target_index: s.target_index,
        target_face_url: s.target_face_url.clone(),
        step: s.step,
        components: s.components.clone(),
        lineup: s.lineup.iter().map(to_lineup_face_out).collect(),
        selections: s.selections.clone(),
        preview: preview_layers(&s.selections, &s.components),
    }
}

#[derive(Debug, Serialize)]
pub struct ResultOut {
    pub eyes_correct: bool,
    pub nose_correct: bool,
    pub mouth_correct: bool,
    pub face_correct: bool,
    pub total_points: u8,
}

pub fn to_result_out(r: &ExerciseResult) -> ResultOut {
    ResultOut {
        eyes_correct: r.eyes_correct,
        nose_correct: r.nose_correct,
        mouth_correct: r.mouth_correct,
        face_correct: r.face_correct,
        total_points: r.total_points,
    }
}

//
// HTTP request/response DTOs
//

/// `GET /api/v1/courses` query: comma-separated filter tokens plus a sort key.
/// Absent or empty filter params mean "show all".
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionIn {
    #[serde(rename = "moduleId")]
    pub module_id: String,
    #[serde(default)]
    pub target: usize,
}

#[derive(Debug, Deserialize)]
pub struct SelectionIn {
    pub region: Region,
    #[serde(rename = "componentId")]
    pub component_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PickIn {
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<ExerciseStep>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
