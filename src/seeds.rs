//! Seed content: a built-in face module and a few catalog courses so the app
//! is usable without a remote content store or a TOML bank.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{
  AccessLevel, ComponentOption, ContentOrigin, Course, CourseType, FaceComponents, FaceModule,
  Lesson, LineupCandidate, Target, VideoSource,
};

pub const SEED_MODULE_ID: &str = "module-seed-1";

fn filler(id: &str, url: &str, label: &str) -> ComponentOption {
  ComponentOption { id: id.into(), image_url: url.into(), label: label.into() }
}

fn lineup_face(id: &str, n: usize, correct: bool) -> LineupCandidate {
  LineupCandidate {
    id: id.into(),
    image_url: format!("/images/lineup/face{n}.png"),
    label: format!("Face {n}"),
    correct,
  }
}

fn seed_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(year, month, day, 9, 0, 0)
    .single()
    .unwrap_or_else(Utc::now)
}

/// The fixed filler component pools. Every face module offers these next to
/// its own assets; ids are static and never collide with store asset ids.
pub fn filler_components() -> FaceComponents {
  FaceComponents {
    eyes: vec![
      filler("eyes-filler-1", "/images/fillers/eyes/1.png", "Eyes 1"),
      filler("eyes-filler-2", "/images/fillers/eyes/2.png", "Eyes 2"),
    ],
    noses: vec![
      filler("nose-filler-1", "/images/fillers/nose/1.png", "Nose 1"),
      filler("nose-filler-2", "/images/fillers/nose/2.png", "Nose 2"),
    ],
    mouths: vec![
      filler("mouth-filler-1", "/images/fillers/mouth/1.png", "Mouth 1"),
      filler("mouth-filler-2", "/images/fillers/mouth/2.png", "Mouth 2"),
    ],
  }
}

/// The built-in exercise module: the filler components and two targets with
/// five-face lineups, one face flagged correct in each.
pub fn seed_face_module() -> FaceModule {
  FaceModule {
    id: SEED_MODULE_ID.into(),
    title: "Gezichtsherkenning: basis".into(),
    instruction: "Bekijk de video, stel het gezicht samen en kies daarna het juiste gezicht uit de lineup.".into(),
    video: Some(VideoSource::Link { url: "https://www.youtube.com/watch?v=seed-intro".into() }),
    components: filler_components(),
    targets: vec![
      Target {
        face_url: "/images/targets/target1.png".into(),
        lineup: vec![
          lineup_face("seed-l1", 1, false),
          lineup_face("seed-l2", 2, true),
          lineup_face("seed-l3", 3, false),
          lineup_face("seed-l4", 4, false),
          lineup_face("seed-l5", 5, false),
        ],
      },
      Target {
        face_url: "/images/targets/target2.png".into(),
        lineup: vec![
          lineup_face("seed-l6", 6, false),
          lineup_face("seed-l7", 7, false),
          lineup_face("seed-l8", 8, false),
          lineup_face("seed-l9", 9, true),
          lineup_face("seed-l10", 10, false),
        ],
      },
    ],
    origin: ContentOrigin::Seed,
  }
}

/// Minimal catalog so filtering and sorting are exercised out of the box.
pub fn seed_courses() -> Vec<Course> {
  vec![
    Course {
      id: "course-seed-1".into(),
      title: "Gezichts-recreatie".into(),
      description: "Leer gezichtskenmerken herkennen en reconstrueer het gezicht uit onderdelen.".into(),
      access_level: AccessLevel::Free,
      course_type: CourseType::FaceRecreate,
      duration: "45 mins".into(),
      rating: 4.6,
      preview_image_url: "/images/previews/recreatie.png".into(),
      slug: "gezichts-recreatie".into(),
      created_at: seed_date(2024, 11, 12),
      updated_at: None,
      face_module_id: Some(SEED_MODULE_ID.into()),
      lessons: vec![],
      origin: ContentOrigin::Seed,
    },
    Course {
      id: "course-seed-2".into(),
      title: "Observatie voor beginners".into(),
      description: "Korte introductie in systematisch observeren.".into(),
      access_level: AccessLevel::Free,
      course_type: CourseType::Standard,
      duration: "25 mins".into(),
      rating: 4.1,
      preview_image_url: "/images/previews/observatie.png".into(),
      slug: "observatie-basis".into(),
      created_at: seed_date(2024, 10, 3),
      updated_at: None,
      face_module_id: None,
      lessons: vec![
        Lesson {
          id: "lesson-seed-1".into(),
          title: "Kijken versus zien".into(),
          description: "Waarom details tellen.".into(),
          duration: "10 mins".into(),
          video_url: None,
          order: 1,
        },
        Lesson {
          id: "lesson-seed-2".into(),
          title: "Signalementen".into(),
          description: "Een bruikbaar signalement opstellen.".into(),
          duration: "15 mins".into(),
          video_url: None,
          order: 2,
        },
      ],
      origin: ContentOrigin::Seed,
    },
    Course {
      id: "course-seed-3".into(),
      title: "Verdieping getuigenverhoor".into(),
      description: "Interviewtechniek voor betrouwbare reconstructies.".into(),
      access_level: AccessLevel::Premium,
      course_type: CourseType::Standard,
      duration: "2 hours 15 mins".into(),
      rating: 4.8,
      preview_image_url: "/images/previews/verhoor.png".into(),
      slug: "getuigenverhoor".into(),
      created_at: seed_date(2024, 9, 20),
      updated_at: None,
      face_module_id: None,
      lessons: vec![],
      origin: ContentOrigin::Seed,
    },
  ]
}
