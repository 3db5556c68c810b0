//! Course store: read-only challenge lookup by lesson and challenge id

use codetutor_common::Challenge;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::factory::parse_challenge_type;

/// Read-only source of challenges
pub trait CourseStore: Send + Sync {
    fn challenge(&self, lesson_id: &str, challenge_id: &str) -> Result<Challenge>;
}

/// Lesson outline used by listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonOutline {
    pub module_id: String,
    pub lesson_id: String,
    pub title: String,
    pub challenge_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CourseFile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    modules: Vec<ModuleFile>,
}

#[derive(Debug, Deserialize)]
struct ModuleFile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    lessons: Vec<LessonFile>,
}

#[derive(Debug, Deserialize)]
struct LessonFile {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    exercises: Vec<Value>,
}

/// Course loaded from one JSON file (`course -> modules -> lessons -> exercises`)
#[derive(Debug, Default)]
pub struct JsonCourseStore {
    course_id: String,
    title: String,
    outline: Vec<LessonOutline>,
    challenges: HashMap<(String, String), Challenge>,
}

impl JsonCourseStore {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            course = %store.course_id,
            lessons = store.outline.len(),
            challenges = store.challenges.len(),
            "course loaded"
        );
        Ok(store)
    }

    /// Parse a course document
    ///
    /// Every exercise's `type` goes through the challenge factory first, so
    /// an unknown discriminator fails the whole load instead of surfacing
    /// at submission time.
    pub fn from_json(json: &str) -> Result<Self> {
        let course: CourseFile =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidCourse(e.to_string()))?;

        let mut store = JsonCourseStore {
            course_id: course.id,
            title: course.title,
            ..Default::default()
        };

        for module in course.modules {
            for lesson in module.lessons {
                let mut challenge_ids = Vec::with_capacity(lesson.exercises.len());
                for exercise in lesson.exercises {
                    let challenge = parse_exercise(&lesson.id, exercise)?;
                    challenge_ids.push(challenge.id.clone());
                    let key = (lesson.id.clone(), challenge.id.clone());
                    if store.challenges.insert(key, challenge).is_some() {
                        return Err(EngineError::InvalidCourse(format!(
                            "duplicate challenge id in lesson {}",
                            lesson.id
                        )));
                    }
                }
                store.outline.push(LessonOutline {
                    module_id: module.id.clone(),
                    lesson_id: lesson.id,
                    title: lesson.title,
                    challenge_ids,
                });
            }
        }

        Ok(store)
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn outline(&self) -> &[LessonOutline] {
        &self.outline
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

impl CourseStore for JsonCourseStore {
    fn challenge(&self, lesson_id: &str, challenge_id: &str) -> Result<Challenge> {
        self.challenges
            .get(&(lesson_id.to_string(), challenge_id.to_string()))
            .cloned()
            .ok_or_else(|| EngineError::ChallengeNotFound {
                lesson_id: lesson_id.to_string(),
                challenge_id: challenge_id.to_string(),
            })
    }
}

fn parse_exercise(lesson_id: &str, exercise: Value) -> Result<Challenge> {
    let id = exercise
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<missing id>")
        .to_string();
    let discriminator = exercise.get("type").and_then(Value::as_str).unwrap_or("");
    let challenge_type = parse_challenge_type(discriminator)?;

    // Course files use several spellings; the typed model wants one
    let mut exercise = exercise;
    if let Some(object) = exercise.as_object_mut() {
        object.insert(
            "type".to_string(),
            Value::String(challenge_type.as_str().to_string()),
        );
    }

    serde_json::from_value(exercise).map_err(|e| {
        EngineError::InvalidCourse(format!("lesson {} exercise {}: {}", lesson_id, id, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codetutor_common::ChallengeType;

    const COURSE: &str = r#"{
        "id": "python-basics",
        "language": "python",
        "title": "Python Basics",
        "modules": [{
            "id": "m1",
            "title": "Getting started",
            "lessons": [{
                "id": "l1",
                "title": "Printing",
                "content": { "body": "Use print()" },
                "exercises": [
                    { "type": "MULTIPLE_CHOICE", "id": "q1", "title": "Which prints?",
                      "options": ["echo", "print"], "correctAnswer": 1 },
                    { "type": "freeCoding", "id": "hello", "title": "Say hello", "points": 15,
                      "language": "python",
                      "testCases": [{ "description": "greets", "expectedOutput": "Hello", "isVisible": true }] }
                ]
            }]
        }]
    }"#;

    #[test]
    fn test_lookup_by_lesson_and_challenge() {
        let store = JsonCourseStore::from_json(COURSE).unwrap();

        assert_eq!(store.course_id(), "python-basics");
        assert_eq!(store.len(), 2);

        let challenge = store.challenge("l1", "hello").unwrap();
        assert_eq!(challenge.challenge_type(), ChallengeType::FreeCoding);
        assert_eq!(challenge.points, 15);

        assert_eq!(store.outline()[0].challenge_ids, vec!["q1", "hello"]);
    }

    #[test]
    fn test_unknown_challenge_is_not_found() {
        let store = JsonCourseStore::from_json(COURSE).unwrap();
        let err = store.challenge("l1", "nope").unwrap_err();
        assert!(matches!(err, EngineError::ChallengeNotFound { .. }));

        let err = store.challenge("l2", "hello").unwrap_err();
        assert_eq!(err.to_string(), "Challenge not found: l2/hello");
    }

    #[test]
    fn test_unknown_type_fails_load() {
        let json = r#"{ "modules": [{ "lessons": [{ "id": "l1", "exercises": [
            { "type": "DRAG_AND_DROP", "id": "d1", "title": "Drag" }
        ] }] }] }"#;

        let err = JsonCourseStore::from_json(json).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedChallengeType(ref t) if t == "DRAG_AND_DROP"));
    }

    #[test]
    fn test_malformed_exercise_is_invalid_course() {
        let json = r#"{ "modules": [{ "lessons": [{ "id": "l1", "exercises": [
            { "type": "TRUE_FALSE", "id": "tf", "title": "Missing answer" }
        ] }] }] }"#;

        let err = JsonCourseStore::from_json(json).unwrap_err();
        assert!(err.to_string().contains("lesson l1 exercise tf"));
    }

    #[test]
    fn test_bundled_course_parses() {
        let store =
            JsonCourseStore::from_json(include_str!("../../../content/course.json")).unwrap();
        assert_eq!(store.len(), 6);

        let types: Vec<_> = store.outline()[0]
            .challenge_ids
            .iter()
            .map(|id| store.challenge("lesson-1-1", id).unwrap().challenge_type())
            .collect();
        assert_eq!(types, ChallengeType::all_variants());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.json");
        std::fs::write(&path, COURSE).unwrap();

        let store = JsonCourseStore::load(&path).await.unwrap();
        assert_eq!(store.title(), "Python Basics");

        let missing = JsonCourseStore::load(dir.path().join("absent.json")).await;
        assert!(matches!(missing, Err(EngineError::Io(_))));
    }
}
