//! Static substitute data for every domain entity.
//!
//! The canonical seed is parsed once from a compiled-in asset and never
//! mutated. Simulated writes (enrollment, submissions, read marks, demo
//! registrations) go to a working copy through [`FallbackDataSet::update`],
//! which clones on write and only commits when the closure succeeds.

use crate::domain::model::{
    Announcement, Assignment, CourseDetail, Evaluation, Grade, ScheduleEntry, Subject, UserProfile,
};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

const DEMO_DATASET: &str = include_str!("../../data/demo_dataset.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoUser {
    pub password: String,
    pub token: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl DemoUser {
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.profile.id,
            display_name: self.profile.username.clone(),
            email: self.profile.email.clone(),
            roles: self.profile.roles.clone(),
        }
    }

    /// Matches either the email (case-insensitive) or the username.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        self.profile.email.eq_ignore_ascii_case(identifier) || self.profile.username == identifier
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default)]
    pub users: Vec<DemoUser>,
    #[serde(default)]
    pub courses: Vec<CourseDetail>,
    #[serde(default)]
    pub grades: Vec<Grade>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
}

impl Collections {
    pub fn user_by_token(&self, token: &str) -> Option<&DemoUser> {
        self.users.iter().find(|u| u.token == token)
    }

    pub fn course(&self, id: u64) -> Option<&CourseDetail> {
        self.courses.iter().find(|c| c.course.id == id)
    }

    pub fn evaluation(&self, id: u64) -> Option<&Evaluation> {
        self.evaluations.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Courses,
    Grades,
    Schedule,
    Assignments,
    Announcements,
    Evaluations,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Courses => "courses",
            Collection::Grades => "grades",
            Collection::Schedule => "schedule",
            Collection::Assignments => "assignments",
            Collection::Announcements => "announcements",
            Collection::Evaluations => "evaluations",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct FallbackDataSet {
    seed: Arc<Collections>,
    working: RwLock<Arc<Collections>>,
}

impl FallbackDataSet {
    pub fn new(collections: Collections) -> Self {
        let seed = Arc::new(collections);
        Self {
            working: RwLock::new(Arc::clone(&seed)),
            seed,
        }
    }

    /// Loads the bundled demo dataset.
    pub fn seeded() -> Result<Self> {
        Self::from_json(DEMO_DATASET)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let collections: Collections = serde_json::from_str(json)?;
        Ok(Self::new(collections))
    }

    pub fn seed(&self) -> &Collections {
        &self.seed
    }

    /// Current working copy. Cheap; the returned snapshot never changes.
    pub fn snapshot(&self) -> Arc<Collections> {
        Arc::clone(
            &self
                .working
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    /// Applies a simulated write to the working copy.
    ///
    /// The seed is never touched; a failing closure leaves the working copy unchanged.
    pub fn update<R>(&self, apply: impl FnOnce(&mut Collections) -> Result<R>) -> Result<R> {
        let mut guard = self
            .working
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = Arc::clone(&guard);
        let outcome = apply(Arc::make_mut(&mut next))?;
        *guard = next;
        Ok(outcome)
    }

    /// Drops every simulated write.
    pub fn reset(&self) {
        let mut guard = self
            .working
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::clone(&self.seed);
    }

    pub fn len(&self, collection: Collection) -> usize {
        let data = self.snapshot();
        match collection {
            Collection::Users => data.users.len(),
            Collection::Courses => data.courses.len(),
            Collection::Grades => data.grades.len(),
            Collection::Schedule => data.schedule.len(),
            Collection::Assignments => data.assignments.len(),
            Collection::Announcements => data.announcements.len(),
            Collection::Evaluations => data.evaluations.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AccessError;

    #[test]
    fn test_bundled_dataset_parses() {
        let data = FallbackDataSet::seeded().unwrap();
        assert!(data.len(Collection::Users) >= 1);
        assert!(data.len(Collection::Courses) >= 1);
        assert!(data.len(Collection::Grades) >= 1);
        assert!(data.len(Collection::Evaluations) >= 1);

        let demo = data.seed().user_by_token("demo-token-12345").unwrap();
        assert_eq!(demo.profile.email, "juan.perez@alumno.edu");
        assert!(demo.matches_identifier("JUAN.PEREZ@alumno.edu"));
        assert!(demo.matches_identifier("juan.perez"));
    }

    #[test]
    fn test_update_is_copy_on_write() {
        let data = FallbackDataSet::seeded().unwrap();
        let before = data.snapshot();

        data.update(|c| {
            c.announcements[0].read = true;
            Ok(())
        })
        .unwrap();

        assert!(data.snapshot().announcements[0].read);
        assert!(!before.announcements[0].read);
        assert!(!data.seed().announcements[0].read);

        data.reset();
        assert_eq!(*data.snapshot(), *data.seed());
    }

    #[test]
    fn test_failed_update_is_discarded() {
        let data = FallbackDataSet::seeded().unwrap();
        let outcome: Result<()> = data.update(|c| {
            c.courses.clear();
            Err(AccessError::not_found("Curso no encontrado"))
        });

        assert!(outcome.is_err());
        assert_eq!(data.len(Collection::Courses), data.seed().courses.len());
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Schedule.to_string(), "schedule");
        assert_eq!(Collection::Evaluations.name(), "evaluations");
    }
}
