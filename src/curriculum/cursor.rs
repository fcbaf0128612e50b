//! Lesson progression cursor
//!
//! Tracks which lesson a learner is on, which modules are expanded in the
//! outline and which lessons are done. Completing the active lesson goes
//! through a [`ProgressSink`] first; the cursor only moves once the sink
//! has accepted the completion.

use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

use super::grouper::{Curriculum, CurriculumLesson, CurriculumModule};

/// Destination for lesson completions, usually the progress API
#[async_trait]
pub trait ProgressSink: Send + Sync {
    type Error: Send;

    async fn record_completion(&self, lesson_key: &str) -> Result<(), Self::Error>;
}

/// Outcome of completing the active lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The next lesson became active
    Moved { from: String, to: String },
    /// The completed lesson was the last one; the active lesson is unchanged
    CourseCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lesson {0} is not part of this course")]
pub struct UnknownLesson(pub String);

#[derive(Debug, Error)]
pub enum CompleteError<E> {
    #[error("no lesson is active")]
    NoActiveLesson,
    #[error(transparent)]
    UnknownLesson(#[from] UnknownLesson),
    #[error("failed to record progress: {0}")]
    Sink(E),
}

/// Learner position within a curriculum
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonCursor {
    active: Option<String>,
    expanded: BTreeSet<String>,
    completed: BTreeSet<String>,
}

impl LessonCursor {
    /// Start at the first lesson of the first module that has lessons,
    /// with that module expanded.
    pub fn new<M, L>(curriculum: &Curriculum<M, L>) -> Self
    where
        M: CurriculumModule,
        L: CurriculumLesson,
    {
        let mut cursor = Self::default();
        cursor.reset(curriculum);
        cursor
    }

    fn reset<M: CurriculumModule, L: CurriculumLesson>(&mut self, curriculum: &Curriculum<M, L>) {
        self.active = None;
        if let Some((module, lesson)) = curriculum.first_lesson() {
            self.active = Some(lesson.key());
            self.expanded.insert(module.key());
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_expanded(&self, module_key: &str) -> bool {
        self.expanded.contains(module_key)
    }

    pub fn is_completed(&self, lesson_key: &str) -> bool {
        self.completed.contains(lesson_key)
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    /// Seed completions already recorded elsewhere, e.g. from the server.
    /// Keys outside the curriculum are ignored.
    pub fn restore_completed<M, L, I>(&mut self, curriculum: &Curriculum<M, L>, keys: I)
    where
        M: CurriculumModule,
        L: CurriculumLesson,
        I: IntoIterator<Item = String>,
    {
        for key in keys {
            if curriculum.find_lesson(&key).is_some() {
                self.completed.insert(key);
            }
        }
    }

    /// Make `lesson_key` active and expand its module.
    pub fn select<M, L>(&mut self, curriculum: &Curriculum<M, L>, lesson_key: &str) -> Result<(), UnknownLesson>
    where
        M: CurriculumModule,
        L: CurriculumLesson,
    {
        let (module, lesson) = curriculum
            .find_lesson(lesson_key)
            .ok_or_else(|| UnknownLesson(lesson_key.to_string()))?;
        self.active = Some(lesson.key());
        self.expanded.insert(module.key());
        Ok(())
    }

    /// Flip a module between expanded and collapsed, returning the new state
    pub fn toggle_module(&mut self, module_key: &str) -> bool {
        if self.expanded.remove(module_key) {
            false
        } else {
            self.expanded.insert(module_key.to_string());
            true
        }
    }

    /// Key of the lesson after `lesson_key` in progression order
    pub fn next_lesson_after<M, L>(&self, curriculum: &Curriculum<M, L>, lesson_key: &str) -> Option<String>
    where
        M: CurriculumModule,
        L: CurriculumLesson,
    {
        curriculum.next_after(lesson_key).map(|(_, l)| l.key())
    }

    /// Record the active lesson as complete and advance.
    ///
    /// The sink is called once. If it fails the cursor is left exactly as
    /// it was and the error is returned.
    pub async fn mark_complete<M, L, S>(
        &mut self,
        curriculum: &Curriculum<M, L>,
        sink: &S,
    ) -> Result<Advance, CompleteError<S::Error>>
    where
        M: CurriculumModule,
        L: CurriculumLesson,
        S: ProgressSink + ?Sized,
    {
        let current = self.active.clone().ok_or(CompleteError::NoActiveLesson)?;
        if curriculum.find_lesson(&current).is_none() {
            return Err(UnknownLesson(current).into());
        }

        sink.record_completion(&current)
            .await
            .map_err(CompleteError::Sink)?;

        self.completed.insert(current.clone());

        match curriculum.next_after(&current) {
            Some((module, lesson)) => {
                let next = lesson.key();
                self.active = Some(next.clone());
                self.expanded.insert(module.key());
                Ok(Advance::Moved {
                    from: current,
                    to: next,
                })
            }
            None => Ok(Advance::CourseCompleted),
        }
    }

    /// Reconcile with a regrouped curriculum.
    ///
    /// Keeps the active lesson when it still exists and starts over
    /// otherwise; forgets modules and completions that are gone.
    pub fn resync<M, L>(&mut self, curriculum: &Curriculum<M, L>)
    where
        M: CurriculumModule,
        L: CurriculumLesson,
    {
        self.completed
            .retain(|key| curriculum.find_lesson(key).is_some());
        self.expanded.retain(|key| curriculum.contains_module(key));

        let still_there = self
            .active
            .as_deref()
            .is_some_and(|key| curriculum.find_lesson(key).is_some());
        if !still_there {
            self.reset(curriculum);
        }
    }

    /// Completed share of the curriculum, 0 to 100
    pub fn progress_percent<M, L>(&self, curriculum: &Curriculum<M, L>) -> u32
    where
        M: CurriculumModule,
        L: CurriculumLesson,
    {
        let total = curriculum.lesson_count();
        if total == 0 {
            return 0;
        }
        let done = curriculum
            .lessons()
            .filter(|(_, l)| self.completed.contains(&l.key()))
            .count();
        (done * 100 / total) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::group;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct M(&'static str, i64);

    #[derive(Debug, Clone)]
    struct L(&'static str, &'static str, i64);

    impl CurriculumModule for M {
        fn key(&self) -> String {
            self.0.to_string()
        }
        fn order(&self) -> Option<i64> {
            Some(self.1)
        }
    }

    impl CurriculumLesson for L {
        fn key(&self) -> String {
            self.0.to_string()
        }
        fn module_key(&self) -> Option<String> {
            Some(self.1.to_string())
        }
        fn order(&self) -> Option<i64> {
            Some(self.2)
        }
    }

    /// Sink that records calls and fails while `fail` is set
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        type Error = String;

        async fn record_completion(&self, lesson_key: &str) -> Result<(), String> {
            self.calls.lock().unwrap().push(lesson_key.to_string());
            if self.fail {
                Err("network down".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn course() -> Curriculum<M, L> {
        group(
            &[M("m1", 1), M("m2", 2)],
            &[L("l1", "m1", 2), L("l2", "m1", 1), L("l3", "m2", 1)],
        )
    }

    #[test]
    fn test_initial_state() {
        let cursor = LessonCursor::new(&course());
        assert_eq!(cursor.active(), Some("l2"));
        assert!(cursor.is_expanded("m1"));
        assert!(!cursor.is_expanded("m2"));
        assert_eq!(cursor.completed().count(), 0);
    }

    #[test]
    fn test_initial_state_skips_empty_modules() {
        let curriculum = group(&[M("empty", 0), M("full", 1)], &[L("x", "full", 0)]);
        let cursor = LessonCursor::new(&curriculum);
        assert_eq!(cursor.active(), Some("x"));
        assert!(cursor.is_expanded("full"));
        assert!(!cursor.is_expanded("empty"));
    }

    #[test]
    fn test_empty_curriculum_has_no_active_lesson() {
        let curriculum = group::<M, L>(&[M("m", 0)], &[]);
        let cursor = LessonCursor::new(&curriculum);
        assert_eq!(cursor.active(), None);
    }

    #[test]
    fn test_select_sets_active_and_expands() {
        let curriculum = course();
        let mut cursor = LessonCursor::new(&curriculum);

        cursor.select(&curriculum, "l3").unwrap();
        assert_eq!(cursor.active(), Some("l3"));
        assert!(cursor.is_expanded("m2"));

        let err = cursor.select(&curriculum, "nope").unwrap_err();
        assert_eq!(err, UnknownLesson("nope".to_string()));
        assert_eq!(cursor.active(), Some("l3"));
    }

    #[test]
    fn test_toggle_module() {
        let mut cursor = LessonCursor::new(&course());
        assert!(!cursor.toggle_module("m1"));
        assert!(!cursor.is_expanded("m1"));
        assert!(cursor.toggle_module("m1"));
        assert!(cursor.is_expanded("m1"));
    }

    #[test]
    fn test_next_lesson_after() {
        let curriculum = course();
        let cursor = LessonCursor::new(&curriculum);
        assert_eq!(cursor.next_lesson_after(&curriculum, "l2").as_deref(), Some("l1"));
        assert_eq!(cursor.next_lesson_after(&curriculum, "l1").as_deref(), Some("l3"));
        assert_eq!(cursor.next_lesson_after(&curriculum, "l3"), None);
    }

    #[tokio::test]
    async fn test_mark_complete_advances_across_modules() {
        let curriculum = course();
        let sink = RecordingSink::default();
        let mut cursor = LessonCursor::new(&curriculum);

        let first = cursor.mark_complete(&curriculum, &sink).await.unwrap();
        assert_eq!(
            first,
            Advance::Moved {
                from: "l2".to_string(),
                to: "l1".to_string()
            }
        );

        let second = cursor.mark_complete(&curriculum, &sink).await.unwrap();
        assert_eq!(
            second,
            Advance::Moved {
                from: "l1".to_string(),
                to: "l3".to_string()
            }
        );
        assert!(cursor.is_expanded("m2"));
        assert_eq!(*sink.calls.lock().unwrap(), vec!["l2", "l1"]);
    }

    #[tokio::test]
    async fn test_completing_last_lesson_keeps_it_active() {
        let curriculum = course();
        let sink = RecordingSink::default();
        let mut cursor = LessonCursor::new(&curriculum);
        cursor.select(&curriculum, "l3").unwrap();

        let outcome = cursor.mark_complete(&curriculum, &sink).await.unwrap();
        assert_eq!(outcome, Advance::CourseCompleted);
        assert_eq!(cursor.active(), Some("l3"));
        assert!(cursor.is_completed("l3"));
    }

    #[tokio::test]
    async fn test_sink_failure_leaves_state_unchanged() {
        let curriculum = course();
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let mut cursor = LessonCursor::new(&curriculum);
        let before = cursor.clone();

        let err = cursor.mark_complete(&curriculum, &sink).await.unwrap_err();
        assert!(matches!(err, CompleteError::Sink(ref msg) if msg == "network down"));
        assert_eq!(cursor, before);
        assert_eq!(sink.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_complete_without_active_lesson() {
        let curriculum = group::<M, L>(&[], &[]);
        let sink = RecordingSink::default();
        let mut cursor = LessonCursor::new(&curriculum);

        let err = cursor.mark_complete(&curriculum, &sink).await.unwrap_err();
        assert!(matches!(err, CompleteError::NoActiveLesson));
        assert!(sink.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_complete_works_through_dyn_sink() {
        let curriculum = course();
        let sink: Box<dyn ProgressSink<Error = String>> = Box::new(RecordingSink::default());
        let mut cursor = LessonCursor::new(&curriculum);

        let outcome = cursor.mark_complete(&curriculum, sink.as_ref()).await.unwrap();
        assert!(matches!(outcome, Advance::Moved { .. }));
    }

    #[test]
    fn test_resync_keeps_existing_active_lesson() {
        let curriculum = course();
        let mut cursor = LessonCursor::new(&curriculum);
        cursor.select(&curriculum, "l3").unwrap();
        cursor.restore_completed(&curriculum, vec!["l2".to_string(), "l1".to_string()]);

        let changed = group(&[M("m2", 1)], &[L("l3", "m2", 1), L("l4", "m2", 2)]);
        cursor.resync(&changed);

        assert_eq!(cursor.active(), Some("l3"));
        assert_eq!(cursor.completed().count(), 0);
        assert!(!cursor.is_expanded("m1"));
        assert!(cursor.is_expanded("m2"));
    }

    #[test]
    fn test_resync_restarts_when_active_lesson_removed() {
        let curriculum = course();
        let mut cursor = LessonCursor::new(&curriculum);

        let changed = group(&[M("m2", 1)], &[L("l3", "m2", 1)]);
        cursor.resync(&changed);

        assert_eq!(cursor.active(), Some("l3"));
        assert!(cursor.is_expanded("m2"));
    }

    #[test]
    fn test_progress_percent() {
        let curriculum = course();
        let mut cursor = LessonCursor::new(&curriculum);
        assert_eq!(cursor.progress_percent(&curriculum), 0);

        cursor.restore_completed(&curriculum, vec!["l1".to_string(), "ghost".to_string()]);
        assert_eq!(cursor.progress_percent(&curriculum), 33);

        cursor.restore_completed(&curriculum, vec!["l2".to_string(), "l3".to_string()]);
        assert_eq!(cursor.progress_percent(&curriculum), 100);
    }
}
