//! Course curriculum
//!
//! Turns the flat module and lesson lists of a course into an ordered
//! tree, and tracks a learner's position in that tree.
//!
//! - [`group`] builds a [`Curriculum`] from any module and lesson types
//!   implementing [`CurriculumModule`] and [`CurriculumLesson`].
//! - [`LessonCursor`] holds the active lesson, the expanded modules and
//!   the completed lessons, and advances on completion through a
//!   [`ProgressSink`].
//! - [`doc`] holds loosely-typed wire documents for curricula fetched
//!   from the API, where ids may be numbers, strings or populated objects.

pub mod cursor;
pub mod doc;
mod grouper;

pub use cursor::{Advance, CompleteError, LessonCursor, ProgressSink, UnknownLesson};
pub use doc::{DocId, LessonDoc, ModuleDoc, ModuleRef};
pub use grouper::{group, Curriculum, CurriculumLesson, CurriculumModule, Section};
