//! Curriculum grouping

use serde::{Deserialize, Serialize};

/// A module as seen by the grouper
pub trait CurriculumModule {
    /// Normalized identifier
    fn key(&self) -> String;
    /// Display order; `None` sorts as 0
    fn order(&self) -> Option<i64>;
}

/// A lesson as seen by the grouper
pub trait CurriculumLesson {
    /// Normalized identifier
    fn key(&self) -> String;
    /// Normalized key of the owning module, if the lesson references one
    fn module_key(&self) -> Option<String>;
    /// Order within the module; `None` sorts as 0
    fn order(&self) -> Option<i64>;
}

/// One module with its ordered lessons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section<M, L> {
    pub module: M,
    pub lessons: Vec<L>,
}

/// Ordered sections of a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curriculum<M, L> {
    sections: Vec<Section<M, L>>,
}

/// Group `lessons` under `modules`.
///
/// Lessons are matched to modules by normalized key and sorted by order
/// within their module, then modules are sorted by their own order. Both
/// sorts are stable. Lessons without a module reference, or whose
/// reference matches no module, are left out.
pub fn group<M, L>(modules: &[M], lessons: &[L]) -> Curriculum<M, L>
where
    M: CurriculumModule + Clone,
    L: CurriculumLesson + Clone,
{
    let mut sections: Vec<Section<M, L>> = modules
        .iter()
        .map(|module| {
            let key = module.key();
            let mut matched: Vec<L> = lessons
                .iter()
                .filter(|lesson| lesson.module_key().as_deref() == Some(key.as_str()))
                .cloned()
                .collect();
            matched.sort_by_key(|lesson| lesson.order().unwrap_or(0));
            Section {
                module: module.clone(),
                lessons: matched,
            }
        })
        .collect();

    sections.sort_by_key(|section| section.module.order().unwrap_or(0));

    Curriculum { sections }
}

impl<M, L> Curriculum<M, L> {
    pub fn sections(&self) -> &[Section<M, L>] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<Section<M, L>> {
        self.sections
    }

    /// True when no module has any lesson
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.lessons.is_empty())
    }

    /// Number of lessons placed under a module
    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    /// Every placed lesson with its module, in progression order
    pub fn lessons(&self) -> impl Iterator<Item = (&M, &L)> {
        self.sections
            .iter()
            .flat_map(|s| s.lessons.iter().map(move |l| (&s.module, l)))
    }
}

impl<M: CurriculumModule, L: CurriculumLesson> Curriculum<M, L> {
    /// Look up a lesson and its module by lesson key
    pub fn find_lesson(&self, lesson_key: &str) -> Option<(&M, &L)> {
        self.lessons().find(|(_, l)| l.key() == lesson_key)
    }

    pub fn contains_module(&self, module_key: &str) -> bool {
        self.sections.iter().any(|s| s.module.key() == module_key)
    }

    /// First lesson of the first module that has lessons
    pub fn first_lesson(&self) -> Option<(&M, &L)> {
        self.lessons().next()
    }

    /// The lesson immediately after `lesson_key` in progression order.
    ///
    /// Scans the whole tree each call. Returns `None` for the last lesson
    /// and for keys that are not in the curriculum.
    pub fn next_after(&self, lesson_key: &str) -> Option<(&M, &L)> {
        let mut lessons = self.lessons();
        lessons.find(|(_, l)| l.key() == lesson_key)?;
        lessons.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct M {
        id: String,
        order: Option<i64>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct L {
        id: String,
        module: Option<String>,
        order: Option<i64>,
    }

    impl CurriculumModule for M {
        fn key(&self) -> String {
            self.id.clone()
        }
        fn order(&self) -> Option<i64> {
            self.order
        }
    }

    impl CurriculumLesson for L {
        fn key(&self) -> String {
            self.id.clone()
        }
        fn module_key(&self) -> Option<String> {
            self.module.clone()
        }
        fn order(&self) -> Option<i64> {
            self.order
        }
    }

    fn m(id: &str, order: Option<i64>) -> M {
        M {
            id: id.to_string(),
            order,
        }
    }

    fn l(id: &str, module: Option<&str>, order: Option<i64>) -> L {
        L {
            id: id.to_string(),
            module: module.map(str::to_string),
            order,
        }
    }

    fn ids(curriculum: &Curriculum<M, L>) -> Vec<(String, Vec<String>)> {
        curriculum
            .sections()
            .iter()
            .map(|s| {
                (
                    s.module.id.clone(),
                    s.lessons.iter().map(|l| l.id.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_groups_and_orders_reference_course() {
        let modules = vec![m("m1", Some(1)), m("m2", Some(2))];
        let lessons = vec![
            l("l1", Some("m1"), Some(2)),
            l("l2", Some("m1"), Some(1)),
            l("l3", Some("m2"), Some(1)),
        ];

        let curriculum = group(&modules, &lessons);

        assert_eq!(
            ids(&curriculum),
            vec![
                ("m1".to_string(), vec!["l2".to_string(), "l1".to_string()]),
                ("m2".to_string(), vec!["l3".to_string()]),
            ]
        );
        assert_eq!(curriculum.first_lesson().map(|(_, l)| l.id.as_str()), Some("l2"));
    }

    #[test]
    fn test_modules_sorted_by_order() {
        let modules = vec![m("late", Some(5)), m("early", Some(-1)), m("none", None)];
        let curriculum = group::<M, L>(&modules, &[]);

        let order: Vec<&str> = curriculum.sections().iter().map(|s| s.module.id.as_str()).collect();
        assert_eq!(order, vec!["early", "none", "late"]);
        assert!(curriculum.is_empty());
    }

    #[test]
    fn test_missing_order_counts_as_zero_and_ties_are_stable() {
        let modules = vec![m("m", None)];
        let lessons = vec![
            l("a", Some("m"), Some(0)),
            l("b", Some("m"), None),
            l("c", Some("m"), Some(-3)),
            l("d", Some("m"), Some(0)),
        ];

        let curriculum = group(&modules, &lessons);
        assert_eq!(
            ids(&curriculum)[0].1,
            vec!["c".to_string(), "a".to_string(), "b".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn test_unmatched_and_orphan_lessons_are_dropped() {
        let modules = vec![m("m1", Some(1))];
        let lessons = vec![
            l("kept", Some("m1"), Some(1)),
            l("orphan", None, Some(1)),
            l("stray", Some("gone"), Some(1)),
        ];

        let curriculum = group(&modules, &lessons);
        assert_eq!(curriculum.lesson_count(), 1);
        assert!(curriculum.find_lesson("orphan").is_none());
        assert!(curriculum.find_lesson("stray").is_none());
    }

    #[test]
    fn test_next_after_crosses_modules() {
        let modules = vec![m("m1", Some(1)), m("empty", Some(2)), m("m3", Some(3))];
        let lessons = vec![
            l("a", Some("m1"), Some(1)),
            l("b", Some("m1"), Some(2)),
            l("c", Some("m3"), Some(1)),
        ];
        let curriculum = group(&modules, &lessons);

        let next = |key: &str| curriculum.next_after(key).map(|(m, l)| (m.id.clone(), l.id.clone()));
        assert_eq!(next("a"), Some(("m1".to_string(), "b".to_string())));
        assert_eq!(next("b"), Some(("m3".to_string(), "c".to_string())));
        assert_eq!(next("c"), None);
        assert_eq!(next("missing"), None);
    }

    #[test]
    fn test_empty_input() {
        let curriculum = group::<M, L>(&[], &[]);
        assert!(curriculum.sections().is_empty());
        assert!(curriculum.first_lesson().is_none());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn input() -> impl Strategy<Value = (Vec<M>, Vec<L>)> {
            (0usize..6).prop_flat_map(|module_count| {
                let modules = prop::collection::vec(prop::option::of(-3i64..4), module_count)
                    .prop_map(|orders| {
                        orders
                            .into_iter()
                            .enumerate()
                            .map(|(i, order)| m(&format!("m{}", i), order))
                            .collect::<Vec<_>>()
                    });
                // Module references range past the last module to produce strays.
                let lessons = prop::collection::vec(
                    (prop::option::of(0usize..module_count + 2), prop::option::of(-3i64..4)),
                    0..20,
                )
                .prop_map(|specs| {
                    specs
                        .into_iter()
                        .enumerate()
                        .map(|(i, (module, order))| L {
                            id: format!("l{}", i),
                            module: module.map(|idx| format!("m{}", idx)),
                            order,
                        })
                        .collect::<Vec<_>>()
                });
                (modules, lessons)
            })
        }

        proptest! {
            #[test]
            fn each_lesson_placed_under_its_module_or_dropped((modules, lessons) in input()) {
                let curriculum = group(&modules, &lessons);

                for lesson in &lessons {
                    let homes: Vec<&str> = curriculum
                        .sections()
                        .iter()
                        .filter(|s| s.lessons.iter().any(|x| x.id == lesson.id))
                        .map(|s| s.module.id.as_str())
                        .collect();
                    let expected = lesson
                        .module
                        .as_deref()
                        .filter(|key| modules.iter().any(|m| m.id == *key));

                    match expected {
                        Some(key) => prop_assert_eq!(homes, vec![key]),
                        None => prop_assert!(homes.is_empty()),
                    }
                }
            }

            #[test]
            fn lessons_within_module_non_decreasing((modules, lessons) in input()) {
                let curriculum = group(&modules, &lessons);
                for section in curriculum.sections() {
                    for pair in section.lessons.windows(2) {
                        prop_assert!(pair[0].order.unwrap_or(0) <= pair[1].order.unwrap_or(0));
                    }
                }
            }

            #[test]
            fn modules_non_decreasing((modules, lessons) in input()) {
                let curriculum = group(&modules, &lessons);
                prop_assert_eq!(curriculum.sections().len(), modules.len());
                for pair in curriculum.sections().windows(2) {
                    prop_assert!(pair[0].module.order.unwrap_or(0) <= pair[1].module.order.unwrap_or(0));
                }
            }

            #[test]
            fn equal_orders_keep_input_order((modules, lessons) in input()) {
                let curriculum = group(&modules, &lessons);
                let position = |id: &str| lessons.iter().position(|l| l.id == id);
                for section in curriculum.sections() {
                    for pair in section.lessons.windows(2) {
                        if pair[0].order.unwrap_or(0) == pair[1].order.unwrap_or(0) {
                            prop_assert!(position(&pair[0].id) < position(&pair[1].id));
                        }
                    }
                }
            }
        }
    }
}
