//! Wire documents for curricula fetched over HTTP
//!
//! Ids arrive as numbers or strings and a lesson's module reference may be
//! a bare id or a populated module object. Documents may carry `id`,
//! `_id` or both; `id` wins. Everything is normalized to string keys for
//! the grouper.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::grouper::{CurriculumLesson, CurriculumModule};

/// An id that may be serialized as a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    Number(i64),
    Text(String),
}

impl DocId {
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Number(n) => write!(f, "{}", n),
            DocId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocId {
    fn from(id: i64) -> Self {
        DocId::Number(id)
    }
}

/// Pick the document id, preferring `id` over a Mongo-style `_id`
fn pick_id(id: Option<DocId>, mongo_id: Option<DocId>) -> Result<DocId, String> {
    id.or(mongo_id)
        .ok_or_else(|| "document has neither `id` nor `_id`".to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPopulatedModule")]
pub struct PopulatedModule {
    pub id: DocId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Deserialize)]
struct RawPopulatedModule {
    #[serde(default)]
    id: Option<DocId>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<DocId>,
    #[serde(default)]
    title: Option<String>,
}

impl TryFrom<RawPopulatedModule> for PopulatedModule {
    type Error = String;

    fn try_from(raw: RawPopulatedModule) -> Result<Self, Self::Error> {
        Ok(Self {
            id: pick_id(raw.id, raw.mongo_id)?,
            title: raw.title,
        })
    }
}

/// A lesson's reference to its module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleRef {
    Id(DocId),
    Populated(PopulatedModule),
}

impl ModuleRef {
    pub fn key(&self) -> String {
        match self {
            ModuleRef::Id(id) => id.as_key(),
            ModuleRef::Populated(module) => module.id.as_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawModuleDoc")]
pub struct ModuleDoc {
    pub id: DocId,
    pub title: String,
    pub title_bn: Option<String>,
    pub order: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModuleDoc {
    #[serde(default)]
    id: Option<DocId>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<DocId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    title_bn: Option<String>,
    #[serde(default)]
    order: Option<i64>,
}

impl TryFrom<RawModuleDoc> for ModuleDoc {
    type Error = String;

    fn try_from(raw: RawModuleDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            id: pick_id(raw.id, raw.mongo_id)?,
            title: raw.title,
            title_bn: raw.title_bn,
            order: raw.order,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawLessonDoc")]
pub struct LessonDoc {
    pub id: DocId,
    pub title: String,
    pub title_bn: Option<String>,
    pub module: Option<ModuleRef>,
    pub order: Option<i64>,
    pub video_url: Option<String>,
    pub video_duration: Option<i64>,
    pub is_free: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLessonDoc {
    #[serde(default)]
    id: Option<DocId>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<DocId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    title_bn: Option<String>,
    #[serde(default)]
    module: Option<ModuleRef>,
    #[serde(default)]
    order: Option<i64>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    video_duration: Option<i64>,
    #[serde(default)]
    is_free: bool,
}

impl TryFrom<RawLessonDoc> for LessonDoc {
    type Error = String;

    fn try_from(raw: RawLessonDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            id: pick_id(raw.id, raw.mongo_id)?,
            title: raw.title,
            title_bn: raw.title_bn,
            module: raw.module,
            order: raw.order,
            video_url: raw.video_url,
            video_duration: raw.video_duration,
            is_free: raw.is_free,
        })
    }
}

impl CurriculumModule for ModuleDoc {
    fn key(&self) -> String {
        self.id.as_key()
    }

    fn order(&self) -> Option<i64> {
        self.order
    }
}

impl CurriculumLesson for LessonDoc {
    fn key(&self) -> String {
        self.id.as_key()
    }

    fn module_key(&self) -> Option<String> {
        self.module.as_ref().map(ModuleRef::key)
    }

    fn order(&self) -> Option<i64> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::group;
    use serde_json::json;

    #[test]
    fn test_module_ref_shapes() {
        let lessons: Vec<LessonDoc> = serde_json::from_value(json!([
            { "id": 1, "title": "numeric", "module": 10 },
            { "_id": "a1", "title": "string", "module": "10" },
            { "id": "a2", "title": "populated", "module": { "_id": "10", "title": "Intro" } },
            { "id": "a3", "title": "populated id", "module": { "id": 10 } },
            { "id": "a4", "title": "orphan" },
            { "id": "a5", "title": "null module", "module": null }
        ]))
        .unwrap();

        let keys: Vec<Option<String>> = lessons.iter().map(|l| l.module_key()).collect();
        assert_eq!(
            keys,
            vec![
                Some("10".to_string()),
                Some("10".to_string()),
                Some("10".to_string()),
                Some("10".to_string()),
                None,
                None
            ]
        );
        assert_eq!(lessons[1].key(), "a1");
    }

    #[test]
    fn test_groups_mixed_id_shapes() {
        let modules: Vec<ModuleDoc> = serde_json::from_value(json!([
            { "_id": "m2", "title": "Two", "order": 2 },
            { "_id": "m1", "title": "One", "order": 1 }
        ]))
        .unwrap();
        let lessons: Vec<LessonDoc> = serde_json::from_value(json!([
            { "_id": "l1", "title": "L1", "module": "m1", "order": 2 },
            { "_id": "l2", "title": "L2", "module": { "_id": "m1" }, "order": 1 },
            { "_id": "l3", "title": "L3", "module": "m2", "order": 1 }
        ]))
        .unwrap();

        let curriculum = group(&modules, &lessons);
        let outline: Vec<(String, Vec<String>)> = curriculum
            .sections()
            .iter()
            .map(|s| (s.module.key(), s.lessons.iter().map(|l| l.key()).collect()))
            .collect();

        assert_eq!(
            outline,
            vec![
                ("m1".to_string(), vec!["l2".to_string(), "l1".to_string()]),
                ("m2".to_string(), vec!["l3".to_string()]),
            ]
        );
    }

    #[test]
    fn test_documents_with_both_id_keys() {
        let modules: Vec<ModuleDoc> = serde_json::from_value(json!([
            { "_id": "m1", "id": "m1", "title": "One" }
        ]))
        .unwrap();
        let lessons: Vec<LessonDoc> = serde_json::from_value(json!([
            { "_id": "l1", "id": "l1", "title": "L", "module": { "_id": "m1", "id": "m1" } },
            { "_id": "stale", "id": "l2", "module": "m1", "order": 2 }
        ]))
        .unwrap();

        assert_eq!(lessons[0].key(), "l1");
        assert_eq!(lessons[1].key(), "l2");
        assert_eq!(lessons[1].title, "");

        let curriculum = group(&modules, &lessons);
        assert_eq!(curriculum.lesson_count(), 2);
    }

    #[test]
    fn test_document_without_any_id_is_rejected() {
        let result = serde_json::from_value::<LessonDoc>(json!({ "title": "nameless" }));
        assert!(result.is_err());
    }
}
