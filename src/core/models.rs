/*
 * Defines the data model of a course outline: modules, the items they contain,
 * and the metadata kept for uploaded files. Items are a tagged variant over the
 * four kinds a module row can be (page, file, link, section); every kind carries
 * only its own payload, so kind-specific fields like `collapsed` cannot leak onto
 * the wrong kind.
 *
 * All structures serialize to the flat camelCase JSON documents used by the
 * course store.
 */
use super::naming::{slugify, unique_slug};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::OffsetDateTime;

pub const MAX_INDENT: u8 = 3;

// A named, ordered container of items. The title is the module's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub title: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Module {
    pub fn new(title: impl Into<String>) -> Self {
        Module {
            title: title.into(),
            items: Vec::new(),
        }
    }

    pub fn item_index(&self, label: &str) -> Option<usize> {
        self.items.iter().position(|item| item.label == label)
    }

    pub fn item(&self, label: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.label == label)
    }

    pub fn item_mut(&mut self, label: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.label == label)
    }

    /* True when any file item in this module points at `file_id`. */
    pub fn references_file(&self, file_id: &str) -> bool {
        self.items
            .iter()
            .any(|item| item.kind.file_id() == Some(file_id))
    }

    /* Distinct file ids referenced by this module, in first-seen order. */
    pub fn referenced_file_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.items.iter().filter_map(|item| item.kind.file_id()) {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

// One row of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredItem")]
pub struct Item {
    pub label: String,
    #[serde(default)]
    pub indent: u8,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn new(label: impl Into<String>, kind: ItemKind) -> Self {
        Item {
            label: label.into(),
            indent: 0,
            kind,
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent.min(MAX_INDENT);
        self
    }

    pub fn is_section(&self) -> bool {
        matches!(self.kind, ItemKind::Section { .. })
    }

    pub fn is_collapsed_section(&self) -> bool {
        matches!(self.kind, ItemKind::Section { collapsed: true })
    }
}

/*
 * The stored shape of an item as older and imported documents may carry it:
 * every field optional, `indent` any JSON number, `collapsed` any truthy value
 * and `type` a free-form string. Unknown types are read as links so the row
 * and its label survive.
 */
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    indent: Option<serde_json::Value>,
    #[serde(default)]
    collapsed: Option<serde_json::Value>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    page_id: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

fn stored_indent(value: Option<&serde_json::Value>) -> u8 {
    let raw = value.and_then(serde_json::Value::as_f64).unwrap_or(0.0);
    if raw.is_finite() {
        raw.floor().clamp(0.0, MAX_INDENT as f64) as u8
    } else {
        0
    }
}

fn is_truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(serde_json::Value::Array(_)) | Some(serde_json::Value::Object(_)) => true,
        Some(serde_json::Value::Null) | None => false,
    }
}

impl From<StoredItem> for Item {
    fn from(stored: StoredItem) -> Self {
        let kind = match stored.kind.trim().to_ascii_lowercase().as_str() {
            "page" => ItemKind::Page {
                page_id: stored.page_id.unwrap_or_default(),
            },
            "file" => ItemKind::File {
                file_id: stored.file_id.filter(|id| !id.is_empty()),
                file_name: stored.file_name.unwrap_or_default(),
            },
            "section" => ItemKind::Section {
                collapsed: is_truthy(stored.collapsed.as_ref()),
            },
            "link" => ItemKind::Link {
                url: stored.url.unwrap_or_default(),
            },
            other => {
                log::warn!(
                    "Models: Item '{}' has unknown type '{other}'; reading it as a link.",
                    stored.label
                );
                ItemKind::Link {
                    url: stored.url.unwrap_or_default(),
                }
            }
        };
        Item {
            label: stored.label,
            indent: stored_indent(stored.indent.as_ref()),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Page {
        /* Empty only transiently, for stored pages that predate page ids. */
        #[serde(rename = "pageId", default)]
        page_id: String,
    },
    File {
        #[serde(rename = "fileId", default, skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        #[serde(rename = "fileName", default)]
        file_name: String,
    },
    Link {
        #[serde(default)]
        url: String,
    },
    Section {
        #[serde(default)]
        collapsed: bool,
    },
}

impl ItemKind {
    pub fn file_id(&self) -> Option<&str> {
        match self {
            ItemKind::File { file_id, .. } => file_id.as_deref(),
            _ => None,
        }
    }

    pub fn page_id(&self) -> Option<&str> {
        match self {
            ItemKind::Page { page_id } => Some(page_id.as_str()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ItemKind::Page { .. } => "page",
            ItemKind::File { .. } => "file",
            ItemKind::Link { .. } => "link",
            ItemKind::Section { .. } => "section",
        }
    }
}

/*
 * The payload a caller supplies when adding or editing an item. Page ids and the
 * collapsed flag are never taken from a draft; the mutation engine derives them.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub label: String,
    pub indent: u8,
    pub kind: DraftKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftKind {
    Page,
    File {
        file_id: Option<String>,
        file_name: String,
    },
    Link {
        url: String,
    },
    Section,
}

impl ItemDraft {
    pub fn page(label: impl Into<String>) -> Self {
        Self::with_kind(label, DraftKind::Page)
    }

    pub fn file(label: impl Into<String>, file_id: impl Into<String>) -> Self {
        let label = label.into();
        Self::with_kind(
            label.clone(),
            DraftKind::File {
                file_id: Some(file_id.into()),
                file_name: label,
            },
        )
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_kind(label, DraftKind::Link { url: url.into() })
    }

    pub fn section(label: impl Into<String>) -> Self {
        Self::with_kind(label, DraftKind::Section)
    }

    pub fn with_kind(label: impl Into<String>, kind: DraftKind) -> Self {
        ItemDraft {
            label: label.into(),
            indent: 0,
            kind,
        }
    }

    pub fn indented(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    pub fn file_id(&self) -> Option<&str> {
        match &self.kind {
            DraftKind::File { file_id, .. } => file_id.as_deref(),
            _ => None,
        }
    }
}

/*
 * Metadata for one uploaded file. `module_titles` is a derived back-reference:
 * the set of module titles whose item list currently holds a file item with this id.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredFileMeta")]
pub struct FileMeta {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub uploaded_at: i64,
    #[serde(default)]
    pub module_titles: BTreeSet<String>,
    #[serde(default)]
    pub checksum: String,
}

impl FileMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>, size: u64, mime: &str) -> Self {
        FileMeta {
            id: id.into(),
            name: name.into(),
            size,
            mime: mime.to_string(),
            uploaded_at: 0,
            module_titles: BTreeSet::new(),
            checksum: String::new(),
        }
    }
}

pub const DEFAULT_MIME: &str = "application/octet-stream";

/*
 * Stored metadata rows may lack anything but the id. Older rows carry a single
 * `moduleTitle` instead of the `moduleTitles` set.
 */
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFileMeta {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    mime: Option<String>,
    #[serde(default)]
    uploaded_at: Option<f64>,
    #[serde(default)]
    module_titles: Option<Vec<String>>,
    #[serde(default)]
    module_title: Option<String>,
    #[serde(default)]
    checksum: Option<String>,
}

impl From<StoredFileMeta> for FileMeta {
    fn from(stored: StoredFileMeta) -> Self {
        let module_titles = match (stored.module_titles, stored.module_title) {
            (Some(titles), _) => titles.into_iter().filter(|t| !t.is_empty()).collect(),
            (None, Some(title)) if !title.trim().is_empty() => {
                BTreeSet::from([title.trim().to_string()])
            }
            _ => BTreeSet::new(),
        };
        FileMeta {
            id: stored.id,
            name: stored.name.unwrap_or_default(),
            size: stored.size.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(0.0) as u64,
            mime: stored
                .mime
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MIME.to_string()),
            uploaded_at: stored
                .uploaded_at
                .filter(|t| t.is_finite())
                .map_or_else(|| OffsetDateTime::now_utc().unix_timestamp(), |t| t as i64),
            module_titles,
            checksum: stored.checksum.unwrap_or_default(),
        }
    }
}

/*
 * Brings a module list loaded from storage back within the invariants the
 * mutation engine maintains. Duplicate labels are left alone: imported data may
 * carry them and only new mutations are required to avoid them.
 */
pub fn normalize_modules(modules: &mut [Module]) {
    let mut page_ids: Vec<String> = modules
        .iter()
        .flat_map(|module| module.items.iter())
        .filter_map(|item| item.kind.page_id())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    for module in modules.iter_mut() {
        for item in module.items.iter_mut() {
            if item.indent > MAX_INDENT {
                log::debug!(
                    "Models: Clamping indent {} of '{}' in module '{}'",
                    item.indent,
                    item.label,
                    module.title
                );
                item.indent = MAX_INDENT;
            }
            let ItemKind::Page { page_id } = &mut item.kind else {
                continue;
            };
            if page_id.is_empty() {
                *page_id = unique_slug(&slugify(&item.label), page_ids.iter().map(String::as_str));
                log::debug!(
                    "Models: Assigned page id '{page_id}' to '{}' in module '{}'",
                    item.label,
                    module.title
                );
                page_ids.push(page_id.clone());
            }
        }
    }
}

/*
 * The outline a course starts with before anything has been stored for it.
 */
pub fn default_modules() -> Vec<Module> {
    let section = |label: &str| Item::new(label, ItemKind::Section { collapsed: false });
    let page = |label: &str, page_id: &str| {
        Item::new(
            label,
            ItemKind::Page {
                page_id: page_id.to_string(),
            },
        )
        .with_indent(1)
    };
    let unlinked_file = |label: &str| {
        Item::new(
            label,
            ItemKind::File {
                file_id: None,
                file_name: label.to_string(),
            },
        )
        .with_indent(1)
    };
    vec![
        Module {
            title: "Week 1 – Introduction".to_string(),
            items: vec![
                section("Start Here"),
                page("Course Overview", "course-overview"),
                unlinked_file("Syllabus.pdf"),
            ],
        },
        Module {
            title: "Week 2 – Algorithms and Complexity".to_string(),
            items: vec![
                section("Learning Materials"),
                page("Lecture Slides", "lecture-slides"),
                unlinked_file("ExampleProblems.docx"),
                Item::new(
                    "Supplementary Reading",
                    ItemKind::Link {
                        url: "https://example.com".to_string(),
                    },
                )
                .with_indent(1),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serializes_flat_with_type_tag() {
        let item = Item::new(
            "Slides.pdf",
            ItemKind::File {
                file_id: Some("f1".to_string()),
                file_name: "Slides.pdf".to_string(),
            },
        )
        .with_indent(1);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["label"], "Slides.pdf");
        assert_eq!(json["indent"], 1);
        assert_eq!(json["fileId"], "f1");
        assert_eq!(json["fileName"], "Slides.pdf");
        assert!(json.get("collapsed").is_none());
    }

    #[test]
    fn test_section_defaults_when_fields_missing() {
        let item: Item = serde_json::from_str(r#"{"type":"section","label":"Readings"}"#).unwrap();
        assert_eq!(item.indent, 0);
        assert_eq!(item.kind, ItemKind::Section { collapsed: false });
    }

    #[test]
    fn test_page_round_trips_page_id() {
        let json = r#"{"type":"page","label":"Course Overview","indent":0,"pageId":"course-overview"}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind.page_id(), Some("course-overview"));
        let back: Item = serde_json::from_str(&serde_json::to_string(&item).unwrap()).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_normalize_clamps_out_of_range_indent() {
        let mut modules = vec![Module {
            title: "Week 1".to_string(),
            items: vec![Item {
                label: "Deep".to_string(),
                indent: 9,
                kind: ItemKind::Link {
                    url: "https://example.org".to_string(),
                },
            }],
        }];
        normalize_modules(&mut modules);
        assert_eq!(modules[0].items[0].indent, MAX_INDENT);
    }

    #[test]
    fn test_referenced_file_ids_are_distinct() {
        let mut module = Module::new("Week 2");
        for label in ["a", "b"] {
            module.items.push(Item::new(
                label,
                ItemKind::File {
                    file_id: Some("f1".to_string()),
                    file_name: label.to_string(),
                },
            ));
        }
        module.items.push(Item::new("c", ItemKind::Section { collapsed: false }));
        assert_eq!(module.referenced_file_ids(), vec!["f1".to_string()]);
        assert!(module.references_file("f1"));
        assert!(!module.references_file("f2"));
    }

    #[test]
    fn test_file_meta_uses_camel_case() {
        let mut meta = FileMeta::new("f1", "Slides.pdf", 42, "application/pdf");
        meta.module_titles.insert("Week 1".to_string());
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["uploadedAt"], 0);
        assert_eq!(json["moduleTitles"], serde_json::json!(["Week 1"]));
    }

    #[test]
    fn test_stored_page_without_page_id_gets_unique_slug() {
        // Arrange
        let json = r#"[
            {"title":"Week 1","items":[
                {"type":"page","label":"Course Overview"},
                {"type":"page","label":"Notes","pageId":"notes"}
            ]},
            {"title":"Week 2","items":[{"type":"page","label":"Notes"}]}
        ]"#;
        let mut modules: Vec<Module> = serde_json::from_str(json).unwrap();

        // Act
        normalize_modules(&mut modules);

        // Assert
        assert_eq!(modules[0].items[0].kind.page_id(), Some("course-overview"));
        assert_eq!(modules[0].items[1].kind.page_id(), Some("notes"));
        assert_eq!(modules[1].items[0].kind.page_id(), Some("notes-2"));
    }

    #[test]
    fn test_stored_item_fields_are_coerced() {
        let json = r#"[
            {"type":"section","label":"Readings","indent":2.7,"collapsed":1},
            {"type":"link","label":"Deep","indent":-4},
            {"type":"quiz","label":"Quiz 1","url":"https://example.org/q"},
            {"label":"Untyped"}
        ]"#;
        let items: Vec<Item> = serde_json::from_str(json).unwrap();
        assert_eq!(items[0].indent, 2);
        assert_eq!(items[0].kind, ItemKind::Section { collapsed: true });
        assert_eq!(items[1].indent, 0);
        assert_eq!(
            items[2].kind,
            ItemKind::Link {
                url: "https://example.org/q".to_string()
            }
        );
        assert_eq!(items[3].kind.type_name(), "link");
    }

    #[test]
    fn test_file_meta_with_only_an_id_gets_defaults() {
        let meta: FileMeta = serde_json::from_str(r#"{"id":"f1"}"#).unwrap();
        assert_eq!(meta.name, "");
        assert_eq!(meta.size, 0);
        assert_eq!(meta.mime, DEFAULT_MIME);
        assert!(meta.uploaded_at > 0);
        assert!(meta.module_titles.is_empty());
    }

    #[test]
    fn test_legacy_module_title_becomes_the_title_set() {
        let json = r#"[
            {"id":"f1","name":"a.pdf","size":3,"mime":"application/pdf","uploadedAt":10,"moduleTitle":"  Week 1 "},
            {"id":"f2","moduleTitle":"   "},
            {"id":"f3","moduleTitle":"Week 1","moduleTitles":["Week 2",""]}
        ]"#;
        let metas: Vec<FileMeta> = serde_json::from_str(json).unwrap();
        assert_eq!(metas[0].module_titles, BTreeSet::from(["Week 1".to_string()]));
        assert_eq!(metas[0].uploaded_at, 10);
        assert!(metas[1].module_titles.is_empty());
        assert_eq!(metas[2].module_titles, BTreeSet::from(["Week 2".to_string()]));

        // Written back in the current shape only.
        let json = serde_json::to_value(&metas[0]).unwrap();
        assert!(json.get("moduleTitle").is_none());
        assert_eq!(json["moduleTitles"], serde_json::json!(["Week 1"]));
    }

    #[test]
    fn test_default_modules_are_well_formed() {
        let modules = default_modules();
        assert!(!modules.is_empty());
        let mut titles: Vec<&str> = modules.iter().map(|m| m.title.as_str()).collect();
        titles.dedup();
        assert_eq!(titles.len(), modules.len());
        assert!(
            modules
                .iter()
                .flat_map(|m| m.items.iter())
                .filter_map(|i| i.kind.page_id())
                .all(|id| !id.is_empty())
        );
    }
}
