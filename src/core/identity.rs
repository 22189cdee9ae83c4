/*
 * Structured identities for everything that can be dragged or dropped on in the
 * outline: modules, items, the end-of-module container and the placeholder row
 * standing in for a collapsed section's hidden children.
 *
 * The engine works with `DndId` values. The string form
 * (`module:<title>`, `item:<module>:<label>`, `container:<module>`,
 * `placeholder:<module>:<section>`) only exists at the boundary with the
 * drag-and-drop layer. Titles and labels are embedded verbatim, without escaping.
 */
use super::models::Module;
use std::fmt;
use std::str::FromStr;

const MODULE_PREFIX: &str = "module:";
const ITEM_PREFIX: &str = "item:";
const CONTAINER_PREFIX: &str = "container:";
const PLACEHOLDER_PREFIX: &str = "placeholder:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DndId {
    Module { title: String },
    Item { module_title: String, label: String },
    Container { module_title: String },
    Placeholder { module_title: String, section_label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    UnknownPrefix(String),
    Malformed(String),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::UnknownPrefix(s) => write!(f, "Unknown identity prefix in '{s}'"),
            IdentityError::Malformed(s) => write!(f, "Malformed identity '{s}'"),
        }
    }
}

impl std::error::Error for IdentityError {}

pub type Result<T> = std::result::Result<T, IdentityError>;

impl DndId {
    pub fn module(title: impl Into<String>) -> Self {
        DndId::Module {
            title: title.into(),
        }
    }

    pub fn item(module_title: impl Into<String>, label: impl Into<String>) -> Self {
        DndId::Item {
            module_title: module_title.into(),
            label: label.into(),
        }
    }

    pub fn container(module_title: impl Into<String>) -> Self {
        DndId::Container {
            module_title: module_title.into(),
        }
    }

    pub fn placeholder(module_title: impl Into<String>, section_label: impl Into<String>) -> Self {
        DndId::Placeholder {
            module_title: module_title.into(),
            section_label: section_label.into(),
        }
    }

    /* The module this identity belongs to (the module itself for `Module`). */
    pub fn module_title(&self) -> &str {
        match self {
            DndId::Module { title } => title,
            DndId::Item { module_title, .. }
            | DndId::Container { module_title }
            | DndId::Placeholder { module_title, .. } => module_title,
        }
    }

    pub fn is_module(&self) -> bool {
        matches!(self, DndId::Module { .. })
    }

    /*
     * Parses an identity string against the modules that currently exist. For
     * `item:` and `placeholder:` ids, a split after a known module title is only
     * taken when that module holds the named row (a section, for placeholders);
     * the longest such title wins. Otherwise the first-colon split of `FromStr`
     * applies.
     */
    pub fn parse_in(s: &str, modules: &[Module]) -> Result<DndId> {
        let (prefix, rest) = split_prefix(s)?;
        if prefix != ITEM_PREFIX && prefix != PLACEHOLDER_PREFIX {
            return s.parse();
        }
        let resolved = modules
            .iter()
            .filter_map(|module| {
                let tail = rest
                    .strip_prefix(module.title.as_str())?
                    .strip_prefix(':')?;
                let row = module.item(tail)?;
                (prefix == ITEM_PREFIX || row.is_section()).then_some((module.title.as_str(), tail))
            })
            .max_by_key(|(title, _)| title.len());
        match resolved {
            Some((title, tail)) if prefix == ITEM_PREFIX => Ok(DndId::item(title, tail)),
            Some((title, tail)) => Ok(DndId::placeholder(title, tail)),
            None => s.parse(),
        }
    }
}

fn split_prefix(s: &str) -> Result<(&'static str, &str)> {
    for prefix in [MODULE_PREFIX, ITEM_PREFIX, CONTAINER_PREFIX, PLACEHOLDER_PREFIX] {
        if let Some(rest) = s.strip_prefix(prefix) {
            return Ok((prefix, rest));
        }
    }
    Err(IdentityError::UnknownPrefix(s.to_string()))
}

impl fmt::Display for DndId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DndId::Module { title } => write!(f, "{MODULE_PREFIX}{title}"),
            DndId::Item {
                module_title,
                label,
            } => write!(f, "{ITEM_PREFIX}{module_title}:{label}"),
            DndId::Container { module_title } => write!(f, "{CONTAINER_PREFIX}{module_title}"),
            DndId::Placeholder {
                module_title,
                section_label,
            } => write!(f, "{PLACEHOLDER_PREFIX}{module_title}:{section_label}"),
        }
    }
}

/*
 * Context-free parse. `item:` and `placeholder:` split on the first ':' after the
 * prefix, so the label may contain ':' but the module title may not; use
 * `DndId::parse_in` when module titles can contain ':'.
 */
impl FromStr for DndId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        let (prefix, rest) = split_prefix(s)?;
        match prefix {
            MODULE_PREFIX => Ok(DndId::module(rest)),
            CONTAINER_PREFIX => Ok(DndId::container(rest)),
            _ => {
                let (module_title, tail) = rest
                    .split_once(':')
                    .ok_or_else(|| IdentityError::Malformed(s.to_string()))?;
                if prefix == ITEM_PREFIX {
                    Ok(DndId::item(module_title, tail))
                } else {
                    Ok(DndId::placeholder(module_title, tail))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Item, ItemKind};

    #[test]
    fn test_construct_string_forms() {
        assert_eq!(DndId::module("Week 1").to_string(), "module:Week 1");
        assert_eq!(
            DndId::item("Week 1", "Notes").to_string(),
            "item:Week 1:Notes"
        );
        assert_eq!(DndId::container("Week 1").to_string(), "container:Week 1");
        assert_eq!(
            DndId::placeholder("Week 1", "Readings").to_string(),
            "placeholder:Week 1:Readings"
        );
    }

    #[test]
    fn test_round_trip_with_colons_in_labels() {
        let ids = [
            DndId::module("Unit: Basics"),
            DndId::container("Unit: Basics"),
            DndId::item("Week 1", "Lecture: Part 1: Intro"),
            DndId::placeholder("Week 1", "Readings: optional"),
            DndId::item("Week 1", ""),
        ];
        for id in ids {
            let parsed: DndId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }
    }

    fn module_with(title: &str, rows: &[(&str, ItemKind)]) -> Module {
        let mut module = Module::new(title);
        for (label, kind) in rows {
            module.items.push(Item::new(*label, kind.clone()));
        }
        module
    }

    fn page_kind() -> ItemKind {
        ItemKind::Page {
            page_id: "p".to_string(),
        }
    }

    fn section_kind() -> ItemKind {
        ItemKind::Section { collapsed: true }
    }

    #[test]
    fn test_parse_in_resolves_module_titles_with_colons() {
        let modules = [
            module_with(
                "Unit: Basics",
                &[("Lecture: 1", page_kind()), ("Readings", section_kind())],
            ),
            module_with("Unit", &[]),
        ];
        let id = DndId::item("Unit: Basics", "Lecture: 1");
        let parsed = DndId::parse_in(&id.to_string(), &modules).unwrap();
        assert_eq!(parsed, id);

        let id = DndId::placeholder("Unit: Basics", "Readings");
        let parsed = DndId::parse_in(&id.to_string(), &modules).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_in_prefers_module_that_holds_the_row() {
        // "Unit:Part" exists but holds no " 1"; the row lives in "Unit".
        let modules = [
            module_with("Unit", &[("Part: 1", page_kind())]),
            module_with("Unit:Part", &[("Other", page_kind())]),
        ];
        let parsed = DndId::parse_in("item:Unit:Part: 1", &modules).unwrap();
        assert_eq!(parsed, DndId::item("Unit", "Part: 1"));

        let parsed = DndId::parse_in("item:Unit:Part:Other", &modules).unwrap();
        assert_eq!(parsed, DndId::item("Unit:Part", "Other"));
    }

    #[test]
    fn test_parse_in_placeholder_needs_a_section() {
        let modules = [
            module_with("A", &[("B:Readings", page_kind())]),
            module_with("A:B", &[("Readings", section_kind())]),
        ];
        let parsed = DndId::parse_in("placeholder:A:B:Readings", &modules).unwrap();
        assert_eq!(parsed, DndId::placeholder("A:B", "Readings"));
    }

    #[test]
    fn test_parse_in_falls_back_to_first_colon() {
        let modules = [module_with("Week 1", &[("Quiz", page_kind())])];
        let parsed = DndId::parse_in("item:Week 9:Quiz", &modules).unwrap();
        assert_eq!(parsed, DndId::item("Week 9", "Quiz"));
        let parsed = DndId::parse_in("item:Week 1:Missing: row", &modules).unwrap();
        assert_eq!(parsed, DndId::item("Week 1", "Missing: row"));
        let parsed = DndId::parse_in("module:Week 9", &modules).unwrap();
        assert_eq!(parsed, DndId::module("Week 9"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "row:Week 1".parse::<DndId>(),
            Err(IdentityError::UnknownPrefix(_))
        ));
        assert!(matches!(
            "item:NoSeparator".parse::<DndId>(),
            Err(IdentityError::Malformed(_))
        ));
    }

    #[test]
    fn test_module_title_accessor() {
        assert_eq!(DndId::module("A").module_title(), "A");
        assert_eq!(DndId::item("B", "x").module_title(), "B");
        assert_eq!(DndId::container("C").module_title(), "C");
        assert_eq!(DndId::placeholder("D", "s").module_title(), "D");
    }
}
