/*
 * Turns a module's flat item list into the rows that are actually displayed.
 * A collapsed section hides the rows in its span and is followed by a single
 * placeholder row that remembers how many rows it hides and where content
 * dropped "into" the section should be inserted.
 *
 * The span of a collapsed section at index `i` with indent `d` ends at the first
 * later index holding either another section or an item with indent <= `d`.
 */
use super::identity::DndId;
use super::models::Item;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEntry<'a> {
    Item {
        item: &'a Item,
        full_index: usize,
    },
    Placeholder {
        section_label: &'a str,
        hidden_count: usize,
        insert_index: usize,
    },
}

impl RenderEntry<'_> {
    /* Identity of this row inside the module titled `module_title`. */
    pub fn dnd_id(&self, module_title: &str) -> DndId {
        match self {
            RenderEntry::Item { item, .. } => DndId::item(module_title, item.label.as_str()),
            RenderEntry::Placeholder { section_label, .. } => {
                DndId::placeholder(module_title, *section_label)
            }
        }
    }
}

/*
 * Index one past the last row covered by the section at `section_index`.
 * For a non-section index this is simply `section_index + 1`.
 */
pub fn section_span_end(items: &[Item], section_index: usize) -> usize {
    let Some(section) = items.get(section_index) else {
        return items.len();
    };
    let mut end = section_index + 1;
    if !section.is_section() {
        return end;
    }
    while let Some(item) = items.get(end) {
        if item.is_section() || item.indent <= section.indent {
            break;
        }
        end += 1;
    }
    end
}

/* Span boundary of the section labelled `section_label`, if there is one. */
pub fn section_insert_index(items: &[Item], section_label: &str) -> Option<usize> {
    items
        .iter()
        .position(|item| item.is_section() && item.label == section_label)
        .map(|index| section_span_end(items, index))
}

pub fn build_render_entries(items: &[Item]) -> Vec<RenderEntry<'_>> {
    let mut entries = Vec::with_capacity(items.len());
    let mut index = 0;
    while index < items.len() {
        let item = &items[index];
        entries.push(RenderEntry::Item {
            item,
            full_index: index,
        });
        if item.is_collapsed_section() {
            let end = section_span_end(items, index);
            entries.push(RenderEntry::Placeholder {
                section_label: item.label.as_str(),
                hidden_count: end - index - 1,
                insert_index: end,
            });
            index = end;
        } else {
            index += 1;
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ItemKind;

    fn section(label: &str, indent: u8, collapsed: bool) -> Item {
        Item::new(label, ItemKind::Section { collapsed }).with_indent(indent)
    }

    fn link(label: &str, indent: u8) -> Item {
        Item::new(
            label,
            ItemKind::Link {
                url: format!("https://example.org/{label}"),
            },
        )
        .with_indent(indent)
    }

    fn labels(entries: &[RenderEntry<'_>]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| match entry {
                RenderEntry::Item { item, .. } => item.label.clone(),
                RenderEntry::Placeholder {
                    hidden_count,
                    insert_index,
                    ..
                } => format!("<{hidden_count}@{insert_index}>"),
            })
            .collect()
    }

    #[test]
    fn test_collapsed_span_hides_children_until_next_section() {
        let items = vec![
            section("S", 0, true),
            link("A", 1),
            link("B", 1),
            section("T", 0, false),
            link("C", 0),
        ];

        let entries = build_render_entries(&items);

        assert_eq!(labels(&entries), vec!["S", "<2@3>", "T", "C"]);
        assert_eq!(
            entries[1],
            RenderEntry::Placeholder {
                section_label: "S",
                hidden_count: 2,
                insert_index: 3,
            }
        );
        assert!(matches!(entries[3], RenderEntry::Item { full_index: 4, .. }));
    }

    #[test]
    fn test_empty_collapsed_section_still_emits_placeholder() {
        let items = vec![section("S", 0, true), link("A", 0)];
        let entries = build_render_entries(&items);
        assert_eq!(labels(&entries), vec!["S", "<0@1>", "A"]);
    }

    #[test]
    fn test_span_ends_at_outdented_item() {
        let items = vec![
            link("Top", 0),
            section("S", 1, true),
            link("A", 2),
            link("B", 1),
            link("C", 2),
        ];
        let entries = build_render_entries(&items);
        assert_eq!(labels(&entries), vec!["Top", "S", "<1@3>", "B", "C"]);
    }

    #[test]
    fn test_collapsed_section_at_end_of_list() {
        let items = vec![link("A", 0), section("S", 0, true), link("B", 1)];
        let entries = build_render_entries(&items);
        assert_eq!(labels(&entries), vec!["A", "S", "<1@3>"]);
    }

    #[test]
    fn test_expanded_sections_render_every_row() {
        let items = vec![section("S", 0, false), link("A", 1), link("B", 1)];
        let entries = build_render_entries(&items);
        assert_eq!(labels(&entries), vec!["S", "A", "B"]);
    }

    #[test]
    fn test_consecutive_collapsed_sections() {
        let items = vec![
            section("S1", 0, true),
            link("A", 1),
            section("S2", 0, true),
            link("B", 1),
        ];
        let entries = build_render_entries(&items);
        assert_eq!(labels(&entries), vec!["S1", "<1@2>", "S2", "<1@4>"]);
    }

    #[test]
    fn test_section_insert_index_lookup() {
        let items = vec![section("S", 0, true), link("A", 1), link("B", 0)];
        assert_eq!(section_insert_index(&items, "S"), Some(2));
        assert_eq!(section_insert_index(&items, "A"), None);
        assert_eq!(section_insert_index(&items, "missing"), None);
    }

    #[test]
    fn test_entry_identities() {
        let items = vec![section("S", 0, true), link("A", 1)];
        let entries = build_render_entries(&items);
        assert_eq!(entries[0].dnd_id("Week 1"), DndId::item("Week 1", "S"));
        assert_eq!(
            entries[1].dnd_id("Week 1"),
            DndId::placeholder("Week 1", "S")
        );
    }
}
