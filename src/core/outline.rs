/*
 * The mutation engine: the single writer of the canonical module list.
 *
 * `CourseOutline` owns the ordered modules and exposes one operation per user
 * action (module CRUD and reordering, item CRUD, indent/outdent, section
 * collapse, drag-originated moves). Every operation reports a `MutationOutcome`
 * telling whether the list changed and which cross-reference effects the file
 * catalog must apply; callers persist when `changed` is set.
 *
 * References to modules or items that do not exist are silent no-ops. Labels are
 * kept unique per module and titles unique across modules by auto-suffixing.
 */
use super::file_refs::RefEffect;
use super::identity::DndId;
use super::models::{DraftKind, Item, ItemDraft, ItemKind, MAX_INDENT, Module, normalize_modules};
use super::naming::{slugify, unique_name, unique_slug};
use super::outline_view::{RenderEntry, build_render_entries, section_insert_index};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    pub changed: bool,
    pub effects: Vec<RefEffect>,
    /* Title or label actually stored after uniqueness resolution, when one was assigned. */
    pub resolved_name: Option<String>,
}

impl MutationOutcome {
    pub fn unchanged() -> Self {
        MutationOutcome::default()
    }

    fn changed(effects: Vec<RefEffect>) -> Self {
        MutationOutcome {
            changed: true,
            effects,
            resolved_name: None,
        }
    }

    fn named(mut self, name: String) -> Self {
        self.resolved_name = Some(name);
        self
    }
}

// Where, relative to the target module's current rows, a moved item lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Before(String),
    After(String),
    End,
    IntoSection(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseOutline {
    modules: Vec<Module>,
}

impl CourseOutline {
    pub fn new(mut modules: Vec<Module>) -> Self {
        normalize_modules(&mut modules);
        CourseOutline { modules }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, title: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.title == title)
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|module| module.title.as_str())
    }

    fn module_index(&self, title: &str) -> Option<usize> {
        self.modules.iter().position(|module| module.title == title)
    }

    fn module_mut(&mut self, title: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|module| module.title == title)
    }

    /* Page ids in use anywhere in the outline, skipping one (module, item index). */
    fn page_ids_except(&self, skip: Option<(usize, usize)>) -> Vec<String> {
        let mut ids = Vec::new();
        for (m, module) in self.modules.iter().enumerate() {
            for (i, item) in module.items.iter().enumerate() {
                if Some((m, i)) == skip {
                    continue;
                }
                if let Some(id) = item.kind.page_id() {
                    ids.push(id.to_string());
                }
            }
        }
        ids
    }

    fn fresh_page_id(&self, label: &str, skip: Option<(usize, usize)>) -> String {
        let taken = self.page_ids_except(skip);
        unique_slug(&slugify(label), taken.iter().map(String::as_str))
    }

    /*
     * Builds the stored kind for a draft. An item that stays a page keeps its page
     * id; an item that stays a section keeps its collapsed flag. Any other change
     * of kind constructs the new variant from scratch.
     */
    fn kind_from_draft(
        &self,
        previous: Option<&ItemKind>,
        draft: &DraftKind,
        label: &str,
        position: Option<(usize, usize)>,
    ) -> ItemKind {
        match (draft, previous) {
            (DraftKind::Page, Some(ItemKind::Page { page_id })) => ItemKind::Page {
                page_id: page_id.clone(),
            },
            (DraftKind::Page, _) => ItemKind::Page {
                page_id: self.fresh_page_id(label, position),
            },
            (DraftKind::File { file_id, file_name }, _) => ItemKind::File {
                file_id: file_id.clone(),
                file_name: file_name.clone(),
            },
            (DraftKind::Link { url }, _) => ItemKind::Link { url: url.clone() },
            (DraftKind::Section, Some(ItemKind::Section { collapsed })) => ItemKind::Section {
                collapsed: *collapsed,
            },
            (DraftKind::Section, _) => ItemKind::Section { collapsed: false },
        }
    }

    pub fn add_module(&mut self, title: &str) -> MutationOutcome {
        if title.trim().is_empty() {
            log::warn!("CourseOutline: Refusing to add a module with an empty title.");
            return MutationOutcome::unchanged();
        }
        let resolved = unique_name(title, self.titles());
        log::debug!("CourseOutline: Adding module '{resolved}'");
        self.modules.push(Module::new(resolved.clone()));
        MutationOutcome::changed(Vec::new()).named(resolved)
    }

    pub fn edit_module(&mut self, old_title: &str, new_title: &str) -> MutationOutcome {
        let Some(index) = self.module_index(old_title) else {
            return MutationOutcome::unchanged();
        };
        if old_title == new_title || new_title.trim().is_empty() {
            return MutationOutcome::unchanged();
        }
        let resolved = unique_name(
            new_title,
            self.titles().filter(|title| *title != old_title),
        );
        log::debug!("CourseOutline: Renaming module '{old_title}' to '{resolved}'");
        self.modules[index].title = resolved.clone();
        MutationOutcome::changed(vec![RefEffect::RenameModule {
            old_title: old_title.to_string(),
            new_title: resolved.clone(),
        }])
        .named(resolved)
    }

    pub fn delete_module(&mut self, title: &str) -> MutationOutcome {
        let Some(index) = self.module_index(title) else {
            return MutationOutcome::unchanged();
        };
        let removed = self.modules.remove(index);
        log::debug!(
            "CourseOutline: Deleted module '{}' with {} items",
            removed.title,
            removed.items.len()
        );
        let effects = removed
            .referenced_file_ids()
            .iter()
            .map(|file_id| RefEffect::remove(file_id, &removed.title))
            .collect();
        MutationOutcome::changed(effects)
    }

    /* Moves module `active_title` to the position currently held by `over_title`. */
    pub fn move_module(&mut self, active_title: &str, over_title: &str) -> MutationOutcome {
        let (Some(from), Some(to)) = (self.module_index(active_title), self.module_index(over_title))
        else {
            return MutationOutcome::unchanged();
        };
        if from == to {
            return MutationOutcome::unchanged();
        }
        let module = self.modules.remove(from);
        self.modules.insert(to, module);
        log::debug!("CourseOutline: Moved module '{active_title}' from {from} to {to}");
        MutationOutcome::changed(Vec::new())
    }

    pub fn add_item(&mut self, module_title: &str, draft: &ItemDraft) -> MutationOutcome {
        let Some(m) = self.module_index(module_title) else {
            return MutationOutcome::unchanged();
        };
        if draft.label.trim().is_empty() {
            log::warn!("CourseOutline: Refusing to add an item with an empty label.");
            return MutationOutcome::unchanged();
        }
        let label = unique_name(
            &draft.label,
            self.modules[m].items.iter().map(|item| item.label.as_str()),
        );
        let kind = self.kind_from_draft(None, &draft.kind, &label, None);
        let item = Item::new(label.clone(), kind).with_indent(draft.indent);

        let mut effects = Vec::new();
        if let Some(file_id) = item.kind.file_id() {
            effects.push(RefEffect::add(file_id, module_title));
        }
        log::debug!(
            "CourseOutline: Adding {} item '{label}' to module '{module_title}'",
            item.kind.type_name()
        );
        self.modules[m].items.push(item);
        MutationOutcome::changed(effects).named(label)
    }

    pub fn edit_item(
        &mut self,
        module_title: &str,
        old_label: &str,
        draft: &ItemDraft,
    ) -> MutationOutcome {
        let Some(m) = self.module_index(module_title) else {
            return MutationOutcome::unchanged();
        };
        let Some(i) = self.modules[m].item_index(old_label) else {
            return MutationOutcome::unchanged();
        };
        if draft.label.trim().is_empty() {
            return MutationOutcome::unchanged();
        }

        let label = unique_name(
            &draft.label,
            self.modules[m]
                .items
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != i)
                .map(|(_, item)| item.label.as_str()),
        );
        let previous = self.modules[m].items[i].clone();
        let kind = self.kind_from_draft(Some(&previous.kind), &draft.kind, &label, Some((m, i)));
        let updated = Item::new(label.clone(), kind).with_indent(draft.indent);
        if updated == previous {
            return MutationOutcome::unchanged().named(label);
        }

        let old_file = previous.kind.file_id().map(str::to_string);
        let new_file = updated.kind.file_id().map(str::to_string);
        self.modules[m].items[i] = updated;

        let mut effects = Vec::new();
        if old_file != new_file {
            if let Some(old) = old_file.as_deref()
                && !self.modules[m].references_file(old)
            {
                effects.push(RefEffect::remove(old, module_title));
            }
            if let Some(new) = new_file.as_deref() {
                effects.push(RefEffect::add(new, module_title));
            }
        }
        log::debug!("CourseOutline: Edited item '{old_label}' -> '{label}' in '{module_title}'");
        MutationOutcome::changed(effects).named(label)
    }

    pub fn delete_item(&mut self, module_title: &str, label: &str) -> MutationOutcome {
        let Some(module) = self.module_mut(module_title) else {
            return MutationOutcome::unchanged();
        };
        let Some(index) = module.item_index(label) else {
            return MutationOutcome::unchanged();
        };
        let removed = module.items.remove(index);
        let mut effects = Vec::new();
        if let Some(file_id) = removed.kind.file_id()
            && !module.references_file(file_id)
        {
            effects.push(RefEffect::remove(file_id, module_title));
        }
        log::debug!("CourseOutline: Deleted item '{label}' from '{module_title}'");
        MutationOutcome::changed(effects)
    }

    fn shift_indent(&mut self, module_title: &str, label: &str, delta: i8) -> MutationOutcome {
        let Some(item) = self
            .module_mut(module_title)
            .and_then(|module| module.item_mut(label))
        else {
            return MutationOutcome::unchanged();
        };
        let new_indent = (item.indent as i16 + delta as i16).clamp(0, MAX_INDENT as i16) as u8;
        if new_indent == item.indent {
            return MutationOutcome::unchanged();
        }
        item.indent = new_indent;
        MutationOutcome::changed(Vec::new())
    }

    pub fn indent_item(&mut self, module_title: &str, label: &str) -> MutationOutcome {
        self.shift_indent(module_title, label, 1)
    }

    pub fn outdent_item(&mut self, module_title: &str, label: &str) -> MutationOutcome {
        self.shift_indent(module_title, label, -1)
    }

    pub fn toggle_section_collapsed(
        &mut self,
        module_title: &str,
        section_label: &str,
    ) -> MutationOutcome {
        let Some(item) = self
            .module_mut(module_title)
            .and_then(|module| module.item_mut(section_label))
        else {
            return MutationOutcome::unchanged();
        };
        match &mut item.kind {
            ItemKind::Section { collapsed } => {
                *collapsed = !*collapsed;
                log::trace!(
                    "CourseOutline: Section '{section_label}' collapsed = {}",
                    *collapsed
                );
                MutationOutcome::changed(Vec::new())
            }
            _ => MutationOutcome::unchanged(),
        }
    }

    /* Re-derives a page item's id from its current label. */
    pub fn regenerate_page_id(&mut self, module_title: &str, label: &str) -> MutationOutcome {
        let Some(m) = self.module_index(module_title) else {
            return MutationOutcome::unchanged();
        };
        let Some(i) = self.modules[m].item_index(label) else {
            return MutationOutcome::unchanged();
        };
        if self.modules[m].items[i].kind.page_id().is_none() {
            return MutationOutcome::unchanged();
        }
        let fresh = self.fresh_page_id(label, Some((m, i)));
        let item = &mut self.modules[m].items[i];
        if item.kind.page_id() == Some(fresh.as_str()) {
            return MutationOutcome::unchanged();
        }
        item.kind = ItemKind::Page {
            page_id: fresh.clone(),
        };
        MutationOutcome::changed(Vec::new()).named(fresh)
    }

    /*
     * Moves an item, possibly across modules. The landing index is computed on
     * the target list after the source item has been removed. A label that
     * collides in a different target module is suffixed.
     */
    pub fn move_item(
        &mut self,
        source_module: &str,
        label: &str,
        target_module: &str,
        target: &DropTarget,
    ) -> MutationOutcome {
        let (Some(src), Some(dst)) = (
            self.module_index(source_module),
            self.module_index(target_module),
        ) else {
            return MutationOutcome::unchanged();
        };
        let Some(from) = self.modules[src].item_index(label) else {
            return MutationOutcome::unchanged();
        };
        if src == dst {
            match target {
                DropTarget::Before(other)
                | DropTarget::After(other)
                | DropTarget::IntoSection(other)
                    if other == label =>
                {
                    return MutationOutcome::unchanged();
                }
                _ => {}
            }
        }

        let mut item = self.modules[src].items.remove(from);
        let dst_items = &self.modules[dst].items;
        let index = match target {
            DropTarget::Before(other) => dst_items.iter().position(|i| i.label == *other),
            DropTarget::After(other) => dst_items
                .iter()
                .position(|i| i.label == *other)
                .map(|p| p + 1),
            DropTarget::End => Some(dst_items.len()),
            DropTarget::IntoSection(section) => section_insert_index(dst_items, section),
        };
        let Some(index) = index else {
            log::debug!("CourseOutline: Drop target {target:?} not found in '{target_module}'");
            self.modules[src].items.insert(from, item);
            return MutationOutcome::unchanged();
        };
        if src == dst && index == from {
            self.modules[src].items.insert(from, item);
            return MutationOutcome::unchanged();
        }

        let mut effects = Vec::new();
        if src != dst {
            item.label = unique_name(
                &item.label,
                self.modules[dst].items.iter().map(|i| i.label.as_str()),
            );
            if let Some(file_id) = item.kind.file_id() {
                if !self.modules[src].references_file(file_id) {
                    effects.push(RefEffect::remove(file_id, source_module));
                }
                effects.push(RefEffect::add(file_id, target_module));
            }
        }
        log::debug!(
            "CourseOutline: Moved '{label}' from '{source_module}'[{from}] to '{target_module}'[{index}]"
        );
        let resolved = item.label.clone();
        self.modules[dst].items.insert(index, item);
        MutationOutcome::changed(effects).named(resolved)
    }

    /* Render rows of a module, or None if the module does not exist. */
    pub fn render_entries(&self, module_title: &str) -> Option<Vec<RenderEntry<'_>>> {
        self.module(module_title)
            .map(|module| build_render_entries(&module.items))
    }

    /* Every module with its rows and their string identities, in display order. */
    pub fn render_outline(&self) -> Vec<(DndId, Vec<(DndId, RenderEntry<'_>)>)> {
        self.modules
            .iter()
            .map(|module| {
                let rows = build_render_entries(&module.items)
                    .into_iter()
                    .map(|entry| (entry.dnd_id(&module.title), entry))
                    .collect();
                (DndId::module(module.title.as_str()), rows)
            })
            .collect()
    }
}
