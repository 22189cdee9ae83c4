/*
 * Keeps the file-metadata catalog's back-references (`FileMeta::module_titles`)
 * consistent with the module list. The mutation engine never touches the catalog
 * directly; it reports `RefEffect`s, and `FileCatalog::apply_effects` is the single
 * place they are consumed. `merge_module_refs_into_files_meta` is the
 * authoritative full resync that any caller may run at will.
 */
use super::models::{FileMeta, Module};
use super::naming::display_name;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type ModuleRefs = BTreeMap<String, BTreeSet<String>>;

// A cross-reference change requested by a module-list mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefEffect {
    AddRef {
        file_id: String,
        module_title: String,
    },
    RemoveRef {
        file_id: String,
        module_title: String,
    },
    RenameModule {
        old_title: String,
        new_title: String,
    },
}

impl RefEffect {
    pub fn add(file_id: &str, module_title: &str) -> Self {
        RefEffect::AddRef {
            file_id: file_id.to_string(),
            module_title: module_title.to_string(),
        }
    }

    pub fn remove(file_id: &str, module_title: &str) -> Self {
        RefEffect::RemoveRef {
            file_id: file_id.to_string(),
            module_title: module_title.to_string(),
        }
    }
}

/* Scans every module for file items and returns fileId -> module titles. */
pub fn collect_module_refs(modules: &[Module]) -> ModuleRefs {
    let mut refs = ModuleRefs::new();
    for module in modules {
        for file_id in module.items.iter().filter_map(|item| item.kind.file_id()) {
            refs.entry(file_id.to_string())
                .or_default()
                .insert(module.title.clone());
        }
    }
    refs
}

// The per-course file metadata table, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileCatalog {
    files: Vec<FileMeta>,
}

impl FileCatalog {
    pub fn new(files: Vec<FileMeta>) -> Self {
        FileCatalog { files }
    }

    pub fn files(&self) -> &[FileMeta] {
        &self.files
    }

    pub fn get(&self, file_id: &str) -> Option<&FileMeta> {
        self.files.iter().find(|meta| meta.id == file_id)
    }

    fn get_mut(&mut self, file_id: &str) -> Option<&mut FileMeta> {
        self.files.iter_mut().find(|meta| meta.id == file_id)
    }

    /* Adds or replaces the row with the same id. */
    pub fn upsert(&mut self, meta: FileMeta) {
        match self.get_mut(&meta.id) {
            Some(existing) => *existing = meta,
            None => self.files.push(meta),
        }
    }

    /*
     * Changes only the display name. A `desired` name without an extension keeps
     * the current one. Returns true if the name changed.
     */
    pub fn rename_file(&mut self, file_id: &str, desired: &str) -> bool {
        let Some(meta) = self.get_mut(file_id) else {
            log::debug!("FileCatalog: rename of unknown file '{file_id}' ignored.");
            return false;
        };
        let name = display_name(desired, &meta.name);
        if name == meta.name {
            return false;
        }
        log::debug!("FileCatalog: Renaming '{file_id}' from '{}' to '{name}'", meta.name);
        meta.name = name;
        true
    }

    /*
     * Takes the content-derived fields of `replacement` (name, size, mime, upload
     * time, checksum) for the row with the same id. Module back-references stay.
     */
    pub fn replace_content(&mut self, replacement: FileMeta) -> bool {
        let Some(meta) = self.get_mut(&replacement.id) else {
            log::debug!("FileCatalog: replace of unknown file '{}' ignored.", replacement.id);
            return false;
        };
        meta.name = replacement.name;
        meta.size = replacement.size;
        meta.mime = replacement.mime;
        meta.uploaded_at = replacement.uploaded_at;
        meta.checksum = replacement.checksum;
        true
    }

    pub fn remove_file(&mut self, file_id: &str) -> Option<FileMeta> {
        let index = self.files.iter().position(|meta| meta.id == file_id)?;
        Some(self.files.remove(index))
    }

    /* Returns true if the set changed. Unknown file ids are ignored. */
    pub fn add_module_ref_to_file(&mut self, file_id: &str, module_title: &str) -> bool {
        match self.get_mut(file_id) {
            Some(meta) => meta.module_titles.insert(module_title.to_string()),
            None => {
                log::debug!("FileCatalog: add ref to unknown file '{file_id}' ignored.");
                false
            }
        }
    }

    pub fn remove_module_ref_from_file(&mut self, file_id: &str, module_title: &str) -> bool {
        match self.get_mut(file_id) {
            Some(meta) => meta.module_titles.remove(module_title),
            None => false,
        }
    }

    pub fn replace_module_title_in_all_files(&mut self, old_title: &str, new_title: &str) -> bool {
        let mut changed = false;
        for meta in self.files.iter_mut() {
            if meta.module_titles.remove(old_title) {
                meta.module_titles.insert(new_title.to_string());
                changed = true;
            }
        }
        changed
    }

    /*
     * Overwrites every file's `module_titles` with the set supplied in `refs`;
     * files absent from `refs` end up with an empty set. Rows are never removed.
     * Returns true if any file's set changed.
     */
    pub fn merge_module_refs_into_files_meta(&mut self, refs: &ModuleRefs) -> bool {
        let mut changed = false;
        for meta in self.files.iter_mut() {
            let wanted = refs.get(&meta.id).cloned().unwrap_or_default();
            if meta.module_titles != wanted {
                meta.module_titles = wanted;
                changed = true;
            }
        }
        changed
    }

    /* Applies effects in order. Returns true if any file's metadata changed. */
    pub fn apply_effects(&mut self, effects: &[RefEffect]) -> bool {
        let mut changed = false;
        for effect in effects {
            log::trace!("FileCatalog: Applying {effect:?}");
            changed |= match effect {
                RefEffect::AddRef {
                    file_id,
                    module_title,
                } => self.add_module_ref_to_file(file_id, module_title),
                RefEffect::RemoveRef {
                    file_id,
                    module_title,
                } => self.remove_module_ref_from_file(file_id, module_title),
                RefEffect::RenameModule {
                    old_title,
                    new_title,
                } => self.replace_module_title_in_all_files(old_title, new_title),
            };
        }
        changed
    }
}
