use super::drag::{DragController, DropPlan, PointerProbe};
use super::events::{EditorEvent, EditorEventHandler, ViewCommand};
use crate::core::{
    BlobStoreOperations, BlobTransfers, ChangeNotifier, CourseOutline, CourseStoreOperations,
    DEFAULT_MIME, DndId, FileCatalog, FileMeta, MutationOutcome, TransferCompletion,
    TransferKind, checksum_utils, collect_module_refs, naming,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;
use time::OffsetDateTime;

/*
 * Owns the canonical course outline and the course's file catalog, and is the
 * only place either is changed. View events are turned into engine operations;
 * every change that the engine reports is persisted (module list first, then
 * file metadata if the reported cross-reference effects touched it) and
 * announced to the view through queued `ViewCommand`s.
 *
 * Storage failures are logged and surfaced but never roll back the in-memory
 * state. A document that could not be read is never overwritten until a later
 * load succeeds. Blob transfers run in the background; their completions are
 * picked up by `EditorEvent::PollTransfers`.
 */
// Replacement content as the view delivered it.
struct FileUpload {
    name: String,
    mime: String,
    content: Vec<u8>,
    display_name: Option<String>,
}

pub struct CourseEditorLogic {
    pub(crate) course_id: String,
    pub(crate) outline: CourseOutline,
    pub(crate) files: FileCatalog,
    pub(crate) drag: DragController,
    pub(crate) fading_modules: HashSet<String>,
    pending_uploads: HashMap<String, FileMeta>,
    pending_replacements: HashMap<String, FileMeta>,
    modules_load_failed: bool,
    files_meta_load_failed: bool,
    store: Arc<dyn CourseStoreOperations>,
    transfers: BlobTransfers,
    notifier: ChangeNotifier,
    synchronous_command_queue: VecDeque<ViewCommand>,
}

impl CourseEditorLogic {
    pub fn new(
        course_id: &str,
        store: Arc<dyn CourseStoreOperations>,
        blob_store: Arc<dyn BlobStoreOperations>,
    ) -> Self {
        CourseEditorLogic {
            course_id: course_id.to_string(),
            outline: CourseOutline::default(),
            files: FileCatalog::default(),
            drag: DragController::new(),
            fading_modules: HashSet::new(),
            pending_uploads: HashMap::new(),
            pending_replacements: HashMap::new(),
            modules_load_failed: false,
            files_meta_load_failed: false,
            store,
            transfers: BlobTransfers::new(blob_store),
            notifier: ChangeNotifier::new(),
            synchronous_command_queue: VecDeque::new(),
        }
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn outline(&self) -> &CourseOutline {
        &self.outline
    }

    pub fn files(&self) -> &FileCatalog {
        &self.files
    }

    pub fn is_fading(&self, module_title: &str) -> bool {
        self.fading_modules.contains(module_title)
    }

    pub fn is_file_busy(&self, file_id: &str) -> bool {
        self.transfers.is_busy(file_id)
    }

    /* Receives a signal after every successful file-metadata write. */
    pub fn subscribe_storage_changes(&mut self) -> Receiver<()> {
        self.notifier.subscribe()
    }

    fn enqueue(&mut self, command: ViewCommand) {
        self.synchronous_command_queue.push_back(command);
    }

    fn report_storage_error(&mut self, what: &str, error: &dyn std::error::Error) {
        log::error!("CourseEditorLogic: Failed to {what}: {error}");
        self.enqueue(ViewCommand::ShowError {
            message: format!("Failed to {what}: {error}"),
        });
    }

    /*
     * Loads the module list and this course's file metadata, then resyncs the
     * metadata back-references against the loaded outline. A failed read leaves
     * the corresponding state empty and blocks saving that document.
     */
    pub fn load(&mut self) {
        log::debug!("CourseEditorLogic: Loading course '{}'", self.course_id);
        match self.store.load_modules() {
            Ok(modules) => {
                self.outline = CourseOutline::new(modules);
                self.modules_load_failed = false;
            }
            Err(e) => {
                self.modules_load_failed = true;
                self.report_storage_error("load modules", &e);
            }
        }
        self.reload_files_meta();
        self.resync_file_refs();
        self.enqueue(ViewCommand::RefreshOutline);
    }

    fn reload_files_meta(&mut self) {
        match self.store.load_files_meta(&self.course_id) {
            Ok(catalog) => {
                self.files = catalog;
                self.files_meta_load_failed = false;
            }
            Err(e) => {
                self.files_meta_load_failed = true;
                self.report_storage_error("load file metadata", &e);
            }
        }
        self.enqueue(ViewCommand::RefreshFiles);
    }

    /* Recomputes every file's module back-references; persists only if any changed. */
    pub fn resync_file_refs(&mut self) {
        if self.modules_load_failed {
            log::warn!("CourseEditorLogic: Module list was not loaded; skipping resync.");
            return;
        }
        let refs = collect_module_refs(self.outline.modules());
        if self.files.merge_module_refs_into_files_meta(&refs) {
            log::info!("CourseEditorLogic: File references were out of sync; repaired.");
            self.persist_files_meta();
            self.enqueue(ViewCommand::RefreshFiles);
        }
    }

    fn refuse_overwrite(&mut self, what: &str) {
        log::error!("CourseEditorLogic: Not saving {what}; the stored document could not be read.");
        self.enqueue(ViewCommand::ShowError {
            message: format!("Not saving {what}: the stored document could not be read."),
        });
    }

    fn persist_modules(&mut self) {
        if self.modules_load_failed {
            self.refuse_overwrite("modules");
            return;
        }
        if let Err(e) = self.store.save_modules(self.outline.modules()) {
            self.report_storage_error("save modules", &e);
        }
    }

    fn persist_files_meta(&mut self) {
        if self.files_meta_load_failed {
            self.refuse_overwrite("file metadata");
            return;
        }
        match self.store.save_files_meta(&self.course_id, &self.files) {
            Ok(()) => self.notifier.notify(),
            Err(e) => self.report_storage_error("save file metadata", &e),
        }
    }

    /* Persists and announces a mutation. Returns whether anything changed. */
    fn commit(&mut self, outcome: MutationOutcome) -> bool {
        if !outcome.changed {
            return false;
        }
        self.persist_modules();
        if self.files.apply_effects(&outcome.effects) {
            self.persist_files_meta();
            self.enqueue(ViewCommand::RefreshFiles);
        }
        self.enqueue(ViewCommand::RefreshOutline);
        true
    }

    fn parse_id(&self, id: &str) -> Option<DndId> {
        match DndId::parse_in(id, self.outline.modules()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("CourseEditorLogic: Ignoring identity: {e}");
                None
            }
        }
    }

    fn apply_drop(&mut self, plan: DropPlan) {
        let outcome = match &plan {
            DropPlan::MoveModule {
                active_title,
                over_title,
            } => self.outline.move_module(active_title, over_title),
            DropPlan::MoveItem {
                source_module,
                label,
                target_module,
                target,
            } => self
                .outline
                .move_item(source_module, label, target_module, target),
        };
        if !self.commit(outcome) {
            log::debug!("CourseEditorLogic: Drop {plan:?} changed nothing.");
        }
    }

    fn on_drag_over(&mut self, over_id: Option<String>, probe: Option<PointerProbe>) {
        let over = over_id.as_deref().and_then(|id| self.parse_id(id));
        self.drag.drag_over(&self.outline, over, probe);
        let dragging_module = self.drag.active().is_some_and(DndId::is_module);
        if dragging_module {
            let title = self.drag.highlight_module().map(str::to_string);
            self.enqueue(ViewCommand::HighlightModule { title });
            return;
        }
        let command = match self.drag.indicator() {
            Some(indicator) => ViewCommand::ShowDropIndicator {
                module_title: indicator.module_title.clone(),
                index: indicator.index,
            },
            None => ViewCommand::ClearDropIndicator,
        };
        self.enqueue(command);
    }

    fn clear_drag_feedback(&mut self) {
        self.enqueue(ViewCommand::ClearDropIndicator);
        self.enqueue(ViewCommand::HighlightModule { title: None });
    }

    fn on_edit_module(&mut self, old_title: &str, new_title: &str) {
        let outcome = self.outline.edit_module(old_title, new_title);
        if let Some(resolved) = outcome.resolved_name.clone() {
            if outcome.changed && self.fading_modules.remove(old_title) {
                self.fading_modules.insert(resolved);
            }
        }
        self.commit(outcome);
    }

    fn on_upload_file(&mut self, name: String, mime: String, content: Vec<u8>) {
        let checksum = checksum_utils::calculate_sha256_checksum(&content);
        let now = OffsetDateTime::now_utc();
        let file_id = checksum_utils::derive_file_id(&name, &checksum, now.unix_timestamp_nanos());
        let mime = if mime.is_empty() { DEFAULT_MIME } else { mime.as_str() };
        let mut meta = FileMeta::new(file_id.as_str(), name, content.len() as u64, mime);
        meta.uploaded_at = now.unix_timestamp();
        meta.checksum = checksum;

        if self
            .transfers
            .begin_upload(&self.course_id, &file_id, content)
        {
            log::info!(
                "CourseEditorLogic: Uploading '{}' as '{file_id}' ({} bytes)",
                meta.name,
                meta.size
            );
            self.pending_uploads.insert(file_id.clone(), meta);
            self.enqueue(ViewCommand::SetFileBusy {
                file_id,
                busy: true,
            });
        }
    }

    fn on_rename_file(&mut self, file_id: &str, display_name: &str) {
        if self.transfers.is_busy(file_id) {
            log::warn!("CourseEditorLogic: '{file_id}' is busy; rename ignored.");
            return;
        }
        if self.files.rename_file(file_id, display_name) {
            self.persist_files_meta();
            self.enqueue(ViewCommand::RefreshFiles);
        }
    }

    /*
     * Overwrites an existing file's blob. The metadata row is updated once the
     * blob write completes; the display name only changes when one is supplied.
     */
    fn on_replace_file(&mut self, file_id: String, upload: FileUpload) {
        let Some(current) = self.files.get(&file_id) else {
            log::warn!("CourseEditorLogic: Replace of unknown file '{file_id}' ignored.");
            return;
        };
        let name = match upload.display_name.as_deref() {
            Some(desired) => naming::display_name(desired, &upload.name),
            None => current.name.clone(),
        };
        let mime = if upload.mime.is_empty() {
            DEFAULT_MIME
        } else {
            upload.mime.as_str()
        };
        let mut meta = FileMeta::new(file_id.as_str(), name, upload.content.len() as u64, mime);
        meta.uploaded_at = OffsetDateTime::now_utc().unix_timestamp();
        meta.checksum = checksum_utils::calculate_sha256_checksum(&upload.content);

        if self
            .transfers
            .begin_replace(&self.course_id, &file_id, upload.content)
        {
            log::info!(
                "CourseEditorLogic: Replacing content of '{file_id}' ({} bytes)",
                meta.size
            );
            self.pending_replacements.insert(file_id.clone(), meta);
            self.enqueue(ViewCommand::SetFileBusy {
                file_id,
                busy: true,
            });
        }
    }

    fn on_download_file(&mut self, file_id: String) {
        if self.files.get(&file_id).is_none() {
            log::warn!("CourseEditorLogic: Download of unknown file '{file_id}' ignored.");
            return;
        }
        if self.transfers.begin_download(&self.course_id, &file_id) {
            self.enqueue(ViewCommand::SetFileBusy {
                file_id,
                busy: true,
            });
        }
    }

    fn on_delete_file(&mut self, file_id: String) {
        let Some(meta) = self.files.get(&file_id) else {
            log::warn!("CourseEditorLogic: Delete of unknown file '{file_id}' ignored.");
            return;
        };
        if !meta.module_titles.is_empty() {
            log::warn!(
                "CourseEditorLogic: Deleting '{file_id}' still referenced by {:?}; those items will dangle.",
                meta.module_titles
            );
        }
        if self.transfers.begin_delete(&self.course_id, &file_id) {
            self.enqueue(ViewCommand::SetFileBusy {
                file_id,
                busy: true,
            });
        }
    }

    fn on_transfer_completed(&mut self, completion: TransferCompletion) {
        let TransferCompletion {
            file_id,
            kind,
            outcome,
        } = completion;
        self.enqueue(ViewCommand::SetFileBusy {
            file_id: file_id.clone(),
            busy: false,
        });
        match (kind, outcome) {
            (TransferKind::Upload, Ok(_)) => {
                if let Some(meta) = self.pending_uploads.remove(&file_id) {
                    self.files.upsert(meta);
                    self.persist_files_meta();
                    self.enqueue(ViewCommand::RefreshFiles);
                }
            }
            (TransferKind::Replace, Ok(_)) => {
                if let Some(meta) = self.pending_replacements.remove(&file_id) {
                    if self.files.replace_content(meta) {
                        self.persist_files_meta();
                        self.enqueue(ViewCommand::RefreshFiles);
                    }
                }
            }
            (TransferKind::Download, Ok(content)) => {
                let name = self
                    .files
                    .get(&file_id)
                    .map_or_else(|| file_id.clone(), |meta| meta.name.clone());
                self.enqueue(ViewCommand::DeliverDownload {
                    file_id,
                    name,
                    content,
                });
            }
            (TransferKind::Delete, Ok(_)) => {
                if self.files.remove_file(&file_id).is_some() {
                    self.persist_files_meta();
                    self.enqueue(ViewCommand::RefreshFiles);
                }
            }
            (kind, Err(e)) => {
                match kind {
                    TransferKind::Upload => {
                        self.pending_uploads.remove(&file_id);
                    }
                    TransferKind::Replace => {
                        self.pending_replacements.remove(&file_id);
                    }
                    TransferKind::Download | TransferKind::Delete => {}
                }
                self.enqueue(ViewCommand::ShowError {
                    message: format!("{kind:?} of '{file_id}' failed: {e}"),
                });
            }
        }
    }

    /* Blocks up to `timeout` for one blob job and processes it. */
    pub fn wait_for_transfer(&mut self, timeout: Duration) -> bool {
        match self.transfers.wait_next(timeout) {
            Some(completion) => {
                self.on_transfer_completed(completion);
                true
            }
            None => false,
        }
    }

    pub fn load_page_content(&mut self, page_id: &str) -> Option<String> {
        match self.store.load_page_content(&self.course_id, page_id) {
            Ok(content) => content,
            Err(e) => {
                self.report_storage_error("load page content", &e);
                None
            }
        }
    }
}

impl EditorEventHandler for CourseEditorLogic {
    fn handle_event(&mut self, event: EditorEvent) {
        log::trace!("CourseEditorLogic: Handling {event:?}");
        match event {
            EditorEvent::DragStarted { active_id } => {
                if let Some(active) = self.parse_id(&active_id) {
                    self.drag.drag_start(active);
                }
            }
            EditorEvent::DragOver { over_id, probe } => self.on_drag_over(over_id, probe),
            EditorEvent::DragEnded => {
                let plan = self.drag.drag_end();
                self.clear_drag_feedback();
                if let Some(plan) = plan {
                    self.apply_drop(plan);
                }
            }
            EditorEvent::DragCancelled => {
                self.drag.drag_cancel();
                self.clear_drag_feedback();
            }
            EditorEvent::AddModule { title } => {
                let outcome = self.outline.add_module(&title);
                self.commit(outcome);
            }
            EditorEvent::EditModule {
                old_title,
                new_title,
            } => self.on_edit_module(&old_title, &new_title),
            EditorEvent::BeginDeleteModule { title } => {
                if self.outline.module(&title).is_some() && self.fading_modules.insert(title.clone())
                {
                    self.enqueue(ViewCommand::FadeModule { title });
                }
            }
            EditorEvent::FinishDeleteModule { title } => {
                self.fading_modules.remove(&title);
                let outcome = self.outline.delete_module(&title);
                self.commit(outcome);
            }
            EditorEvent::CancelDeleteModule { title } => {
                if self.fading_modules.remove(&title) {
                    self.enqueue(ViewCommand::UnfadeModule { title });
                }
            }
            EditorEvent::AddItem {
                module_title,
                draft,
            } => {
                let outcome = self.outline.add_item(&module_title, &draft);
                self.commit(outcome);
            }
            EditorEvent::EditItem {
                module_title,
                old_label,
                draft,
            } => {
                let outcome = self.outline.edit_item(&module_title, &old_label, &draft);
                self.commit(outcome);
            }
            EditorEvent::DeleteItem {
                module_title,
                label,
            } => {
                let outcome = self.outline.delete_item(&module_title, &label);
                self.commit(outcome);
            }
            EditorEvent::IndentItem {
                module_title,
                label,
            } => {
                let outcome = self.outline.indent_item(&module_title, &label);
                self.commit(outcome);
            }
            EditorEvent::OutdentItem {
                module_title,
                label,
            } => {
                let outcome = self.outline.outdent_item(&module_title, &label);
                self.commit(outcome);
            }
            EditorEvent::ToggleSection {
                module_title,
                section_label,
            } => {
                let outcome = self
                    .outline
                    .toggle_section_collapsed(&module_title, &section_label);
                self.commit(outcome);
            }
            EditorEvent::RegeneratePageId {
                module_title,
                label,
            } => {
                let outcome = self.outline.regenerate_page_id(&module_title, &label);
                self.commit(outcome);
            }
            EditorEvent::UploadFile {
                name,
                mime,
                content,
            } => self.on_upload_file(name, mime, content),
            EditorEvent::RenameFile {
                file_id,
                display_name,
            } => self.on_rename_file(&file_id, &display_name),
            EditorEvent::ReplaceFile {
                file_id,
                name,
                mime,
                content,
                display_name,
            } => self.on_replace_file(
                file_id,
                FileUpload {
                    name,
                    mime,
                    content,
                    display_name,
                },
            ),
            EditorEvent::DownloadFile { file_id } => self.on_download_file(file_id),
            EditorEvent::DeleteFile { file_id } => self.on_delete_file(file_id),
            EditorEvent::PollTransfers => {
                for completion in self.transfers.poll() {
                    self.on_transfer_completed(completion);
                }
            }
            EditorEvent::SavePageContent { page_id, content } => {
                if let Err(e) = self
                    .store
                    .save_page_content(&self.course_id, &page_id, &content)
                {
                    self.report_storage_error("save page content", &e);
                }
            }
            EditorEvent::StorageChanged => self.reload_files_meta(),
            EditorEvent::ResyncFileRefs => self.resync_file_refs(),
        }
    }

    fn try_dequeue_command(&mut self) -> Option<ViewCommand> {
        self.synchronous_command_queue.pop_front()
    }

    fn on_quit(&mut self) {
        if self.transfers.busy_count() > 0 {
            log::warn!(
                "CourseEditorLogic: Quitting with {} blob transfers in flight.",
                self.transfers.busy_count()
            );
        }
        log::info!("CourseEditorLogic: Closing course '{}'.", self.course_id);
    }
}
