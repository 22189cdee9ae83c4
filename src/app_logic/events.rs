/*
 * The vocabulary between the outline view and `CourseEditorLogic`: events the
 * view raises, commands the logic queues for the view, and the handler trait
 * tying them together. Identities arrive as strings, exactly as the
 * drag-and-drop layer knows them; the logic parses them against the current
 * module titles.
 */
use super::drag::PointerProbe;
use crate::core::models::ItemDraft;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    DragStarted {
        active_id: String,
    },
    DragOver {
        over_id: Option<String>,
        probe: Option<PointerProbe>,
    },
    DragEnded,
    DragCancelled,
    AddModule {
        title: String,
    },
    EditModule {
        old_title: String,
        new_title: String,
    },
    BeginDeleteModule {
        title: String,
    },
    FinishDeleteModule {
        title: String,
    },
    CancelDeleteModule {
        title: String,
    },
    AddItem {
        module_title: String,
        draft: ItemDraft,
    },
    EditItem {
        module_title: String,
        old_label: String,
        draft: ItemDraft,
    },
    DeleteItem {
        module_title: String,
        label: String,
    },
    IndentItem {
        module_title: String,
        label: String,
    },
    OutdentItem {
        module_title: String,
        label: String,
    },
    ToggleSection {
        module_title: String,
        section_label: String,
    },
    RegeneratePageId {
        module_title: String,
        label: String,
    },
    UploadFile {
        name: String,
        mime: String,
        content: Vec<u8>,
    },
    /* `display_name` without an extension keeps the file's current one. */
    RenameFile {
        file_id: String,
        display_name: String,
    },
    /* New content for an existing file id; module references are kept. */
    ReplaceFile {
        file_id: String,
        name: String,
        mime: String,
        content: Vec<u8>,
        display_name: Option<String>,
    },
    DownloadFile {
        file_id: String,
    },
    DeleteFile {
        file_id: String,
    },
    /* Collects finished blob jobs. Raised by the view on its own tick. */
    PollTransfers,
    SavePageContent {
        page_id: String,
        content: String,
    },
    StorageChanged,
    ResyncFileRefs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    RefreshOutline,
    RefreshFiles,
    ShowDropIndicator {
        module_title: String,
        index: usize,
    },
    ClearDropIndicator,
    HighlightModule {
        title: Option<String>,
    },
    FadeModule {
        title: String,
    },
    UnfadeModule {
        title: String,
    },
    SetFileBusy {
        file_id: String,
        busy: bool,
    },
    DeliverDownload {
        file_id: String,
        name: String,
        content: Vec<u8>,
    },
    ShowError {
        message: String,
    },
}

pub trait EditorEventHandler {
    // Handles one view event, queueing any resulting `ViewCommand`s.
    fn handle_event(&mut self, event: EditorEvent);

    // Takes the oldest queued command, if any.
    fn try_dequeue_command(&mut self) -> Option<ViewCommand>;

    fn on_quit(&mut self) {}
}
