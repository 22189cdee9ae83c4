/*
 * This module consolidates the core, platform-agnostic logic of the application:
 * the course data model, drag-and-drop identities, the outline mutation engine
 * and file cross-reference reconciliation, plus the persistence adapters
 * (`CourseStoreOperations`, `BlobStoreOperations`, `ConfigManagerOperations`)
 * the controller is written against.
 */
pub mod blob_store;
pub mod change_signal;
pub mod checksum_utils;
pub mod config;
pub mod file_refs;
pub mod identity;
pub mod models;
pub mod naming;
pub mod outline;
pub mod outline_view;
pub mod path_utils;
pub mod storage;
pub mod transfers;

// Re-export key structures and enums
pub use models::{
    DEFAULT_MIME, DraftKind, FileMeta, Item, ItemDraft, ItemKind, MAX_INDENT, Module,
    default_modules,
};

pub use identity::{DndId, IdentityError};

// Re-export engine related items
pub use file_refs::{FileCatalog, ModuleRefs, RefEffect, collect_module_refs};
pub use outline::{CourseOutline, DropTarget, MutationOutcome};
pub use outline_view::RenderEntry;

// Re-export persistence related items
pub use blob_store::{BlobStoreOperations, CoreBlobStore};
pub use storage::{CoreCourseStore, CourseStoreOperations, StorageError};
pub use transfers::{BlobTransfers, TransferCompletion, TransferKind};

pub use change_signal::ChangeNotifier;

// Re-export config related items
pub use config::{ConfigError, ConfigManagerOperations, CoreConfigManager};
