// src/main.rs

use course_outline::app_logic::{CourseEditorLogic, EditorEventHandler};
use course_outline::core::{
    ConfigManagerOperations, CoreBlobStore, CoreConfigManager, CoreCourseStore, RenderEntry,
    path_utils,
};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::process::ExitCode;
use std::sync::Arc;

const APP_NAME: &str = "CourseOutline";
const DEFAULT_COURSE_ID: &str = "default-course";
const STORE_SUBFOLDER_NAME: &str = "store";
const DEBUG_ENV_VAR: &str = "COURSE_OUTLINE_DEBUG";

fn initialize_logging() {
    let level = if std::env::var_os(DEBUG_ENV_VAR).is_some() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logger: {e}");
    }
}

/*
 * Picks the course to open: the command line argument, else the last opened
 * course, else the default. The choice is remembered for the next run.
 */
fn resolve_course_id(config: &dyn ConfigManagerOperations) -> String {
    let from_args = std::env::args().nth(1);
    let course_id = match from_args {
        Some(id) => id,
        None => match config.load_last_course_id(APP_NAME) {
            Ok(Some(id)) => id,
            Ok(None) => DEFAULT_COURSE_ID.to_string(),
            Err(e) => {
                log::warn!("Main: Could not read last course id: {e}");
                DEFAULT_COURSE_ID.to_string()
            }
        },
    };
    if let Err(e) = config.save_last_course_id(APP_NAME, Some(&course_id)) {
        log::warn!("Main: Could not remember course id '{course_id}': {e}");
    }
    course_id
}

fn log_outline(logic: &CourseEditorLogic) {
    let outline = logic.outline().render_outline();
    log::info!(
        "Course '{}': {} modules, {} files",
        logic.course_id(),
        outline.len(),
        logic.files().files().len()
    );
    for (module_id, rows) in outline {
        log::info!("{module_id}");
        for (row_id, entry) in rows {
            match entry {
                RenderEntry::Item { item, full_index } => log::info!(
                    "  [{full_index}] {}{} ({}) {row_id}",
                    "  ".repeat(item.indent as usize),
                    item.label,
                    item.kind.type_name()
                ),
                RenderEntry::Placeholder { hidden_count, .. } => {
                    log::info!("  ... {hidden_count} hidden {row_id}")
                }
            }
        }
    }
    for meta in logic.files().files() {
        log::info!(
            "File {} '{}' ({} bytes) used by {:?}",
            meta.id,
            meta.name,
            meta.size,
            meta.module_titles
        );
    }
}

fn main() -> ExitCode {
    initialize_logging();

    let config = CoreConfigManager::new();
    let course_id = resolve_course_id(&config);

    let Some(data_dir) = path_utils::get_base_app_data_local_dir(APP_NAME) else {
        log::error!("Main: No local data directory available.");
        return ExitCode::FAILURE;
    };
    let store = CoreCourseStore::new(data_dir.join(STORE_SUBFOLDER_NAME));
    let blob_store = CoreBlobStore::new(store.blob_dir());
    log::debug!("Main: Using store at {:?}", store.root());

    let mut logic = CourseEditorLogic::new(&course_id, Arc::new(store), Arc::new(blob_store));
    logic.load();
    while let Some(command) = logic.try_dequeue_command() {
        log::debug!("Main: {command:?}");
    }
    log_outline(&logic);
    logic.on_quit();
    ExitCode::SUCCESS
}
