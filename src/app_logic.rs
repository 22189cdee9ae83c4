/*
 * This module provides the application logic layer, centered around
 * `CourseEditorLogic` which acts as the Presenter/Controller for the course
 * outline editor, and `DragController` which interprets drag gestures.
 * Unit tests for `CourseEditorLogic` are in `handler_tests.rs`.
 */
pub mod drag;
pub mod events;
pub mod handler;


pub use drag::{DragController, DropIndicator, DropPlan, PointerProbe};
pub use events::{EditorEvent, EditorEventHandler, ViewCommand};
pub use handler::CourseEditorLogic;
