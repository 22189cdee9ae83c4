/*
 * Interprets drag gestures over the outline. The controller is idle until a
 * drag starts on a module or item row. While dragging, each hover change
 * recomputes the drop indicator (module + insertion index) or, for modules
 * dragged over modules, the highlighted module. On drop, the latest hover state
 * is turned into a `DropPlan` for the mutation engine; the controller is idle
 * again afterwards whatever the outcome.
 *
 * Indicator indices refer to the target list as currently displayed; the
 * engine recomputes the final index after removing the dragged item.
 */
use crate::core::identity::DndId;
use crate::core::outline::{CourseOutline, DropTarget};
use crate::core::outline_view::section_insert_index;

// Vertical geometry of the hovered row and the pointer position at the event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerProbe {
    pub pointer_y: f64,
    pub row_top: f64,
    pub row_height: f64,
}

impl PointerProbe {
    pub fn is_below_midpoint(&self) -> bool {
        self.pointer_y > self.row_top + self.row_height / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndicator {
    pub module_title: String,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveDrag {
    active: DndId,
    over: Option<DndId>,
    placement: Placement,
    indicator: Option<DropIndicator>,
    highlight_module: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging(ActiveDrag),
}

// The list mutation a completed drop asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPlan {
    MoveModule {
        active_title: String,
        over_title: String,
    },
    MoveItem {
        source_module: String,
        label: String,
        target_module: String,
        target: DropTarget,
    },
}

pub struct DragController {
    state: DragState,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        DragController {
            state: DragState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn active(&self) -> Option<&DndId> {
        match &self.state {
            DragState::Dragging(drag) => Some(&drag.active),
            DragState::Idle => None,
        }
    }

    pub fn indicator(&self) -> Option<&DropIndicator> {
        match &self.state {
            DragState::Dragging(drag) => drag.indicator.as_ref(),
            DragState::Idle => None,
        }
    }

    pub fn highlight_module(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging(drag) => drag.highlight_module.as_deref(),
            DragState::Idle => None,
        }
    }

    /* Only module and item rows can be dragged; anything else is ignored. */
    pub fn drag_start(&mut self, active: DndId) {
        if !matches!(active, DndId::Module { .. } | DndId::Item { .. }) {
            log::debug!("DragController: {active} is not draggable.");
            return;
        }
        log::trace!("DragController: Drag started on {active}");
        self.state = DragState::Dragging(ActiveDrag {
            active,
            over: None,
            placement: Placement::Before,
            indicator: None,
            highlight_module: None,
        });
    }

    pub fn drag_over(
        &mut self,
        outline: &CourseOutline,
        over: Option<DndId>,
        probe: Option<PointerProbe>,
    ) {
        let DragState::Dragging(drag) = &mut self.state else {
            return;
        };
        drag.indicator = None;
        drag.highlight_module = None;
        drag.placement = match probe {
            Some(probe) if probe.is_below_midpoint() => Placement::After,
            _ => Placement::Before,
        };

        match (&drag.active, over.as_ref()) {
            (DndId::Module { .. }, Some(DndId::Module { title })) => {
                drag.highlight_module = Some(title.clone());
            }
            (DndId::Item { .. }, Some(target)) => {
                drag.indicator = Self::indicator_for(outline, target, drag.placement);
            }
            _ => {}
        }
        drag.over = over;
    }

    fn indicator_for(
        outline: &CourseOutline,
        target: &DndId,
        placement: Placement,
    ) -> Option<DropIndicator> {
        let module = outline.module(target.module_title())?;
        let index = match target {
            DndId::Item { label, .. } => {
                let index = module.item_index(label)?;
                match placement {
                    Placement::Before => index,
                    Placement::After => index + 1,
                }
            }
            DndId::Container { .. } => module.items.len(),
            DndId::Placeholder { section_label, .. } => {
                section_insert_index(&module.items, section_label)?
            }
            DndId::Module { .. } => return None,
        };
        Some(DropIndicator {
            module_title: module.title.clone(),
            index,
        })
    }

    /* Ends the gesture. A drop without a resolvable target yields no plan. */
    pub fn drag_end(&mut self) -> Option<DropPlan> {
        let DragState::Dragging(drag) = std::mem::replace(&mut self.state, DragState::Idle) else {
            return None;
        };
        let over = drag.over?;
        let plan = match (drag.active, over) {
            (DndId::Module { title }, DndId::Module { title: over_title }) => DropPlan::MoveModule {
                active_title: title,
                over_title,
            },
            (
                DndId::Item {
                    module_title,
                    label,
                },
                target,
            ) => {
                let (target_module, target) = match target {
                    DndId::Item {
                        module_title,
                        label,
                    } => (
                        module_title,
                        match drag.placement {
                            Placement::Before => DropTarget::Before(label),
                            Placement::After => DropTarget::After(label),
                        },
                    ),
                    DndId::Container { module_title } => (module_title, DropTarget::End),
                    DndId::Placeholder {
                        module_title,
                        section_label,
                    } => (module_title, DropTarget::IntoSection(section_label)),
                    DndId::Module { .. } => return None,
                };
                DropPlan::MoveItem {
                    source_module: module_title,
                    label,
                    target_module,
                    target,
                }
            }
            _ => return None,
        };
        log::debug!("DragController: Drop resolved to {plan:?}");
        Some(plan)
    }

    pub fn drag_cancel(&mut self) {
        if self.is_dragging() {
            log::trace!("DragController: Drag cancelled.");
        }
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ItemDraft;

    fn outline() -> CourseOutline {
        let mut outline = CourseOutline::default();
        outline.add_module("Week 1");
        outline.add_module("Week 2");
        outline.add_item("Week 1", &ItemDraft::page("Course Overview"));
        outline.add_item("Week 1", &ItemDraft::section("Readings"));
        outline.add_item("Week 1", &ItemDraft::link("Chapter 1", "u").indented(1));
        outline.add_item("Week 1", &ItemDraft::link("Chapter 2", "u").indented(1));
        outline.add_item("Week 1", &ItemDraft::page("Wrap-up"));
        outline.toggle_section_collapsed("Week 1", "Readings");
        outline.add_item("Week 2", &ItemDraft::file("Slides.pdf", "f1"));
        outline
    }

    fn probe(pointer_y: f64) -> Option<PointerProbe> {
        Some(PointerProbe {
            pointer_y,
            row_top: 100.0,
            row_height: 20.0,
        })
    }

    #[test]
    fn test_starts_idle_and_ignores_non_draggable_rows() {
        let mut drag = DragController::new();
        assert!(!drag.is_dragging());
        drag.drag_start(DndId::container("Week 1"));
        assert!(!drag.is_dragging());
        drag.drag_start(DndId::placeholder("Week 1", "Readings"));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_item_over_item_uses_vertical_midpoint() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::item("Week 2", "Slides.pdf"));

        drag.drag_over(&outline, Some(DndId::item("Week 1", "Course Overview")), probe(105.0));
        assert_eq!(
            drag.indicator(),
            Some(&DropIndicator {
                module_title: "Week 1".to_string(),
                index: 0
            })
        );

        drag.drag_over(&outline, Some(DndId::item("Week 1", "Course Overview")), probe(115.0));
        assert_eq!(drag.indicator().map(|i| i.index), Some(1));
    }

    #[test]
    fn test_item_over_container_appends() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::item("Week 2", "Slides.pdf"));
        drag.drag_over(&outline, Some(DndId::container("Week 1")), None);
        assert_eq!(drag.indicator().map(|i| i.index), Some(5));
    }

    #[test]
    fn test_item_over_placeholder_targets_span_boundary() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::item("Week 2", "Slides.pdf"));
        drag.drag_over(&outline, Some(DndId::placeholder("Week 1", "Readings")), None);
        assert_eq!(drag.indicator().map(|i| i.index), Some(4));
    }

    #[test]
    fn test_module_over_module_only_highlights() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::module("Week 2"));
        drag.drag_over(&outline, Some(DndId::module("Week 1")), probe(119.0));
        assert_eq!(drag.highlight_module(), Some("Week 1"));
        assert_eq!(drag.indicator(), None);

        drag.drag_over(&outline, Some(DndId::item("Week 1", "Wrap-up")), None);
        assert_eq!(drag.highlight_module(), None);

        drag.drag_over(&outline, Some(DndId::module("Week 1")), None);
        assert_eq!(
            drag.drag_end(),
            Some(DropPlan::MoveModule {
                active_title: "Week 2".to_string(),
                over_title: "Week 1".to_string(),
            })
        );
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drop_uses_latest_hover() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::item("Week 1", "Wrap-up"));
        drag.drag_over(&outline, Some(DndId::container("Week 2")), None);
        drag.drag_over(&outline, Some(DndId::item("Week 1", "Course Overview")), probe(119.0));

        assert_eq!(
            drag.drag_end(),
            Some(DropPlan::MoveItem {
                source_module: "Week 1".to_string(),
                label: "Wrap-up".to_string(),
                target_module: "Week 1".to_string(),
                target: DropTarget::After("Course Overview".to_string()),
            })
        );
    }

    #[test]
    fn test_drop_targets_for_container_and_placeholder() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::item("Week 2", "Slides.pdf"));
        drag.drag_over(&outline, Some(DndId::container("Week 1")), None);
        assert!(matches!(
            drag.drag_end(),
            Some(DropPlan::MoveItem {
                target: DropTarget::End,
                ..
            })
        ));

        drag.drag_start(DndId::item("Week 2", "Slides.pdf"));
        drag.drag_over(&outline, Some(DndId::placeholder("Week 1", "Readings")), None);
        assert_eq!(
            drag.drag_end(),
            Some(DropPlan::MoveItem {
                source_module: "Week 2".to_string(),
                label: "Slides.pdf".to_string(),
                target_module: "Week 1".to_string(),
                target: DropTarget::IntoSection("Readings".to_string()),
            })
        );
    }

    #[test]
    fn test_drop_without_target_is_noop_and_resets() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::item("Week 2", "Slides.pdf"));
        drag.drag_over(&outline, Some(DndId::container("Week 1")), None);
        drag.drag_over(&outline, None, None);
        assert_eq!(drag.indicator(), None);
        assert_eq!(drag.drag_end(), None);
        assert!(!drag.is_dragging());
        assert_eq!(drag.drag_end(), None);
    }

    #[test]
    fn test_mismatched_kinds_yield_no_plan() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::module("Week 1"));
        drag.drag_over(&outline, Some(DndId::container("Week 2")), None);
        assert_eq!(drag.drag_end(), None);

        drag.drag_start(DndId::item("Week 2", "Slides.pdf"));
        drag.drag_over(&outline, Some(DndId::module("Week 1")), None);
        assert_eq!(drag.indicator(), None);
        assert_eq!(drag.drag_end(), None);
    }

    #[test]
    fn test_hover_over_unknown_row_clears_indicator() {
        let outline = outline();
        let mut drag = DragController::new();
        drag.drag_start(DndId::item("Week 2", "Slides.pdf"));
        drag.drag_over(&outline, Some(DndId::item("Week 1", "Gone")), None);
        assert_eq!(drag.indicator(), None);
        drag.drag_cancel();
        assert!(!drag.is_dragging());
    }
}
