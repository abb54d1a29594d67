//! Pointer gestures over the canvas
//!
//! A small state machine turns raw pointer events into viewport changes and
//! node moves:
//!
//! ```text
//! Idle --press canvas--> Panning  --release--> Idle
//! Idle --press node----> Dragging --release--> Idle (+ DragRelease if moved)
//! ```
//!
//! Dragging takes precedence: a canvas press is ignored while a drag is in
//! progress. Pointer coordinates are relative to the viewport element.

use crate::error::TopologyError;
use crate::transform::{
    clamp_normalized, normalized_to_world, snap_to_grid, world_to_normalized, CanvasSize,
    NormalizedPoint, ScreenPoint, ViewportTransform, WorldPoint,
};
use crate::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGesture {
    /// Pointer position minus translation at gesture start
    origin: ScreenPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub node: NodeId,
    /// Pointer minus node center, in world space, fixed at drag start
    offset: WorldPoint,
    /// Position before the drag began
    pub committed: NormalizedPoint,
    /// Latest position under the pointer, if it has moved
    pub transient: Option<NormalizedPoint>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Panning(PanGesture),
    Dragging(DragGesture),
}

/// What a pointer move did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    Ignored,
    Panned,
    Dragged(NormalizedPoint),
}

/// A finished drag that moved its node
#[derive(Debug, Clone, PartialEq)]
pub struct DragRelease {
    pub node: NodeId,
    pub from: NormalizedPoint,
    pub to: NormalizedPoint,
}

/// All view state owned by the interaction controller
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    transform: ViewportTransform,
    canvas: CanvasSize,
    gesture: Gesture,
}

impl InteractionState {
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    #[inline]
    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Container was resized
    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
    }

    #[inline]
    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging(_))
    }

    #[inline]
    #[must_use]
    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning(_))
    }

    #[must_use]
    pub fn dragged_node(&self) -> Option<&NodeId> {
        match &self.gesture {
            Gesture::Dragging(drag) => Some(&drag.node),
            _ => None,
        }
    }

    /// Where `id` is drawn while it is being dragged
    #[must_use]
    pub fn transient_position(&self, id: &NodeId) -> Option<NormalizedPoint> {
        match &self.gesture {
            Gesture::Dragging(drag) if &drag.node == id => drag.transient,
            _ => None,
        }
    }

    /// Press on empty canvas; starts a pan unless a drag is running
    pub fn press_canvas(&mut self, pointer: ScreenPoint, button: PointerButton) -> bool {
        if button != PointerButton::Primary || self.is_dragging() {
            return false;
        }
        let translate = self.transform.translate();
        self.gesture = Gesture::Panning(PanGesture {
            origin: ScreenPoint::new(pointer.x - translate.x, pointer.y - translate.y),
        });
        true
    }

    /// Press on a node currently drawn at `position`; starts a drag
    ///
    /// # Errors
    /// - `TopologyError::InvalidCoordinate` if the pointer or position is not finite
    pub fn press_node(
        &mut self,
        node: NodeId,
        position: NormalizedPoint,
        pointer: ScreenPoint,
        button: PointerButton,
    ) -> Result<bool, TopologyError> {
        if button != PointerButton::Primary {
            return Ok(false);
        }
        let position = position.checked()?;
        let pointer_world = self.transform.screen_to_world(pointer);
        NormalizedPoint::new(pointer_world.x, pointer_world.y).checked()?;

        let center = normalized_to_world(position, self.canvas);
        tracing::debug!(node = %node, x = position.x, y = position.y, "drag started");
        self.gesture = Gesture::Dragging(DragGesture {
            node,
            offset: WorldPoint::new(pointer_world.x - center.x, pointer_world.y - center.y),
            committed: position,
            transient: None,
        });
        Ok(true)
    }

    /// Pointer moved
    ///
    /// While dragging, computes the node's clamped and optionally snapped
    /// position; while panning, moves the viewport.
    ///
    /// # Errors
    /// - `TopologyError::InvalidCoordinate` if the move produces a non-finite position
    pub fn move_pointer(&mut self, pointer: ScreenPoint, snap: bool) -> Result<PointerOutcome, TopologyError> {
        match &mut self.gesture {
            Gesture::Dragging(drag) => {
                let world = self.transform.screen_to_world(pointer);
                let target = WorldPoint::new(world.x - drag.offset.x, world.y - drag.offset.y);
                let normalized = world_to_normalized(target, self.canvas)?;
                let position = snap_to_grid(clamp_normalized(normalized)?, snap)?;
                drag.transient = Some(position);
                Ok(PointerOutcome::Dragged(position))
            }
            Gesture::Panning(pan) => {
                let origin = pan.origin;
                self.transform
                    .pan_to(ScreenPoint::new(pointer.x - origin.x, pointer.y - origin.y));
                Ok(PointerOutcome::Panned)
            }
            Gesture::Idle => Ok(PointerOutcome::Ignored),
        }
    }

    /// Pointer released; returns the move to commit, if the drag moved
    pub fn release(&mut self) -> Option<DragRelease> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging(drag) => {
                let to = drag.transient.filter(|to| *to != drag.committed)?;
                tracing::debug!(node = %drag.node, x = to.x, y = to.y, "drag released");
                Some(DragRelease {
                    node: drag.node,
                    from: drag.committed,
                    to,
                })
            }
            Gesture::Panning(_) | Gesture::Idle => None,
        }
    }

    /// Abandon the current gesture without committing anything
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Wheel notch at `pointer`
    pub fn wheel(&mut self, pointer: ScreenPoint, delta_y: f64) {
        self.transform.wheel(pointer, delta_y);
    }

    pub fn reset_view(&mut self) {
        self.transform.reset();
    }
}
