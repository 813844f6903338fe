//! Stroke controller
//!
//! A three-state machine over pointer press/release. It decides when a
//! stroke begins and ends and which pointer samples become dabs. Dabs are
//! spacing-gated in texel units against the texture's largest dimension,
//! and at most one dab is emitted per tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::brush::BrushState;

/// Stroke controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeState {
    #[default]
    Idle,
    /// Button held, no dab accepted yet
    Pressed,
    /// Button held, at least one dab accepted
    Painting,
}

impl StrokeState {
    #[inline]
    pub fn is_pressed(self) -> bool {
        !matches!(self, StrokeState::Idle)
    }
}

/// Stroke boundary events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrokeEvent {
    StrokeBegun,
    StrokeEnded,
}

/// Pointer button edge observed during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonEdge {
    Down,
    Up,
}

/// Pointer sample for one input tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    /// Screen position in pixels, origin top-left
    pub position: Vec2,
    /// Button edge observed this tick, if any
    pub edge: Option<ButtonEdge>,
    /// Navigation modifier held (suppresses starting a stroke)
    pub alt: bool,
}

impl PointerInput {
    pub fn moved(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn down(position: Vec2) -> Self {
        Self {
            position,
            edge: Some(ButtonEdge::Down),
            alt: false,
        }
    }

    pub fn up(position: Vec2) -> Self {
        Self {
            position,
            edge: Some(ButtonEdge::Up),
            alt: false,
        }
    }

    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }
}

/// What a tick produced, in order: events first, then the dab
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub events: Vec<StrokeEvent>,
    /// UV of the accepted dab, if any
    pub dab: Option<Vec2>,
}

type StrokeListener = Box<dyn FnMut(StrokeEvent)>;

/// Stroke state machine with spacing gate
#[derive(Default)]
pub struct StrokeController {
    state: StrokeState,
    listeners: Vec<StrokeListener>,
}

impl std::fmt::Debug for StrokeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeController")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl StrokeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    /// Register a listener called synchronously for every stroke event
    pub fn subscribe(&mut self, listener: impl FnMut(StrokeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Advance one input tick
    ///
    /// `hit_uv` is the surface UV under the pointer this tick (None on a
    /// miss). Accepted dabs update `brush.last_paint_uv`; a release clears it.
    pub fn tick(
        &mut self,
        input: &PointerInput,
        hit_uv: Option<Vec2>,
        brush: &mut BrushState,
        largest_dimension: u32,
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if let Some(uv) = hit_uv {
            brush.cursor_uv = uv;
        }

        match input.edge {
            Some(ButtonEdge::Down) if self.state == StrokeState::Idle => {
                if input.alt {
                    debug!("Stroke: alt held, press reserved for navigation");
                } else {
                    self.transition(StrokeState::Pressed);
                    brush.last_paint_uv = None;
                    self.emit(StrokeEvent::StrokeBegun, &mut outcome);
                }
            }
            Some(ButtonEdge::Up) => {
                if self.state.is_pressed() {
                    self.transition(StrokeState::Idle);
                    brush.last_paint_uv = None;
                    self.emit(StrokeEvent::StrokeEnded, &mut outcome);
                }
                return outcome;
            }
            _ => {}
        }

        if !self.state.is_pressed() {
            return outcome;
        }

        let Some(uv) = hit_uv else {
            return outcome;
        };

        if spacing_allows(uv, brush.last_paint_uv, brush.spacing, largest_dimension) {
            brush.last_paint_uv = Some(uv);
            outcome.dab = Some(uv);
            if self.state == StrokeState::Pressed {
                self.transition(StrokeState::Painting);
            }
        }

        outcome
    }

    /// Drop the current stroke without waiting for a release
    ///
    /// Listeners still see `StrokeEnded` so begin/end stay paired. Returns
    /// false when no stroke was in progress.
    pub fn abort(&mut self, brush: &mut BrushState) -> bool {
        if !self.state.is_pressed() {
            return false;
        }
        self.transition(StrokeState::Idle);
        brush.last_paint_uv = None;
        for listener in &mut self.listeners {
            listener(StrokeEvent::StrokeEnded);
        }
        true
    }

    fn transition(&mut self, next: StrokeState) {
        debug!("Stroke: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn emit(&mut self, event: StrokeEvent, outcome: &mut TickOutcome) {
        for listener in &mut self.listeners {
            listener(event);
        }
        outcome.events.push(event);
    }
}

/// Whether a dab at `uv` is far enough from the last accepted one
///
/// Distances are compared in texels of the largest dimension. The first
/// dab of a stroke (no previous position) is always accepted.
pub fn spacing_allows(
    uv: Vec2,
    last_paint_uv: Option<Vec2>,
    spacing: u32,
    largest_dimension: u32,
) -> bool {
    let Some(last) = last_paint_uv else {
        return true;
    };
    let largest = largest_dimension as f32;
    (uv * largest).distance(last * largest) > spacing as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const LARGEST: u32 = 100;

    fn brush() -> BrushState {
        BrushState {
            spacing: 3,
            ..BrushState::default()
        }
    }

    #[test]
    fn test_press_release_one_tick() {
        let mut controller = StrokeController::new();
        let mut brush = brush();
        let uv = Some(Vec2::splat(0.5));

        let down = controller.tick(&PointerInput::down(Vec2::ZERO), uv, &mut brush, LARGEST);
        assert_eq!(down.events, vec![StrokeEvent::StrokeBegun]);
        assert_eq!(down.dab, uv);
        assert_eq!(controller.state(), StrokeState::Painting);

        let up = controller.tick(&PointerInput::up(Vec2::ZERO), uv, &mut brush, LARGEST);
        assert_eq!(up.events, vec![StrokeEvent::StrokeEnded]);
        assert_eq!(up.dab, None);
        assert_eq!(controller.state(), StrokeState::Idle);
        assert!(brush.last_paint_uv.is_none());
    }

    #[test]
    fn test_abort_returns_to_idle() {
        let mut controller = StrokeController::new();
        let mut brush = brush();
        let ended = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = ended.clone();
        controller.subscribe(move |event| {
            if event == StrokeEvent::StrokeEnded {
                counter.set(counter.get() + 1);
            }
        });

        assert!(!controller.abort(&mut brush));

        let uv = Some(Vec2::splat(0.5));
        controller.tick(&PointerInput::down(Vec2::ZERO), uv, &mut brush, LARGEST);
        assert_eq!(controller.state(), StrokeState::Painting);

        assert!(controller.abort(&mut brush));
        assert_eq!(controller.state(), StrokeState::Idle);
        assert!(brush.last_paint_uv.is_none());
        assert_eq!(ended.get(), 1);

        // A later release has nothing to end
        let up = controller.tick(&PointerInput::up(Vec2::ZERO), uv, &mut brush, LARGEST);
        assert!(up.events.is_empty());
        assert_eq!(ended.get(), 1);
    }

    #[test]
    fn test_spacing_gate() {
        let mut controller = StrokeController::new();
        let mut brush = brush();
        let start = Vec2::new(0.2, 0.2);

        controller.tick(&PointerInput::down(Vec2::ZERO), Some(start), &mut brush, LARGEST);

        // 2 texels < spacing 3: rejected
        let near = start + Vec2::new(0.02, 0.0);
        let outcome = controller.tick(&PointerInput::moved(Vec2::ZERO), Some(near), &mut brush, LARGEST);
        assert_eq!(outcome.dab, None);

        // 4 texels from the last accepted dab: accepted
        let far = start + Vec2::new(0.04, 0.0);
        let outcome = controller.tick(&PointerInput::moved(Vec2::ZERO), Some(far), &mut brush, LARGEST);
        assert_eq!(outcome.dab, Some(far));
        assert_eq!(brush.last_paint_uv, Some(far));
    }

    #[test]
    fn test_spacing_allows() {
        let last = Some(Vec2::ZERO);
        assert!(spacing_allows(Vec2::ZERO, None, 3, 100));
        assert!(!spacing_allows(Vec2::new(0.029, 0.0), last, 3, 100));
        assert!(spacing_allows(Vec2::new(0.031, 0.0), last, 3, 100));
        // Distance equal to spacing is rejected
        assert!(!spacing_allows(Vec2::new(0.0, 0.5), last, 32, 64));
    }

    #[test]
    fn test_pressed_until_first_hit() {
        let mut controller = StrokeController::new();
        let mut brush = brush();

        let outcome = controller.tick(&PointerInput::down(Vec2::ZERO), None, &mut brush, LARGEST);
        assert_eq!(outcome.events, vec![StrokeEvent::StrokeBegun]);
        assert_eq!(outcome.dab, None);
        assert_eq!(controller.state(), StrokeState::Pressed);

        let uv = Vec2::splat(0.4);
        let outcome = controller.tick(&PointerInput::moved(Vec2::ZERO), Some(uv), &mut brush, LARGEST);
        assert_eq!(outcome.dab, Some(uv));
        assert_eq!(controller.state(), StrokeState::Painting);
        assert_eq!(brush.cursor_uv, uv);
    }

    #[test]
    fn test_alt_press_never_leaves_idle() {
        let mut controller = StrokeController::new();
        let mut brush = brush();
        let uv = Some(Vec2::splat(0.5));

        let outcome = controller.tick(
            &PointerInput::down(Vec2::ZERO).with_alt(true),
            uv,
            &mut brush,
            LARGEST,
        );
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.dab, None);

        let outcome = controller.tick(&PointerInput::moved(Vec2::ZERO), uv, &mut brush, LARGEST);
        assert_eq!(outcome.dab, None);
        let outcome = controller.tick(&PointerInput::up(Vec2::ZERO), uv, &mut brush, LARGEST);
        assert!(outcome.events.is_empty());
        assert_eq!(controller.state(), StrokeState::Idle);
    }

    #[test]
    fn test_next_stroke_is_never_gated() {
        let mut controller = StrokeController::new();
        let mut brush = brush();
        let uv = Some(Vec2::splat(0.5));

        controller.tick(&PointerInput::down(Vec2::ZERO), uv, &mut brush, LARGEST);
        controller.tick(&PointerInput::up(Vec2::ZERO), uv, &mut brush, LARGEST);

        // Same position again: first dab of a new stroke
        let outcome = controller.tick(&PointerInput::down(Vec2::ZERO), uv, &mut brush, LARGEST);
        assert_eq!(outcome.dab, uv);
    }

    #[test]
    fn test_listeners_receive_events_in_order() {
        let mut controller = StrokeController::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        controller.subscribe(move |event| sink.borrow_mut().push(event));

        let mut brush = brush();
        controller.tick(&PointerInput::down(Vec2::ZERO), None, &mut brush, LARGEST);
        controller.tick(&PointerInput::moved(Vec2::ZERO), None, &mut brush, LARGEST);
        controller.tick(&PointerInput::up(Vec2::ZERO), None, &mut brush, LARGEST);

        assert_eq!(
            *seen.borrow(),
            vec![StrokeEvent::StrokeBegun, StrokeEvent::StrokeEnded]
        );
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut controller = StrokeController::new();
        let mut brush = brush();
        let outcome = controller.tick(&PointerInput::up(Vec2::ZERO), None, &mut brush, LARGEST);
        assert!(outcome.events.is_empty());
    }
}
