//! Non-destructive brush preview
//!
//! Each frame the host hands the renderer a sink for its camera view. The
//! renderer asks it to draw the target mesh once per material slot with a
//! preview kernel showing the brush footprint, plus the world-space cursor
//! circle. Nothing here touches the splat texture or the scratch buffer.

use tracing::trace;

use crate::brush::BrushState;
use crate::channel::Channel;
use crate::stroke::StrokeState;
use crate::types::CursorGizmo;

/// Parameters for the preview kernel
///
/// Laid out for direct upload as a uniform buffer.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct PreviewParams {
    /// Brush centre in UV space
    pub cursor_uv: [f32; 2],
    /// Brush radius in UV units of the largest dimension
    pub uv_radius: f32,
    /// Edge hardness 0.0-1.0
    pub hardness: f32,
    /// Tint: the active channel's weight vector
    pub weights: [f32; 4],
}

impl PreviewParams {
    pub fn new(brush: &BrushState, channel: Channel, largest_dimension: u32) -> Self {
        Self {
            cursor_uv: brush.cursor_uv.to_array(),
            uv_radius: brush.size as f32 / largest_dimension.max(1) as f32,
            hardness: brush.hardness,
            weights: channel.weights(),
        }
    }
}

/// Host drawing surface for the current camera view
pub trait PreviewSink {
    /// Draw the target mesh's submesh for `slot` with the preview kernel
    fn draw_mesh_slot(&mut self, slot: usize, params: &PreviewParams);

    /// Draw the cursor circle
    fn draw_cursor_gizmo(&mut self, gizmo: &CursorGizmo);
}

/// What was drawn during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewFrame {
    pub slots_drawn: usize,
    pub gizmo_drawn: bool,
}

/// Draws the brush footprint into the normal camera view
#[derive(Debug, Clone)]
pub struct BrushPreviewRenderer {
    /// Host toggle for the footprint preview
    pub visible: bool,
}

impl Default for BrushPreviewRenderer {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl BrushPreviewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame of feedback
    ///
    /// The footprint is skipped while the button is held; the cursor
    /// circle is drawn whenever the pointer is over the surface.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        sink: &mut dyn PreviewSink,
        brush: &BrushState,
        channel: Channel,
        stroke: StrokeState,
        material_slots: usize,
        largest_dimension: u32,
        gizmo: Option<CursorGizmo>,
    ) -> PreviewFrame {
        let mut frame = PreviewFrame::default();

        if let Some(gizmo) = gizmo {
            sink.draw_cursor_gizmo(&gizmo);
            frame.gizmo_drawn = true;
        }

        if !self.visible || stroke.is_pressed() {
            return frame;
        }

        let params = PreviewParams::new(brush, channel, largest_dimension);
        for slot in 0..material_slots {
            sink.draw_mesh_slot(slot, &params);
        }
        frame.slots_drawn = material_slots;
        trace!(
            "Preview: {} slot(s) at uv ({:.3}, {:.3})",
            material_slots, params.cursor_uv[0], params.cursor_uv[1]
        );
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[derive(Default)]
    struct RecordingSink {
        slots: Vec<(usize, PreviewParams)>,
        gizmos: usize,
    }

    impl PreviewSink for RecordingSink {
        fn draw_mesh_slot(&mut self, slot: usize, params: &PreviewParams) {
            self.slots.push((slot, *params));
        }

        fn draw_cursor_gizmo(&mut self, _gizmo: &CursorGizmo) {
            self.gizmos += 1;
        }
    }

    fn gizmo() -> CursorGizmo {
        CursorGizmo {
            center: Vec3::ZERO,
            normal: Vec3::Z,
            radius: 1.0,
        }
    }

    #[test]
    fn test_draws_every_slot_when_idle() {
        let renderer = BrushPreviewRenderer::new();
        let mut sink = RecordingSink::default();
        let brush = BrushState {
            cursor_uv: Vec2::new(0.25, 0.75),
            size: 8,
            hardness: 0.3,
            ..BrushState::default()
        };

        let frame = renderer.render(
            &mut sink,
            &brush,
            Channel::B,
            StrokeState::Idle,
            3,
            64,
            Some(gizmo()),
        );
        assert_eq!(frame.slots_drawn, 3);
        assert!(frame.gizmo_drawn);

        let slots: Vec<usize> = sink.slots.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
        let params = sink.slots[0].1;
        assert_eq!(params.cursor_uv, [0.25, 0.75]);
        assert_eq!(params.uv_radius, 8.0 / 64.0);
        assert_eq!(params.hardness, 0.3);
        assert_eq!(params.weights, [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_skipped_while_pressed() {
        let renderer = BrushPreviewRenderer::new();
        let mut sink = RecordingSink::default();
        let brush = BrushState::default();

        for state in [StrokeState::Pressed, StrokeState::Painting] {
            let frame = renderer.render(&mut sink, &brush, Channel::R, state, 2, 64, Some(gizmo()));
            assert_eq!(frame.slots_drawn, 0);
        }
        assert!(sink.slots.is_empty());
        assert_eq!(sink.gizmos, 2);
    }

    #[test]
    fn test_hidden_preview() {
        let renderer = BrushPreviewRenderer { visible: false };
        let mut sink = RecordingSink::default();
        let frame = renderer.render(
            &mut sink,
            &BrushState::default(),
            Channel::R,
            StrokeState::Idle,
            1,
            64,
            None,
        );
        assert_eq!(frame, PreviewFrame::default());
    }

    #[test]
    fn test_params_layout() {
        assert_eq!(std::mem::size_of::<PreviewParams>(), 32);
    }
}
