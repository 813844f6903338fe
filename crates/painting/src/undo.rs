//! Stroke-granular undo
//!
//! One full-texture snapshot is pushed per stroke begin. Undo pops the
//! newest snapshot and copies it back over the live texture.

use tracing::{debug, info};

use crate::backend::CompositeBackend;
use crate::compositor::PaintCompositor;
use crate::error::PaintError;

/// Immutable copy of the splat texture taken when a stroke began
pub struct StrokeSnapshot<T> {
    /// Sequence number of the stroke this snapshot precedes
    pub stroke_id: u64,
    texture: T,
}

/// Stack of stroke snapshots
pub struct UndoManager<B: CompositeBackend> {
    stack: Vec<StrokeSnapshot<B::Texture>>,
    /// Oldest snapshots are dropped beyond this depth (None = unbounded)
    max_depth: Option<usize>,
    next_stroke_id: u64,
}

impl<B: CompositeBackend> UndoManager<B> {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
            next_stroke_id: 0,
        }
    }

    /// Deep-copy the live texture and push it
    pub fn snapshot(&mut self, compositor: &mut PaintCompositor<B>) -> Result<(), PaintError> {
        let texture = compositor.snapshot()?;
        let stroke_id = self.next_stroke_id;
        self.next_stroke_id += 1;
        self.stack.push(StrokeSnapshot { stroke_id, texture });

        if let Some(max_depth) = self.max_depth {
            if self.stack.len() > max_depth {
                let excess = self.stack.len() - max_depth;
                self.stack.drain(..excess);
                debug!("Undo: dropped {} oldest snapshot(s)", excess);
            }
        }

        debug!(
            "Undo: snapshot for stroke {} (depth {})",
            stroke_id,
            self.stack.len()
        );
        Ok(())
    }

    /// Restore the newest snapshot
    ///
    /// Returns true if an undo was performed, false if no undo available.
    pub fn undo(&mut self, compositor: &mut PaintCompositor<B>) -> bool {
        let Some(entry) = self.stack.pop() else {
            debug!("Undo: no entries available");
            return false;
        };

        compositor.restore(&entry.texture);
        info!(
            "Undid stroke {} ({} remaining)",
            entry.stroke_id,
            self.stack.len()
        );
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_count(&self) -> usize {
        self.stack.len()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Release every snapshot
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
