//! Turtle state, symbol decoding and the per-generation context.

use crate::error::GeneratorError;
use crate::mesh::MeshBuffer;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// The four vertices of one square cross-section of the tube.
pub type Ring = [Vec3; 4];

/// Heading of the tube-growing turtle.
///
/// Unlike a full turtle frame, only the forward direction is tracked: the
/// cross-section is always extruded axis-aligned from the previous ring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Current forward direction. Not necessarily unit length.
    pub heading: Vec3,
}

impl Default for TurtleState {
    fn default() -> Self {
        Self { heading: Vec3::Y }
    }
}

impl TurtleState {
    /// Normalized heading, or `None` when it is zero-length or non-finite.
    pub fn direction(&self) -> Option<Vec3> {
        self.heading.try_normalize()
    }

    /// Rotates the heading around the vertical axis by `degrees` (`<` / `>`).
    pub fn yaw(&mut self, degrees: f32) {
        self.rotate_about(Vec3::Y, degrees);
    }

    /// Rotates the heading around the lateral axis by `degrees` (`+` / `-`).
    pub fn pitch(&mut self, degrees: f32) {
        self.rotate_about(Vec3::Z, degrees);
    }

    fn rotate_about(&mut self, axis: Vec3, degrees: f32) {
        self.heading = Quat::from_axis_angle(axis, degrees.to_radians()) * self.heading;
    }
}

/// Operations encoded by the symbol grammar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurtleOp {
    /// Advance the tube one step (`F`).
    Extrude,
    /// Save heading and current ring (`[`).
    OpenBranch,
    /// Cap the open end and restore the saved state (`]`).
    CloseBranch,
    /// Rotate around the vertical axis by `sign * angle` (`<`/`>`).
    Yaw(f32),
    /// Rotate around the lateral axis by `sign * angle` (`+`/`-`).
    Pitch(f32),
    /// Placeholder symbol, no effect.
    Ignore,
}

impl TurtleOp {
    /// Decodes one grammar symbol. Letters are matched case-insensitively.
    pub fn from_symbol(symbol: char) -> Self {
        match symbol.to_ascii_uppercase() {
            'F' => Self::Extrude,
            '[' => Self::OpenBranch,
            ']' => Self::CloseBranch,
            '<' => Self::Yaw(1.0),
            '>' => Self::Yaw(-1.0),
            '+' => Self::Pitch(1.0),
            '-' => Self::Pitch(-1.0),
            _ => Self::Ignore,
        }
    }
}

/// Snapshot taken when a branch opens.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchFrame {
    /// Heading restored when the branch closes.
    pub heading: Vec3,
    /// Buffer length at the snapshot; the ring occupies the four indices
    /// just below it.
    pub vertex_count: usize,
    /// The ring the branch grows from.
    pub ring: Ring,
}

impl BranchFrame {
    /// Index of the first vertex of [`ring`](Self::ring) in the buffer.
    pub fn ring_base(&self) -> u32 {
        self.vertex_count.saturating_sub(4) as u32
    }
}

/// Everything one generation call mutates: turtle, branch stack and the
/// mesh in progress.
///
/// Created fresh per call and never shared, which makes concurrent
/// generations with different inputs safe.
#[derive(Debug, Default)]
pub struct GenerationContext {
    turtle: TurtleState,
    mesh: MeshBuffer,
    stack: Vec<BranchFrame>,
    /// Frame popped by the latest `]`, reused by the next extrusion.
    active: Option<BranchFrame>,
    position: usize,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turtle(&self) -> &TurtleState {
        &self.turtle
    }

    pub fn turtle_mut(&mut self) -> &mut TurtleState {
        &mut self.turtle
    }

    pub fn mesh(&self) -> &MeshBuffer {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut MeshBuffer {
        &mut self.mesh
    }

    /// Consumes the context, yielding the finished buffer.
    pub fn into_mesh(self) -> MeshBuffer {
        self.mesh
    }

    /// Number of branches currently open.
    pub fn branch_depth(&self) -> usize {
        self.stack.len()
    }

    /// Position of the symbol being interpreted.
    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Normalized heading, failing with [`GeneratorError::DegenerateHeading`].
    pub fn direction(&self) -> Result<Vec3, GeneratorError> {
        self.turtle
            .direction()
            .ok_or(GeneratorError::DegenerateHeading {
                position: self.position,
            })
    }

    /// The ring the next step grows from and the index of its first vertex.
    ///
    /// That is the active frame's ring right after a branch closed, the last
    /// four vertices of the buffer otherwise, and `None` while the buffer is
    /// still empty.
    pub fn current_ring(&self) -> Option<(Ring, u32)> {
        if let Some(frame) = &self.active {
            return Some((frame.ring, frame.ring_base()));
        }
        self.mesh.last_ring()
    }

    pub fn active_frame(&self) -> Option<&BranchFrame> {
        self.active.as_ref()
    }

    /// Drops the active frame; the buffer tail becomes the current ring.
    pub fn clear_active_frame(&mut self) {
        self.active = None;
    }

    pub fn push_branch(&mut self, frame: BranchFrame) {
        self.stack.push(frame);
    }

    /// Pops the innermost open branch.
    pub fn pop_branch(&mut self) -> Result<BranchFrame, GeneratorError> {
        self.stack.pop().ok_or(GeneratorError::UnbalancedBranch {
            position: self.position,
        })
    }

    /// Restores the frame's heading and makes its ring current.
    pub fn resume(&mut self, frame: BranchFrame) {
        self.turtle.heading = frame.heading;
        self.active = Some(frame);
    }

    /// Clears branches left open at end of input.
    pub(crate) fn discard_open_branches(&mut self) -> usize {
        let open = self.stack.len();
        self.stack.clear();
        open
    }
}
