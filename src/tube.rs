//! Tube extrusion strategies.
//!
//! The interpreter walk loop only decodes symbols and rotates the turtle;
//! every piece of geometry goes through a [`TubeBuilder`]. [`SquareTube`]
//! is the default square cross-section with a tapered end cap.
//!
//! # Ring layout
//!
//! A ring is stored in the order `0: (0, 0, 0)`, `1: (s, 0, 0)`,
//! `2: (s, 0, s)`, `3: (0, 0, s)` relative to the tube origin, where `s` is
//! the side length. Each extrusion translates the whole ring along the
//! heading, so this layout is preserved from ring to ring.

use crate::error::GeneratorError;
use crate::interpreter::MeshConfig;
use crate::mesh::MeshBuffer;
use crate::turtle::{BranchFrame, GenerationContext, Ring};
use glam::Vec3;

/// Geometry policy driven by the interpreter.
pub trait TubeBuilder {
    /// Grows the tube one step along the current heading (`F`).
    fn extrude(&self, ctx: &mut GenerationContext) -> Result<(), GeneratorError>;

    /// Snapshots the current heading and ring onto the branch stack (`[`).
    fn open_branch(&self, ctx: &mut GenerationContext) -> Result<(), GeneratorError>;

    /// Closes the open tube end (at end of input and on every `]`).
    fn cap(&self, ctx: &mut GenerationContext) -> Result<(), GeneratorError>;

    /// Caps the branch and resumes its parent (`]`).
    ///
    /// The stack is checked before any geometry is emitted, so an
    /// unbalanced `]` fails without touching the buffer.
    fn close_branch(&self, ctx: &mut GenerationContext) -> Result<(), GeneratorError> {
        let frame = ctx.pop_branch()?;
        self.cap(ctx)?;
        ctx.resume(frame);
        Ok(())
    }
}

/// Face orientation for one step, chosen from the heading's vertical sign
/// so back-face culling never hides downward growth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    /// `heading.y > 0`.
    Ascending,
    /// `heading.y <= 0`; every face is emitted in reverse order.
    Descending,
}

impl Winding {
    pub fn from_heading(heading: Vec3) -> Self {
        if heading.y > 0.0 {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    fn emit(self, mesh: &mut MeshBuffer, a: u32, b: u32, c: u32) {
        match self {
            Self::Ascending => mesh.push_triangle(a, b, c),
            Self::Descending => mesh.push_triangle(a, c, b),
        }
    }
}

/// Side length of the square whose diagonal equals `diameter`.
pub fn side_length(diameter: f32) -> f32 {
    (diameter * diameter / 2.0).sqrt()
}

/// Compensates vertical drift between ring vertices that should stay level.
///
/// Pairs `0 -> 3` and `1 -> 2` are expected to share their `y` coordinate.
/// When an oblique heading leaves the trailing vertex off level by `d`, it
/// is moved back toward the leading one by `d * clamp(1 - |d|, 0, 1)`; the
/// direction of the nudge flips while the heading points toward negative
/// `x`. A purely vertical heading cannot introduce drift and is left alone.
pub fn correct_drift(ring: &mut Ring, direction: Vec3) {
    if direction.y.abs() == 1.0 {
        return;
    }

    for (lead, trail) in [(0, 3), (1, 2)] {
        let drift = ring[trail].y - ring[lead].y;
        if drift.abs() <= f32::EPSILON {
            continue;
        }
        let mut nudge = drift * (1.0 - drift.abs()).clamp(0.0, 1.0);
        if direction.x < 0.0 {
            nudge = -nudge;
        }
        ring[trail].y -= nudge;
    }
}

/// Square cross-section tube tapering from `start_diameter` to
/// `end_diameter` at every cap.
#[derive(Clone, Debug, PartialEq)]
pub struct SquareTube {
    pub distance_per_step: f32,
    pub start_diameter: f32,
    pub end_diameter: f32,
}

impl SquareTube {
    pub fn new(distance_per_step: f32, start_diameter: f32, end_diameter: f32) -> Self {
        Self {
            distance_per_step,
            start_diameter,
            end_diameter,
        }
    }

    pub fn from_config(config: &MeshConfig) -> Self {
        Self::new(
            config.distance_per_step,
            config.start_diameter,
            config.end_diameter,
        )
    }

    /// The ring the first extrusion grows from, lying in the `y = 0` plane.
    pub fn start_ring(&self) -> Ring {
        let s = side_length(self.start_diameter);
        [
            Vec3::ZERO,
            Vec3::new(s, 0.0, 0.0),
            Vec3::new(s, 0.0, s),
            Vec3::new(0.0, 0.0, s),
        ]
    }

    /// The current ring, materializing the start ring and its cap on first use.
    fn source_ring(&self, ctx: &mut GenerationContext) -> (Ring, u32) {
        if let Some(current) = ctx.current_ring() {
            return current;
        }

        let winding = Winding::from_heading(ctx.turtle().heading);
        let ring = self.start_ring();
        let mesh = ctx.mesh_mut();
        let base = mesh.push_ring(ring);
        winding.emit(mesh, base, base + 1, base + 2);
        winding.emit(mesh, base, base + 2, base + 3);
        (ring, base)
    }

    /// Translates `ring` one full step along `direction`, then corrects drift.
    fn advance(&self, ring: Ring, direction: Vec3) -> Ring {
        let offset = direction * self.distance_per_step;
        let mut next = ring.map(|v| v + offset);
        correct_drift(&mut next, direction);
        next
    }

    /// Connects ring `from` to ring `to` with four quads (front, left, back,
    /// right), two triangles each.
    fn push_walls(mesh: &mut MeshBuffer, from: u32, to: u32, winding: Winding) {
        let r = [from, from + 1, from + 2, from + 3];
        let n = [to, to + 1, to + 2, to + 3];

        // Front.
        winding.emit(mesh, r[1], n[2], r[2]);
        winding.emit(mesh, r[1], n[1], n[2]);
        // Left.
        winding.emit(mesh, r[1], r[0], n[0]);
        winding.emit(mesh, r[1], n[0], n[1]);
        // Back.
        winding.emit(mesh, r[0], r[3], n[3]);
        winding.emit(mesh, r[0], n[3], n[0]);
        // Right.
        winding.emit(mesh, r[2], n[2], n[3]);
        winding.emit(mesh, r[2], n[3], r[3]);
    }

    /// Both windings of the end face, so it renders from either side.
    fn push_double_sided_face(mesh: &mut MeshBuffer, base: u32) {
        let [a, b, c, d] = [base, base + 1, base + 2, base + 3];
        mesh.push_triangle(a, d, c);
        mesh.push_triangle(a, c, b);
        mesh.push_triangle(a, c, d);
        mesh.push_triangle(a, b, c);
    }
}

impl TubeBuilder for SquareTube {
    fn extrude(&self, ctx: &mut GenerationContext) -> Result<(), GeneratorError> {
        let (ring, from) = self.source_ring(ctx);
        let direction = ctx.direction()?;
        let winding = Winding::from_heading(ctx.turtle().heading);

        let next = self.advance(ring, direction);
        let mesh = ctx.mesh_mut();
        let to = mesh.push_ring(next);
        Self::push_walls(mesh, from, to, winding);

        ctx.clear_active_frame();
        Ok(())
    }

    fn open_branch(&self, ctx: &mut GenerationContext) -> Result<(), GeneratorError> {
        let (ring, base) = self.source_ring(ctx);
        let frame = BranchFrame {
            heading: ctx.turtle().heading,
            vertex_count: base as usize + 4,
            ring,
        };
        ctx.push_branch(frame);
        Ok(())
    }

    fn cap(&self, ctx: &mut GenerationContext) -> Result<(), GeneratorError> {
        let (ring, from) = self.source_ring(ctx);
        let direction = ctx.direction()?;
        let winding = Winding::from_heading(ctx.turtle().heading);

        let back = direction * (self.distance_per_step / 2.0);
        let taper = side_length(self.start_diameter) - side_length(self.end_diameter);
        let mut end = self.advance(ring, direction).map(|v| v - back);
        end[1].x -= taper;
        end[2].x -= taper;
        end[2].z -= taper;
        end[3].z -= taper;

        let mesh = ctx.mesh_mut();
        let to = mesh.push_ring(end);
        Self::push_walls(mesh, from, to, winding);
        Self::push_double_sided_face(mesh, to);
        Ok(())
    }
}
