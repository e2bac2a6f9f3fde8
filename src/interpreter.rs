//! Interpreter that walks an expanded L-System string and extrudes a tube mesh.
//!
//! The entry point is [`MeshInterpreter`]. Configure it with a [`MeshConfig`]
//! and call [`MeshInterpreter::generate`] with an [`LSystem`], or
//! [`MeshInterpreter::build_mesh`] with an already expanded string.

use crate::error::GeneratorError;
use crate::lsystem::LSystem;
use crate::mesh::{MeshBuffer, MeshPostProcessor};
use crate::tube::{SquareTube, TubeBuilder};
use crate::turtle::{GenerationContext, TurtleOp};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

/// Upper bound on rewrite generations accepted by [`MeshConfig::validate`].
pub const MAX_ITERATIONS: u32 = 1000;

/// Configuration for tube generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Number of rewrite generations applied to the seed.
    pub iterations: u32,
    /// Length of one extrusion step.
    pub distance_per_step: f32,
    /// Rotation applied by each angle symbol, in degrees.
    pub angle_per_step: f32,
    /// Diagonal of the square cross-section along the tube.
    pub start_diameter: f32,
    /// Diagonal the cross-section tapers to at every cap.
    pub end_diameter: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            distance_per_step: 1.0,
            angle_per_step: 45.0,
            start_diameter: 1.0,
            end_diameter: 1.0,
        }
    }
}

impl MeshConfig {
    /// Checks every field, reporting the first invalid one.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        for (field, value) in [
            ("distance_per_step", self.distance_per_step),
            ("start_diameter", self.start_diameter),
            ("end_diameter", self.end_diameter),
        ] {
            if !value.is_finite() {
                return Err(GeneratorError::NonFinite { field });
            }
            if value <= 0.0 {
                return Err(GeneratorError::NonPositive { field, value });
            }
        }

        if !self.angle_per_step.is_finite() {
            return Err(GeneratorError::NonFinite {
                field: "angle_per_step",
            });
        }
        if self.angle_per_step.abs() >= 360.0 {
            return Err(GeneratorError::AngleOutOfRange {
                value: self.angle_per_step,
            });
        }
        if self.angle_per_step == 0.0 {
            return Err(GeneratorError::ZeroAngle);
        }

        if !(1..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(GeneratorError::IterationsOutOfRange {
                value: self.iterations,
                max: MAX_ITERATIONS,
            });
        }

        Ok(())
    }

    /// True for settings that commonly make generation slow or the result
    /// unwieldy. Advisory only; whether to ask for confirmation is up to
    /// the caller.
    pub fn is_expensive(&self) -> bool {
        self.iterations > 5
            || self.distance_per_step > 5.0
            || self.start_diameter > 4.0
            || self.end_diameter > 4.0
    }
}

/// Turns L-System output into a [`MeshBuffer`].
pub struct MeshInterpreter {
    config: MeshConfig,
}

impl MeshInterpreter {
    pub fn new(config: MeshConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Expands `lsystem` by the configured number of iterations and builds
    /// its mesh with a [`SquareTube`].
    ///
    /// The configuration is validated first; an invalid one fails before
    /// any rewriting happens.
    pub fn generate(&self, lsystem: &LSystem) -> Result<MeshBuffer, GeneratorError> {
        self.config.validate()?;
        if self.config.is_expensive() {
            warn!(
                "Generating with expensive settings ({} iterations); this may take a while",
                self.config.iterations
            );
        }

        let symbols = lsystem.expand(self.config.iterations);
        debug!(
            "Expanded {} symbols from seed {:?}",
            symbols.chars().count(),
            lsystem.seed()
        );
        self.build_mesh_with(&symbols, &SquareTube::from_config(&self.config))
    }

    /// Like [`generate`](Self::generate), then hands the buffer to `post`.
    pub fn generate_processed<P>(
        &self,
        lsystem: &LSystem,
        post: &mut P,
    ) -> Result<MeshBuffer, GeneratorError>
    where
        P: MeshPostProcessor + ?Sized,
    {
        let mut mesh = self.generate(lsystem)?;
        post.process(&mut mesh);
        Ok(mesh)
    }

    /// Builds the mesh for an already expanded symbol string.
    pub fn build_mesh(&self, symbols: &str) -> Result<MeshBuffer, GeneratorError> {
        self.config.validate()?;
        self.build_mesh_with(symbols, &SquareTube::from_config(&self.config))
    }

    /// Builds the mesh for `symbols` with a caller-supplied tube strategy.
    pub fn build_mesh_with<T>(&self, symbols: &str, tube: &T) -> Result<MeshBuffer, GeneratorError>
    where
        T: TubeBuilder + ?Sized,
    {
        let mesh = self.interpret(symbols, tube)?.into_mesh();
        info!(
            "Generated tube mesh: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Walks `symbols` left to right and returns the finished context.
    ///
    /// The turtle starts heading `+Y`. Geometry symbols are dispatched to
    /// `tube`; angle symbols rotate the heading by `angle_per_step`; any
    /// other symbol is a placeholder and ignored. After the last symbol the
    /// open tube end is capped, unless nothing was drawn at all. Branches
    /// still open at that point are discarded.
    ///
    /// Angle and configuration values are taken as-is; use
    /// [`build_mesh`](Self::build_mesh) for validated input.
    pub fn interpret<T>(&self, symbols: &str, tube: &T) -> Result<GenerationContext, GeneratorError>
    where
        T: TubeBuilder + ?Sized,
    {
        let mut ctx = GenerationContext::new();
        let angle = self.config.angle_per_step;

        for (position, symbol) in symbols.chars().enumerate() {
            ctx.set_position(position);
            match TurtleOp::from_symbol(symbol) {
                TurtleOp::Extrude => tube.extrude(&mut ctx)?,
                TurtleOp::OpenBranch => tube.open_branch(&mut ctx)?,
                TurtleOp::CloseBranch => tube.close_branch(&mut ctx)?,
                TurtleOp::Yaw(s) => ctx.turtle_mut().yaw(angle * s),
                TurtleOp::Pitch(s) => ctx.turtle_mut().pitch(angle * s),
                TurtleOp::Ignore => trace!("Ignoring placeholder symbol {symbol:?} at {position}"),
            }
        }

        if !ctx.mesh().is_empty() {
            tube.cap(&mut ctx)?;
        }

        let open = ctx.discard_open_branches();
        if open > 0 {
            debug!("Discarded {open} unclosed branch(es) at end of input");
        }

        Ok(ctx)
    }
}
