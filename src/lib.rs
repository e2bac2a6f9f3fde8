//! # lsystem-tube
//!
//! Procedural branching tube meshes from L-System grammars.
//!
//! A seed string is rewritten through character rules ([`LSystem`]), and the
//! expanded string is walked by a turtle ([`MeshInterpreter`]) that extrudes
//! a square tube, branches on `[`/`]` and caps every open end. The result is
//! a plain [`MeshBuffer`] of vertices and triangle indices that a renderer or
//! exporter can ingest without depending on any particular engine.
//!
//! | Symbol | Action |
//! |---|---|
//! | `F` | Extrude one step along the heading |
//! | `[` / `]` | Open / close a branch |
//! | `<` / `>` | Turn left / right around the vertical axis |
//! | `+` / `-` | Pitch forward / backward around the lateral axis |
//!
//! Letters are case-insensitive; every other character is a placeholder.

pub mod error;
pub mod interpreter;
pub mod lsystem;
pub mod mesh;
pub mod tube;
pub mod turtle;

pub use error::*;
pub use interpreter::*;
pub use lsystem::*;
pub use mesh::*;
pub use tube::*;
pub use turtle::*;
