//! Map document modules.
//!
//! Rendering the self-contained interactive map and post-processing it
//! with the client-side access gate.

pub mod gate;
pub mod renderer;

pub use gate::inject_gate;
pub use renderer::render_map;
