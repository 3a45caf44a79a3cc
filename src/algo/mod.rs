//! Mesh deformation algorithms.
//!
//! - **Subdivision**: centroid subdivision with normal displacement
//!   ([`subdivide`])
//! - **Ripple**: attractor-driven damped sine displacement ([`ripple`])
//!
//! Both engines take the input mesh by reference and return a new mesh; they
//! keep no state between calls.

pub mod progress;
pub mod ripple;
pub mod subdivide;

pub use progress::Progress;
