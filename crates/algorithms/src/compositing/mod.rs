//! Temporal-axis reductions
//!
//! Fixed-window compositing over an image sequence, with a per-pixel median
//! reducer and a medoid selector that picks one complete source observation
//! per pixel. Reductions are a barrier: every image contributing to a window
//! must be resolved before that window's composite can be computed.

mod medoid;
mod temporal;

pub use medoid::{create_medoid_composite, create_medoid_reducer};
pub use temporal::{
    create_temporal_composites, CompositeConfig, IntervalUnit, Reducer,
};
