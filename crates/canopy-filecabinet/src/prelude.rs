pub use canopy_core::prelude::*;

// vim: ts=4
