//! Beat tracking modules
//!
//! Generate the beat sequence from the onset envelope and tempo estimate:
//! - Dynamic-programming tracker (Ellis 2007)

pub mod tracker;

pub use tracker::{track_beats, TIGHTNESS};
