//! Paneldraft - widget layout model and bidirectional codec for
//! display configuration dialects.
//!
//! A layout is a set of pages holding typed widgets plus device
//! settings. The [`export`] module renders a layout into one of four
//! text dialects, embedding marker comments that make the output
//! re-importable without loss. The [`import`] module goes the other
//! way, recovering a layout from pasted config text, markerless
//! fragments included.

pub mod cli;
pub mod export;
pub mod import;
pub mod loader;
pub mod marker;
pub mod models;
pub mod plugins;
pub mod session;
