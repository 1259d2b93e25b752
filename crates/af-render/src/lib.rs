//! Terminal output for clasSCII.
//!
//! Serializes ASCII grids into ANSI-256 escaped text.

pub mod compositor;
