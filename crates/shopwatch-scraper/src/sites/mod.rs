//! Site-specific extractors.

pub mod bstn;
pub mod footdistrict;
pub mod sneak_avenue;
pub mod solebox;
