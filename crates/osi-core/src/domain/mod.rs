//! Pure domain logic: screen geometry and the interactive capture session.

pub mod capture;
pub mod geometry;
