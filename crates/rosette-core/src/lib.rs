//! Core motion control for the Rosette polar printer.
//!
//! Converts declarative polar-curve descriptors into synchronized pulse
//! trains for the radius, angle, vertical, and extrusion axes. This crate
//! intentionally avoids any host- or pin-level dependencies; hardware is
//! reached only through the traits in [`axis`] and [`clock`].

pub mod axis;
pub mod calibrate;
pub mod clock;
pub mod config;
pub mod curve;
pub mod executor;
pub mod plan;
pub mod schedule;
