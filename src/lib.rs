#![allow(clippy::module_name_repetitions)]
//! This is the documentation for the **optrace** package, a kernel for propagating bundles of rays through an
//! optical bench.
//!
//! A bench consists of a hierarchy of reference frames ([`frame::FrameTree`]) with medium boundaries
//! ([`boundary::MediumBoundary`]) attached to them. A boundary combines a surface shape
//! ([`surface::SurfaceShape`]) with an electromagnetic behaviour ([`em_interface::EmInterface`]). A
//! [`ray_beam::RayBeam`], typically generated by a [`sampler::Sampler`], is processed by each boundary in turn:
//! rays are intercepted, redirected or pruned.
//!
//! The [`tracer::Tracer`] drives this process for a bench described by a [`scenario::Scenario`] whose boundaries
//! are created by name through a [`registry::Registry`].
pub mod boundary;
pub mod console;
pub mod em_interface;
pub mod error;
pub mod frame;
pub mod heuristic;
pub mod properties;
pub mod random;
pub mod ray_beam;
pub mod registry;
pub mod sampler;
pub mod scenario;
pub mod surface;
pub mod tracer;
pub mod utils;
