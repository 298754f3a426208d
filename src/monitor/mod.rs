//! The polling and reconciliation core.
//!
//! One [`integration::Integration`] per configured endpoint owns a shared
//! [`application::context::MonitorContext`] and one coordinator per selected
//! resource. Coordinators poll independently on a fixed interval and publish
//! typed records for presentation adapters to read.

pub mod application;
pub mod diagnostics;
pub mod integration;
