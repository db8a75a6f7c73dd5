//! The TR-181 `Device.` data-model mirror.
//!
//! A strongly shaped in-memory mirror of the device tree, an indexer that
//! flattens it into dotted parameter paths with sparse 1-based indices, a
//! differ that compares a remote snapshot against the mirror, and the
//! writable-path classifier the SetParameterValues handler enforces.

pub mod device;
pub mod diff;
pub mod mirror;
pub mod node;
pub mod typing;
pub mod writable;

pub use device::{Device, InternetGatewayDevice};
pub use diff::{DiffOutcome, values_equal};
pub use mirror::ApplyOutcome;
pub use node::{IndexOptions, Parameter, PathError};
pub use typing::xsd_type_for;
pub use writable::is_writable;
