//! Cinder incremental build orchestration
//!
//! A declarative, dependency-ordered graph of build targets, executed with
//! timestamp-based skip logic so unchanged work is never redone:
//! - Targets declare inputs/outputs as path patterns or discovery functions
//! - A depth-first post-order traversal yields the execution order, with
//!   explicit cyclic-dependency detection
//! - Per-target JSON stamp records decide skip vs. re-invocation
//! - Contract violations (missing declared input/output) fail the build
//!   naming the target and path
//! - A non-executing describe variant exports the resolved graph for
//!   external tooling
//!
//! Execution is strictly sequential by design; invocation steps are opaque
//! async functions owned by their targets (compilers, packagers, and other
//! external processes live behind them, not in this crate).

pub mod build_order;
pub mod build_system;
pub mod environment;
pub mod error;
pub mod source;
pub mod stamp;
pub mod target;

// Re-export main types
pub use build_order::compute_target_order;
pub use build_system::{BuildReport, BuildSystem};
pub use environment::{BuildMode, Environment, TargetPlatform};
pub use error::{BuildError, BuildResult};
pub use source::{EntityKind, FileEntity, Source};
pub use stamp::{stamp_path, Stamp};
pub use target::{InvocationFuture, Target, TargetDescription};
