//! Build scheduling and the sequential execution loop
//!
//! [`BuildSystem`] holds the registered targets, computes a valid execution
//! order for a requested target, and drives skip/invoke/stamp semantics.
//! Execution is strictly sequential: each target's invocation is fully
//! awaited before the next one starts, which is also what makes the
//! check-then-create directory preparation sound.

use crate::build_order::compute_target_order;
use crate::environment::Environment;
use crate::error::{BuildError, BuildResult};
use crate::target::{Target, TargetDescription};
use std::collections::HashMap;
use std::fs;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Summary of a completed build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Targets whose invocation ran, in execution order
    pub invoked: Vec<String>,
    /// Targets passed over, in execution order: stamp still valid, or not
    /// applicable to the environment's platform/mode
    pub skipped: Vec<String>,
    /// Wall-clock duration of the whole build call
    pub elapsed: Duration,
}

/// Registry of build targets and the scheduler that executes them
#[derive(Debug, Default)]
pub struct BuildSystem {
    targets: HashMap<String, Target>,
}

impl BuildSystem {
    /// Create an empty build system
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
        }
    }

    /// Register a target, replacing any previous registration with the
    /// same name
    pub fn add_target(&mut self, target: Target) {
        self.targets.insert(target.name().to_string(), target);
    }

    /// Get a registered target by name
    pub fn get_target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Get registered target count
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if no targets are registered
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Build `name` and its transitive dependencies against `env`.
    ///
    /// Targets run one at a time in dependency order. A target whose stamp
    /// is still valid is skipped; otherwise its invocation is awaited, its
    /// outputs are verified, and a fresh stamp is written. The first error
    /// aborts the remainder of the order; stamps already written by earlier
    /// targets stay in place, so a retried build legitimately skips them.
    pub async fn build(&self, name: &str, env: &Environment) -> BuildResult<BuildReport> {
        let build_start = Instant::now();

        fs::create_dir_all(env.cache_dir()).map_err(|e| BuildError::io(env.cache_dir(), e))?;
        let copy_dir = env.copy_dir();
        fs::create_dir_all(&copy_dir).map_err(|e| BuildError::io(&copy_dir, e))?;

        let order = compute_target_order(&self.targets, name)?;

        let mut report = BuildReport::default();
        for target in order {
            if !target.applies_to(env) {
                debug!(
                    target = target.name(),
                    platform = env.platform_name(),
                    mode = env.mode_name(),
                    "target does not apply, passing over"
                );
                report.skipped.push(target.name().to_string());
                continue;
            }

            let inputs = target.resolve_inputs(env);
            if target.can_skip_invocation(&inputs, env) {
                debug!(target = target.name(), "inputs and outputs unchanged, skipping");
                report.skipped.push(target.name().to_string());
                continue;
            }

            info!(target = target.name(), "running target");
            target.invoke(inputs.clone(), env).await?;
            let outputs = target.resolve_outputs(env);
            target.write_stamp(&inputs, &outputs, env)?;
            report.invoked.push(target.name().to_string());
        }

        report.elapsed = build_start.elapsed();
        Ok(report)
    }

    /// Emit the resolved graph for `name` and its transitive dependencies,
    /// in execution order, without invoking anything
    pub fn describe(&self, name: &str, env: &Environment) -> BuildResult<Vec<TargetDescription>> {
        let order = compute_target_order(&self.targets, name)?;
        Ok(order.into_iter().map(|t| t.describe(env)).collect())
    }
}
