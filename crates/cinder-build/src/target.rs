//! Declarative build targets
//!
//! A [`Target`] names its dependencies, describes its inputs and outputs as
//! [`Source`] lists, and carries the asynchronous invocation step that does
//! the actual work. The skip decision and stamp bookkeeping live here; the
//! execution loop is in [`crate::build_system`].

use crate::environment::{BuildMode, Environment, TargetPlatform};
use crate::error::{BuildError, BuildResult};
use crate::source::{resolve_all, FileEntity, Source};
use crate::stamp::{mtime_millis, stamp_path, Stamp};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Boxed future returned by a target's invocation step
pub type InvocationFuture = BoxFuture<'static, BuildResult<()>>;

type InvocationFn = dyn Fn(Vec<FileEntity>, Environment) -> InvocationFuture + Send + Sync;

/// A declarative build rule: name, dependencies, input/output declarations,
/// and an invocation step.
///
/// The invocation receives the fully resolved input entities and the
/// environment, and is solely responsible for producing every declared
/// output. The orchestrator never inspects its internals.
#[derive(Clone)]
pub struct Target {
    name: String,
    dependencies: Vec<String>,
    inputs: Vec<Source>,
    outputs: Vec<Source>,
    invocation: Arc<InvocationFn>,
    phony: bool,
    platforms: Vec<TargetPlatform>,
    modes: Vec<BuildMode>,
}

impl Target {
    /// Create a target with no dependencies, no declared inputs/outputs,
    /// and a no-op invocation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            invocation: Arc::new(|_inputs, _env| -> InvocationFuture {
                Box::pin(async { Ok::<(), BuildError>(()) })
            }),
            phony: false,
            platforms: Vec::new(),
            modes: Vec::new(),
        }
    }

    /// Set the dependency target names, in order
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set the input declarations
    pub fn with_inputs(mut self, inputs: Vec<Source>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the output declarations
    pub fn with_outputs(mut self, outputs: Vec<Source>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Set the invocation step
    pub fn with_invocation<F, Fut>(mut self, invocation: F) -> Self
    where
        F: Fn(Vec<FileEntity>, Environment) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BuildResult<()>> + Send + 'static,
    {
        self.invocation = Arc::new(move |inputs, env| -> InvocationFuture {
            Box::pin(invocation(inputs, env))
        });
        self
    }

    /// Mark this target phony: it has no timestamp-trackable footprint and
    /// always runs
    pub fn with_phony(mut self, phony: bool) -> Self {
        self.phony = phony;
        self
    }

    /// Restrict this target to the given platforms (empty applies to all)
    pub fn with_platforms(mut self, platforms: Vec<TargetPlatform>) -> Self {
        self.platforms = platforms;
        self
    }

    /// Restrict this target to the given build modes (empty applies to all)
    pub fn with_modes(mut self, modes: Vec<BuildMode>) -> Self {
        self.modes = modes;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn is_phony(&self) -> bool {
        self.phony
    }

    /// Whether this target participates in a build against `env`.
    ///
    /// An unset environment selector matches any restriction.
    pub fn applies_to(&self, env: &Environment) -> bool {
        let platform_ok = self.platforms.is_empty()
            || env
                .target_platform()
                .map_or(true, |p| self.platforms.contains(&p));
        let mode_ok = self.modes.is_empty()
            || env.build_mode().map_or(true, |m| self.modes.contains(&m));
        platform_ok && mode_ok
    }

    /// Resolve the declared inputs into concrete filesystem entities
    pub fn resolve_inputs(&self, env: &Environment) -> Vec<FileEntity> {
        resolve_all(&self.inputs, env)
    }

    /// Resolve the declared outputs into concrete filesystem entities
    pub fn resolve_outputs(&self, env: &Environment) -> Vec<FileEntity> {
        resolve_all(&self.outputs, env)
    }

    /// Decide whether invocation can be skipped for this build.
    ///
    /// Evaluated in order, short-circuiting on the first condition that
    /// forces a run: phony; no stamp yet; input count changed; new or
    /// mtime-changed input; recorded output missing; recorded output
    /// modified after the stamp itself was written. Timestamp comparison
    /// only, no content hashing.
    pub fn can_skip_invocation(&self, resolved_inputs: &[FileEntity], env: &Environment) -> bool {
        if self.phony {
            return false;
        }

        let stamp_file = stamp_path(&self.name, env);
        let stamp = match Stamp::read(&stamp_file) {
            Some(stamp) => stamp,
            None => return false,
        };

        // A file was added or removed since the last build
        if stamp.inputs.len() != resolved_inputs.len() {
            return false;
        }

        let recorded: HashMap<&str, u64> = stamp
            .inputs
            .iter()
            .map(|(path, millis)| (path.as_str(), *millis))
            .collect();
        for input in resolved_inputs {
            let key = input.path.to_string_lossy();
            match recorded.get(key.as_ref()) {
                None => return false,
                Some(&recorded_millis) => match mtime_millis(&input.path) {
                    Ok(current_millis) if current_millis == recorded_millis => {}
                    _ => return false,
                },
            }
        }

        let stamp_millis = match mtime_millis(&stamp_file) {
            Ok(millis) => millis,
            Err(_) => return false,
        };
        for output in &stamp.outputs {
            let path = Path::new(output);
            if !path.exists() {
                return false;
            }
            match mtime_millis(path) {
                // Touched or regenerated outside this build system
                Ok(output_millis) if output_millis > stamp_millis => return false,
                Ok(_) => {}
                Err(_) => return false,
            }
        }

        true
    }

    /// Record the resolved inputs' timestamps and the resolved output paths
    /// for the next build's skip decision.
    ///
    /// A missing input or output here is a contract violation: the target's
    /// author mis-described the build rule, so the error is fatal and names
    /// both the target and the offending path. No-op for phony targets.
    pub fn write_stamp(
        &self,
        resolved_inputs: &[FileEntity],
        resolved_outputs: &[FileEntity],
        env: &Environment,
    ) -> BuildResult<()> {
        if self.phony {
            return Ok(());
        }

        let mut inputs = Vec::with_capacity(resolved_inputs.len());
        for input in resolved_inputs {
            if !input.exists() {
                return Err(BuildError::missing_input(&self.name, &input.path));
            }
            inputs.push((
                input.path.to_string_lossy().into_owned(),
                mtime_millis(&input.path)?,
            ));
        }

        let mut outputs = Vec::with_capacity(resolved_outputs.len());
        for output in resolved_outputs {
            if !output.exists() {
                return Err(BuildError::missing_output(&self.name, &output.path));
            }
            outputs.push(output.path.to_string_lossy().into_owned());
        }

        Stamp { inputs, outputs }.write(&stamp_path(&self.name, env))
    }

    /// Run the invocation step with the resolved inputs
    pub async fn invoke(
        &self,
        resolved_inputs: Vec<FileEntity>,
        env: &Environment,
    ) -> BuildResult<()> {
        (self.invocation)(resolved_inputs, env.clone()).await
    }

    /// Resolved view of this target for external introspection; performs
    /// the same resolution as build-time but never executes anything
    pub fn describe(&self, env: &Environment) -> TargetDescription {
        let to_paths = |entities: Vec<FileEntity>| {
            entities
                .into_iter()
                .map(|e| e.path.to_string_lossy().into_owned())
                .collect()
        };
        TargetDescription {
            name: self.name.clone(),
            phony: self.phony,
            dependencies: self.dependencies.clone(),
            inputs: to_paths(self.resolve_inputs(env)),
            outputs: to_paths(self.resolve_outputs(env)),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("phony", &self.phony)
            .field("platforms", &self.platforms)
            .field("modes", &self.modes)
            .finish_non_exhaustive()
    }
}

/// Resolved graph node emitted by describe, for editors and other external
/// build tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDescription {
    pub name: String,
    pub phony: bool,
    pub dependencies: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}
