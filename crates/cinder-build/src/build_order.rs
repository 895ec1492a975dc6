//! Execution order computation over the target registry
//!
//! Depth-first post-order traversal from the requested target: every
//! dependency is appended strictly before its dependents, and a node shared
//! by multiple branches (a diamond) is emitted exactly once. An explicit
//! in-progress marker turns a target that depends on itself, directly or
//! transitively, into a clear cyclic-dependency error instead of unbounded
//! recursion.

use crate::error::{BuildError, BuildResult};
use crate::target::Target;
use std::collections::{HashMap, HashSet};

/// Compute the dependency-ordered execution sequence for `name` and its
/// transitive closure
pub fn compute_target_order<'a>(
    targets: &'a HashMap<String, Target>,
    name: &str,
) -> BuildResult<Vec<&'a Target>> {
    let root = targets
        .get(name)
        .ok_or_else(|| BuildError::target_not_found(name))?;

    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();
    let mut path = Vec::new();
    let mut order = Vec::new();
    visit(targets, root, &mut visited, &mut in_progress, &mut path, &mut order)?;
    Ok(order)
}

fn visit<'a>(
    targets: &'a HashMap<String, Target>,
    target: &'a Target,
    visited: &mut HashSet<String>,
    in_progress: &mut HashSet<String>,
    path: &mut Vec<String>,
    order: &mut Vec<&'a Target>,
) -> BuildResult<()> {
    if in_progress.contains(target.name()) {
        // Render the cycle from its first occurrence on the current path
        path.push(target.name().to_string());
        let start = path.iter().position(|n| n == target.name()).unwrap_or(0);
        return Err(BuildError::CyclicDependency(path[start..].join(" -> ")));
    }
    if visited.contains(target.name()) {
        return Ok(());
    }

    visited.insert(target.name().to_string());
    in_progress.insert(target.name().to_string());
    path.push(target.name().to_string());

    for dep_name in target.dependencies() {
        let dep = targets.get(dep_name).ok_or_else(|| {
            BuildError::target_not_found(format!("{} (required by {})", dep_name, target.name()))
        })?;
        visit(targets, dep, visited, in_progress, path, order)?;
    }

    in_progress.remove(target.name());
    path.pop();
    order.push(target);
    Ok(())
}
