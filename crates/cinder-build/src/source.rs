//! Input/output declarations and pattern resolution
//!
//! A target's inputs and outputs are lists of [`Source`] values: either a
//! path pattern carrying substitution tokens, or a function of the
//! [`Environment`] that produces concrete entities directly (the "discover
//! all matching files" case).

use crate::environment::Environment;
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use walkdir::WalkDir;

/// Kind of filesystem entity a resolved source refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    File,
    Directory,
}

/// A concrete filesystem entity produced by source resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntity {
    pub path: PathBuf,
    pub kind: EntityKind,
}

impl FileEntity {
    /// Create a file entity
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntityKind::File,
        }
    }

    /// Create a directory entity
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntityKind::Directory,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

type ResolverFn = dyn Fn(&Environment) -> Vec<FileEntity> + Send + Sync;

/// A declared input or output of a target
#[derive(Clone)]
pub enum Source {
    /// Path pattern string containing zero or more substitution tokens
    Pattern(String),
    /// Pure function of the environment producing concrete entities
    Function(Arc<ResolverFn>),
}

impl Source {
    /// Create a pattern source.
    ///
    /// Recognized tokens: `{PROJECT_DIR}`, `{BUILD_DIR}`, `{CACHE_DIR}`,
    /// `{COPY_DIR}`, `{platform}`, `{mode}`. A pattern ending in a path
    /// separator resolves to a directory entity.
    pub fn pattern(text: impl Into<String>) -> Self {
        Self::Pattern(text.into())
    }

    /// Create a function source
    pub fn function(f: impl Fn(&Environment) -> Vec<FileEntity> + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(f))
    }

    /// Create a source enumerating every file under the directory the
    /// pattern resolves to, sorted by path for determinism
    pub fn tree(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        Self::function(move |env| enumerate_tree(Path::new(&substitute(&pattern, env)), None))
    }

    /// Like [`Source::tree`], restricted to files with the given extension
    pub fn tree_with_extension(pattern: impl Into<String>, extension: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let extension = extension.into();
        Self::function(move |env| {
            enumerate_tree(Path::new(&substitute(&pattern, env)), Some(&extension))
        })
    }

    /// Resolve this source into concrete filesystem entities
    pub fn resolve(&self, env: &Environment) -> Vec<FileEntity> {
        match self {
            Self::Pattern(text) => vec![resolve_pattern(text, env)],
            Self::Function(f) => f(env),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(text) => f.debug_tuple("Pattern").field(text).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Resolve a list of sources, concatenating the results in order
pub(crate) fn resolve_all(sources: &[Source], env: &Environment) -> Vec<FileEntity> {
    sources.iter().flat_map(|s| s.resolve(env)).collect()
}

/// Substitute the recognized tokens in `pattern` against the environment.
///
/// Forward slashes are rewritten to the host separator on hosts where the
/// two differ.
pub(crate) fn substitute(pattern: &str, env: &Environment) -> String {
    let mut out = pattern
        .replace("{PROJECT_DIR}", &env.project_dir().to_string_lossy())
        .replace("{BUILD_DIR}", &env.build_dir().to_string_lossy())
        .replace("{CACHE_DIR}", &env.cache_dir().to_string_lossy())
        .replace("{COPY_DIR}", &env.copy_dir().to_string_lossy())
        .replace("{platform}", env.platform_name())
        .replace("{mode}", env.mode_name());
    if MAIN_SEPARATOR != '/' {
        out = out.replace('/', &MAIN_SEPARATOR.to_string());
    }
    out
}

fn resolve_pattern(text: &str, env: &Environment) -> FileEntity {
    let substituted = substitute(text, env);
    if substituted.ends_with(MAIN_SEPARATOR) {
        FileEntity::directory(substituted.trim_end_matches(MAIN_SEPARATOR))
    } else {
        FileEntity::file(substituted)
    }
}

fn enumerate_tree(root: &Path, extension: Option<&str>) -> Vec<FileEntity> {
    let mut files: Vec<FileEntity> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| match extension {
            Some(ext) => e.path().extension().and_then(|s| s.to_str()) == Some(ext),
            None => true,
        })
        .map(|e| FileEntity::file(e.path()))
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}
