//! Build environment: resolved filesystem roots and platform/mode selectors
//!
//! An [`Environment`] is constructed once per build invocation and shared
//! read-only across every target. Construction is a pure factory: defaults
//! are computed from `project_dir`, nothing touches the filesystem.

use std::path::{Path, PathBuf};

/// Platform a build produces artifacts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPlatform {
    AndroidArm,
    AndroidArm64,
    AndroidX64,
    Ios,
    LinuxX64,
    LinuxArm64,
    MacosX64,
    MacosArm64,
    WindowsX64,
    Web,
}

impl TargetPlatform {
    /// Canonical lowercase name, used in stamp filenames and `{platform}`
    /// token substitution
    pub fn name(&self) -> &'static str {
        match self {
            Self::AndroidArm => "android_arm",
            Self::AndroidArm64 => "android_arm64",
            Self::AndroidX64 => "android_x64",
            Self::Ios => "ios",
            Self::LinuxX64 => "linux_x64",
            Self::LinuxArm64 => "linux_arm64",
            Self::MacosX64 => "macos_x64",
            Self::MacosArm64 => "macos_arm64",
            Self::WindowsX64 => "windows_x64",
            Self::Web => "web",
        }
    }
}

impl std::fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Mode a build is produced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    Debug,
    Profile,
    Release,
}

impl BuildMode {
    /// Canonical lowercase name, used in stamp filenames and `{mode}`
    /// token substitution
    pub fn name(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Profile => "profile",
            Self::Release => "release",
        }
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable value object holding the resolved filesystem roots and
/// platform/mode selectors for one build invocation.
///
/// Defaults:
/// - `build_dir` and `stamp_dir` are `<project_dir>/build`
/// - `cache_dir` is the shared artifact cache under the user cache
///   directory (`<project_dir>/build/cache` when the platform reports none)
/// - `copy_dir` is derived from the selected platform,
///   `<build_dir>/artifacts/<platform>`, falling back to `any`
#[derive(Debug, Clone)]
pub struct Environment {
    project_dir: PathBuf,
    build_dir: PathBuf,
    stamp_dir: PathBuf,
    cache_dir: PathBuf,
    /// Explicit override; the platform-derived default is computed lazily so
    /// it tracks the final platform selection regardless of setter order.
    copy_dir: Option<PathBuf>,
    target_platform: Option<TargetPlatform>,
    build_mode: Option<BuildMode>,
}

impl Environment {
    /// Create an environment rooted at `project_dir` with default roots and
    /// no platform/mode selection
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let build_dir = project_dir.join("build");
        Self {
            stamp_dir: build_dir.clone(),
            cache_dir: default_cache_dir(&project_dir),
            copy_dir: None,
            build_dir,
            project_dir,
            target_platform: None,
            build_mode: None,
        }
    }

    /// Override the build output root
    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.build_dir = build_dir.into();
        self
    }

    /// Override the stamp file root
    pub fn with_stamp_dir(mut self, stamp_dir: impl Into<PathBuf>) -> Self {
        self.stamp_dir = stamp_dir.into();
        self
    }

    /// Override the shared artifact cache root
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Override the platform-specific copy root
    pub fn with_copy_dir(mut self, copy_dir: impl Into<PathBuf>) -> Self {
        self.copy_dir = Some(copy_dir.into());
        self
    }

    /// Select the target platform
    pub fn with_target_platform(mut self, platform: TargetPlatform) -> Self {
        self.target_platform = Some(platform);
        self
    }

    /// Select the build mode
    pub fn with_build_mode(mut self, mode: BuildMode) -> Self {
        self.build_mode = Some(mode);
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn stamp_dir(&self) -> &Path {
        &self.stamp_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Platform-specific copy root: the explicit override when one was
    /// given, otherwise `<build_dir>/artifacts/<platform>`
    pub fn copy_dir(&self) -> PathBuf {
        match &self.copy_dir {
            Some(dir) => dir.clone(),
            None => self.build_dir.join("artifacts").join(self.platform_name()),
        }
    }

    pub fn target_platform(&self) -> Option<TargetPlatform> {
        self.target_platform
    }

    pub fn build_mode(&self) -> Option<BuildMode> {
        self.build_mode
    }

    /// Canonical platform name, or `any` when no platform is selected
    pub fn platform_name(&self) -> &'static str {
        self.target_platform.map_or("any", |p| p.name())
    }

    /// Canonical mode name, or `any` when no mode is selected
    pub fn mode_name(&self) -> &'static str {
        self.build_mode.map_or("any", |m| m.name())
    }
}

/// Shared, externally-managed artifact cache location
fn default_cache_dir(project_dir: &Path) -> PathBuf {
    match dirs::cache_dir() {
        Some(cache) => cache.join("cinder").join("artifacts"),
        None => project_dir.join("build").join("cache"),
    }
}
