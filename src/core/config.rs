//! The build configuration tree.
//!
//! A `BuildConfiguration` describes one compilation unit: which compiler
//! version to use, which backend to target, and option groups for every
//! backend plus dependency and bookkeeping options. It is loaded from
//! `crossbuild.toml` and is treated as an immutable value: cross expansion
//! and normalization always produce new configurations.
//!
//! ```toml
//! platform = "js"
//! extra-platforms = ["native"]
//!
//! [compiler]
//! version = "3.nightly"
//! extra-versions = ["2.13.16"]
//! options = ["-deprecation"]
//!
//! [js]
//! version = "1.19.0"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::backend::Backend;
use super::version::parse_version_lenient;

/// Manifest file name for a build configuration.
pub const CONFIG_FILE_NAME: &str = "crossbuild.toml";

/// JS backend version assumed when none is configured.
pub const DEFAULT_JS_VERSION: &str = "1.19.0";

/// Native backend version assumed when none is configured.
pub const DEFAULT_NATIVE_VERSION: &str = "0.5.7";

/// Root build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfiguration {
    /// Compiler selection and flags
    pub compiler: CompilerOptions,

    /// Selected compilation backend; see [`BuildConfiguration::platform`]
    pub platform: Option<Backend>,

    /// Additional backends to cross-build for
    pub extra_platforms: Vec<Backend>,

    /// Managed-runtime backend options
    pub jvm: JvmOptions,

    /// JavaScript backend options
    pub js: JsOptions,

    /// Native backend options
    pub native: NativeOptions,

    /// Dependency and classpath options
    pub classpath: ClasspathOptions,

    /// Bookkeeping options that never affect build outputs
    pub internal: InternalOptions,
}

/// Compiler selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompilerOptions {
    /// Requested compiler version (stable, RC, nightly alias, ...)
    pub version: Option<String>,

    /// Override for the binary compatibility version
    pub binary_version: Option<String>,

    /// Additional compiler versions to cross-build for
    pub extra_versions: BTreeSet<String>,

    /// The unit has no sources for the compiler (host language only)
    pub host_only: Option<bool>,

    /// Extra compiler flags, in order
    pub options: Vec<String>,

    /// Compiler plugin coordinates
    pub plugins: Vec<String>,
}

/// Managed-runtime backend options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JvmOptions {
    /// Runtime identifier (e.g. "temurin:21")
    pub jvm_id: Option<String>,

    /// Target bytecode release
    pub release: Option<String>,

    /// Options passed to the runtime
    pub java_options: Vec<String>,

    /// System properties
    pub properties: BTreeMap<String, String>,
}

/// JavaScript backend options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JsOptions {
    /// JS backend version
    pub version: Option<String>,

    /// Linker mode (fast, full)
    pub mode: Option<String>,

    /// Module kind (commonjs, esmodule, nomodule)
    pub module_kind: Option<String>,

    /// Emit source maps
    pub source_maps: Option<bool>,
}

/// Native backend options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NativeOptions {
    /// Native backend version
    pub version: Option<String>,

    /// Garbage collector (immix, commix, boehm, none)
    pub gc: Option<String>,

    /// Build mode (debug, release-fast, release-full)
    pub mode: Option<String>,

    /// Extra linker flags, in order
    pub link_flags: Vec<String>,
}

/// Dependency and classpath options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClasspathOptions {
    /// Dependency coordinates
    pub dependencies: Vec<String>,

    /// Extra repositories
    pub repositories: Vec<String>,

    /// Extra jars/directories on the classpath
    pub extra_jars: Vec<PathBuf>,
}

/// Bookkeeping options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InternalOptions {
    /// Log verbosity
    pub verbosity: Option<u8>,

    /// Trust window override for cached indices, in seconds
    pub cache_ttl_secs: Option<u64>,

    /// Never touch the network
    pub offline: Option<bool>,
}

impl BuildConfiguration {
    /// Load a build configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read build configuration: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse build configuration: {}", path.display()))
    }

    /// Load a build configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to load build configuration from {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Combine with a fallback configuration; values set here win.
    pub fn or_else(self, fallback: BuildConfiguration) -> Self {
        BuildConfiguration {
            compiler: self.compiler.or_else(fallback.compiler),
            platform: self.platform.or(fallback.platform),
            extra_platforms: or_vec(self.extra_platforms, fallback.extra_platforms),
            jvm: self.jvm.or_else(fallback.jvm),
            js: self.js.or_else(fallback.js),
            native: self.native.or_else(fallback.native),
            classpath: self.classpath.or_else(fallback.classpath),
            internal: self.internal.or_else(fallback.internal),
        }
    }

    /// The selected backend, or the default one when none is set.
    pub fn platform(&self) -> Backend {
        self.platform.unwrap_or_default()
    }

    /// Platform suffix of artifacts built for the selected backend.
    ///
    /// `None` for the managed runtime, `sjs<major>` for JS and
    /// `native<major>.<minor>` for native.
    pub fn platform_suffix(&self) -> Option<String> {
        match self.platform() {
            Backend::Jvm => None,
            Backend::Js => {
                let version = self.js.version.as_deref().unwrap_or(DEFAULT_JS_VERSION);
                let major = parse_version_lenient(version).map_or(1, |v| v.major);
                Some(format!("sjs{}", major))
            }
            Backend::Native => {
                let version = self
                    .native
                    .version
                    .as_deref()
                    .unwrap_or(DEFAULT_NATIVE_VERSION);
                match parse_version_lenient(version) {
                    Some(v) => Some(format!("native{}.{}", v.major, v.minor)),
                    None => Some(format!("native{}", version)),
                }
            }
        }
    }
}

impl CompilerOptions {
    pub fn is_host_only(&self) -> bool {
        self.host_only.unwrap_or(false)
    }

    fn or_else(self, fallback: CompilerOptions) -> Self {
        CompilerOptions {
            version: self.version.or(fallback.version),
            binary_version: self.binary_version.or(fallback.binary_version),
            extra_versions: if self.extra_versions.is_empty() {
                fallback.extra_versions
            } else {
                self.extra_versions
            },
            host_only: self.host_only.or(fallback.host_only),
            options: or_vec(self.options, fallback.options),
            plugins: or_vec(self.plugins, fallback.plugins),
        }
    }
}

impl JvmOptions {
    fn or_else(self, fallback: JvmOptions) -> Self {
        JvmOptions {
            jvm_id: self.jvm_id.or(fallback.jvm_id),
            release: self.release.or(fallback.release),
            java_options: or_vec(self.java_options, fallback.java_options),
            properties: if self.properties.is_empty() {
                fallback.properties
            } else {
                self.properties
            },
        }
    }
}

impl JsOptions {
    pub fn emits_source_maps(&self) -> bool {
        self.source_maps.unwrap_or(false)
    }

    fn or_else(self, fallback: JsOptions) -> Self {
        JsOptions {
            version: self.version.or(fallback.version),
            mode: self.mode.or(fallback.mode),
            module_kind: self.module_kind.or(fallback.module_kind),
            source_maps: self.source_maps.or(fallback.source_maps),
        }
    }
}

impl NativeOptions {
    fn or_else(self, fallback: NativeOptions) -> Self {
        NativeOptions {
            version: self.version.or(fallback.version),
            gc: self.gc.or(fallback.gc),
            mode: self.mode.or(fallback.mode),
            link_flags: or_vec(self.link_flags, fallback.link_flags),
        }
    }
}

impl ClasspathOptions {
    fn or_else(self, fallback: ClasspathOptions) -> Self {
        ClasspathOptions {
            dependencies: or_vec(self.dependencies, fallback.dependencies),
            repositories: or_vec(self.repositories, fallback.repositories),
            extra_jars: or_vec(self.extra_jars, fallback.extra_jars),
        }
    }
}

impl InternalOptions {
    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    fn or_else(self, fallback: InternalOptions) -> Self {
        InternalOptions {
            verbosity: self.verbosity.or(fallback.verbosity),
            cache_ttl_secs: self.cache_ttl_secs.or(fallback.cache_ttl_secs),
            offline: self.offline.or(fallback.offline),
        }
    }
}

fn or_vec<T>(primary: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

/// Load a build configuration merged over a global defaults file.
///
/// Order of precedence (highest to lowest):
/// 1. Project configuration (`crossbuild.toml`)
/// 2. Global defaults (`~/.crossbuild/defaults.toml`)
/// 3. Defaults
pub fn load_build_configuration(
    project_path: &Path,
    global_path: Option<&Path>,
) -> Result<BuildConfiguration> {
    let project = if project_path.exists() {
        BuildConfiguration::load(project_path)?
    } else {
        BuildConfiguration::default()
    };

    let global = global_path
        .map(BuildConfiguration::load_or_default)
        .unwrap_or_default();

    Ok(project.or_else(global))
}
