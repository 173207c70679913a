//! Configuration normalization.
//!
//! Options of backends that are not selected cannot influence the build, so
//! they are reset to their defaults. A blank compiler version requests the
//! default just like a missing one, so it becomes `None`. Two configurations
//! that differ only in such ways normalize to the same value. Fields set
//! explicitly to their default value are treated as unset.

use crate::core::backend::Backend;
use crate::core::config::{BuildConfiguration, JsOptions, JvmOptions, NativeOptions};

/// Reset the option groups of every non-selected backend.
///
/// Idempotent and deterministic.
pub fn normalize(config: &BuildConfiguration) -> BuildConfiguration {
    let mut normalized = config.clone();

    normalized.compiler.version = config
        .compiler
        .version
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    normalized.platform = Some(config.platform()).filter(|p| *p != Backend::default());
    normalized.compiler.host_only = config.compiler.host_only.filter(|h| *h);
    normalized.js.source_maps = config.js.source_maps.filter(|s| *s);
    normalized.internal.offline = config.internal.offline.filter(|o| *o);

    for backend in Backend::ALL {
        if backend == config.platform() {
            continue;
        }
        match backend {
            Backend::Jvm => normalized.jvm = JvmOptions::default(),
            Backend::Js => normalized.js = JsOptions::default(),
            Backend::Native => normalized.native = NativeOptions::default(),
        }
    }

    normalized
}
