//! Configuration fingerprints for build-cache keys.
//!
//! A fingerprint identifies the non-default state of a normalized
//! configuration. Fields are visited in a fixed order and every non-default
//! value is hashed as one or more `<path>=<value>` lines:
//!
//! ```text
//! compiler.version=3.6.4
//! compiler.options[0]=-deprecation
//! platform=js
//! js.mode=full
//! jvm.properties.file.encoding=UTF-8
//! ```
//!
//! Sequences keep their order (compiler flags are order-sensitive), sets and
//! maps are visited sorted. Internal options never reach the hash because
//! they cannot change what is built.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::builder::normalize::normalize;
use crate::core::backend::Backend;
use crate::core::config::BuildConfiguration;
use crate::util::hash::Fingerprint;

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 12;

/// Compute the fingerprint of a configuration.
///
/// The configuration is normalized first. Returns `None` when every
/// fingerprinted field has its default value.
pub fn fingerprint(config: &BuildConfiguration) -> Option<String> {
    let normalized = normalize(config);

    let mut walker = FieldWalker::default();
    walker.visit(&normalized);

    if walker.fp.is_empty() {
        tracing::debug!("Configuration is fully default, no fingerprint");
        return None;
    }

    tracing::debug!("Fingerprinting {} non-default field(s)", walker.fp.len());
    Some(walker.fp.finish_short(FINGERPRINT_LEN))
}

/// The `<path>=<value>` lines a configuration contributes, in hash order.
///
/// Useful for explaining why two configurations fingerprint differently.
pub fn fingerprint_fields(config: &BuildConfiguration) -> Vec<(String, String)> {
    let mut walker = FieldWalker {
        record: true,
        ..FieldWalker::default()
    };
    walker.visit(&normalize(config));
    walker.fields
}

#[derive(Default)]
struct FieldWalker {
    fp: Fingerprint,
    record: bool,
    fields: Vec<(String, String)>,
}

impl FieldWalker {
    fn visit(&mut self, config: &BuildConfiguration) {
        let compiler = &config.compiler;
        self.opt("compiler.version", &compiler.version);
        self.opt("compiler.binary-version", &compiler.binary_version);
        self.set("compiler.extra-versions", &compiler.extra_versions);
        self.flag("compiler.host-only", compiler.is_host_only());
        self.list("compiler.options", &compiler.options);
        self.list("compiler.plugins", &compiler.plugins);

        if config.platform() != Backend::default() {
            self.field("platform", config.platform().as_str());
        }
        let extra_platforms: Vec<&str> = config.extra_platforms.iter().map(|p| p.as_str()).collect();
        self.list("extra-platforms", &extra_platforms);

        let jvm = &config.jvm;
        self.opt("jvm.jvm-id", &jvm.jvm_id);
        self.opt("jvm.release", &jvm.release);
        self.list("jvm.java-options", &jvm.java_options);
        self.map("jvm.properties", &jvm.properties);

        let js = &config.js;
        self.opt("js.version", &js.version);
        self.opt("js.mode", &js.mode);
        self.opt("js.module-kind", &js.module_kind);
        self.flag("js.source-maps", js.emits_source_maps());

        let native = &config.native;
        self.opt("native.version", &native.version);
        self.opt("native.gc", &native.gc);
        self.opt("native.mode", &native.mode);
        self.list("native.link-flags", &native.link_flags);

        let classpath = &config.classpath;
        self.list("classpath.dependencies", &classpath.dependencies);
        self.list("classpath.repositories", &classpath.repositories);
        self.paths("classpath.extra-jars", &classpath.extra_jars);

        // config.internal is bookkeeping only.
    }

    fn field(&mut self, path: &str, value: &str) {
        // The first unescaped `=` ends the path; no newline survives escaping.
        let value = value.escape_default().to_string();
        self.fp.update_field(path, &value);
        if self.record {
            self.fields.push((path.to_string(), value));
        }
    }

    fn opt(&mut self, path: &str, value: &Option<String>) {
        if let Some(value) = value {
            self.field(path, value);
        }
    }

    fn flag(&mut self, path: &str, value: bool) {
        if value {
            self.field(path, "true");
        }
    }

    fn list<S: AsRef<str>>(&mut self, path: &str, values: &[S]) {
        for (i, value) in values.iter().enumerate() {
            self.field(&format!("{}[{}]", path, i), value.as_ref());
        }
    }

    fn set(&mut self, path: &str, values: &BTreeSet<String>) {
        for (i, value) in values.iter().enumerate() {
            self.field(&format!("{}[{}]", path, i), value);
        }
    }

    fn map(&mut self, path: &str, values: &BTreeMap<String, String>) {
        for (key, value) in values {
            self.field(&format!("{}.{}", path, escape_key(key)), value);
        }
    }

    fn paths(&mut self, path: &str, values: &[PathBuf]) {
        let values: Vec<String> = values
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        self.list(path, &values);
    }
}

/// Escape a map key for use inside a field path.
///
/// Keys may hold any character, so `=` is escaped alongside the usual
/// `escape_default` set to keep the path/value separator unique.
fn escape_key(key: &str) -> String {
    key.escape_default().to_string().replace('=', "\\=")
}
