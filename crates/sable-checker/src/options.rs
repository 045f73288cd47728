//! Resolver options: JSON and file loading, validation and environment overrides.

use anyhow::{Context, Result, bail};
use sable_common::limits::{FALLBACK_WORKER_THREADS, MAX_INSTANTIATION_DEPTH, MAX_WORKER_THREADS};
use sable_solver::IntrinsicKind;
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding `workerThreads`.
pub const WORKERS_ENV: &str = "SABLE_WORKERS";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    /// Worker threads draining the work queue; 0 picks the available parallelism.
    pub worker_threads: usize,
    pub max_instantiation_depth: u32,
    /// Intrinsic type given to integer literals with nothing to fit against.
    pub default_integer_type: String,
    /// File name attached to every diagnostic.
    pub file_name: String,
    /// Host namespaces whose modules may be named without qualification.
    pub imported_namespaces: Vec<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            worker_threads: 0,
            max_instantiation_depth: MAX_INSTANTIATION_DEPTH,
            default_integer_type: "I32".to_string(),
            file_name: "<unit>".to_string(),
            imported_namespaces: Vec::new(),
        }
    }
}

impl ResolverOptions {
    pub fn from_json(source: &str) -> Result<Self> {
        let options: ResolverOptions =
            serde_json::from_str(source).context("failed to parse resolver options")?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read resolver options: {}", path.display()))?;
        Self::from_json(&source)
            .with_context(|| format!("invalid resolver options in {}", path.display()))
    }

    /// Apply `SABLE_WORKERS` if it is set to a number.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(workers) = std::env::var(WORKERS_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
        {
            self.worker_threads = workers;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        match IntrinsicKind::from_name(&self.default_integer_type) {
            Some(kind) if kind.is_integer() => {}
            _ => bail!(
                "unsupported defaultIntegerType '{}'",
                self.default_integer_type
            ),
        }
        if self.max_instantiation_depth == 0 {
            bail!("maxInstantiationDepth must be at least 1");
        }
        Ok(())
    }

    pub fn default_integer(&self) -> IntrinsicKind {
        IntrinsicKind::from_name(&self.default_integer_type)
            .filter(|kind| kind.is_integer())
            .unwrap_or(IntrinsicKind::I32)
    }

    /// Effective worker count, clamped to `1..=MAX_WORKER_THREADS`.
    pub fn effective_workers(&self) -> usize {
        let requested = if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(FALLBACK_WORKER_THREADS)
        } else {
            self.worker_threads
        };
        requested.clamp(1, MAX_WORKER_THREADS)
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;
