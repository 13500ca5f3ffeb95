use anyhow::{Context, Result};
use rosette_core::{
    config::PrinterConfig,
    curve::{CurveError, CurveKind, PolarFunction},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// On-disk description of one print job: printer configuration plus an
/// ordered list of curve entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFile {
    #[serde(default)]
    pub printer: PrinterConfig,

    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
}

/// One curve entry of a job file.
///
/// `kind` accepts either the named form (`"sine"`, `"abs-cosine"`) or the
/// numeric code used by legacy firmware function tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub kind: KindSpec,

    pub amplitude: f64,

    #[serde(default = "default_frequency")]
    pub frequency: f64,

    #[serde(default)]
    pub time_shift: f64,

    #[serde(default)]
    pub left_bound: f64,

    pub right_bound: f64,

    #[serde(default)]
    pub layer: u32,
}

fn default_frequency() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindSpec {
    Named(CurveKind),
    Code(i32),
}

impl KindSpec {
    pub fn resolve(&self) -> Result<CurveKind, CurveError> {
        match self {
            KindSpec::Named(kind) => Ok(*kind),
            KindSpec::Code(code) => CurveKind::from_code(*code),
        }
    }
}

impl FunctionSpec {
    pub fn resolve(&self) -> Result<PolarFunction, CurveError> {
        Ok(PolarFunction {
            kind: self.kind.resolve()?,
            amplitude: self.amplitude,
            frequency: self.frequency,
            time_shift: self.time_shift,
            left_bound: self.left_bound,
            right_bound: self.right_bound,
            layer: self.layer,
        })
    }
}

impl JobFile {
    /// Load a job file, auto-detecting TOML or JSON format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;

        let extension = path.extension().and_then(|s| s.to_str());
        match extension {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content).or_else(|_| Self::from_json(&content)),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse job as TOML")
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse job as JSON")
    }

    /// Resolve the entries into validated functions.
    ///
    /// An unrecognized curve kind aborts only the entry carrying it; the
    /// rest of the job proceeds in order.
    pub fn resolve_functions(&self) -> Vec<PolarFunction> {
        let mut functions = Vec::with_capacity(self.functions.len());
        for (index, spec) in self.functions.iter().enumerate() {
            match spec.resolve() {
                Ok(function) => functions.push(function),
                Err(err) => {
                    tracing::warn!(index, %err, "skipping function");
                }
            }
        }
        functions
    }
}
