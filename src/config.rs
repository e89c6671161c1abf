//! Run configuration: worker pool sizing and JSON set-cover run files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::array::LongArray;
use crate::core::compress::Compressor;
use crate::error::ComputeError;
use crate::setcover::{designs, load_codewords, SetCoverParams, MAX_UNIVERSE};

/// Worker pool sizing for parallel traversal and in-process evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// `None` uses the available hardware parallelism.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl ComputeConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: Some(threads),
        }
    }

    /// Resolved worker count.
    pub fn threads(&self) -> usize {
        match self.threads {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
        }
    }

    pub fn build_pool(&self) -> Result<rayon::ThreadPool, ComputeError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads())
            .thread_name(|i| format!("finspace-worker-{i}"))
            .build()
            .map_err(|e| ComputeError::invalid(format!("failed to build worker pool: {e}")))
    }

    /// Run `op` inside a freshly built pool; rayon work started by `op` stays on that pool.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> Result<R, ComputeError> {
        Ok(self.build_pool()?.install(op))
    }
}

/// Where the codewords of a run come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodewordSource {
    Inline {
        values: Vec<u64>,
    },
    /// A binary `LongArray` file; relative paths resolve against the config file's directory.
    File {
        path: PathBuf,
        #[serde(default)]
        compression: Compressor,
    },
    Fano,
    AllSubsets {
        k: u32,
    },
    Greedy {
        k: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub dir: PathBuf,
    #[serde(default)]
    pub compression: Compressor,
    #[serde(default)]
    pub force: bool,
}

fn default_executor() -> String {
    "in-process".to_string()
}

/// One set-cover run, as read from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCoverConfig {
    pub v: u32,
    pub m: u32,
    pub t: u32,
    pub codewords: CodewordSource,
    #[serde(default = "default_executor")]
    pub executor: String,
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub export: Option<ExportConfig>,
}

impl SetCoverConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ComputeError> {
        serde_json::from_str(s)
            .map_err(|e| ComputeError::invalid(format!("malformed set-cover config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        let text =
            fs::read_to_string(path).map_err(|e| ComputeError::io_at("config_read", path, e))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        let (v, m) = (self.v, self.m);
        if v > MAX_UNIVERSE {
            return Err(ComputeError::invalid(format!(
                "v={v} exceeds the {MAX_UNIVERSE}-element universe of a u64 bitmask"
            )));
        }
        if m > v {
            return Err(ComputeError::invalid(format!("m={m} exceeds v={v}")));
        }
        match &self.codewords {
            CodewordSource::AllSubsets { k } | CodewordSource::Greedy { k } if *k > v => {
                return Err(ComputeError::invalid(format!("k={k} exceeds v={v}")));
            }
            CodewordSource::Inline { values } if values.is_empty() => {
                return Err(ComputeError::invalid("inline codeword list is empty"));
            }
            _ => {}
        }
        if self.threads == Some(0) {
            return Err(ComputeError::invalid("threads must be positive"));
        }
        if self.executor.trim().is_empty() {
            return Err(ComputeError::invalid("executor name is empty"));
        }
        Ok(())
    }

    pub fn compute(&self) -> ComputeConfig {
        ComputeConfig {
            threads: self.threads,
        }
    }

    /// Materialize the codewords; `base_dir` anchors relative file paths.
    pub fn codewords(&self, base_dir: &Path) -> Result<LongArray, ComputeError> {
        match &self.codewords {
            CodewordSource::Inline { values } => Ok(LongArray::wrap(values.clone())),
            CodewordSource::File { path, compression } => {
                let path = if path.is_relative() {
                    base_dir.join(path)
                } else {
                    path.clone()
                };
                load_codewords(&path, *compression)
            }
            CodewordSource::Fano => Ok(designs::fano_plane()),
            CodewordSource::AllSubsets { k } => designs::all_subsets(self.v, *k),
            CodewordSource::Greedy { k } => designs::greedy_cover(self.v, self.m, *k, self.t),
        }
    }

    /// Validate, load the codewords and build the instance.
    pub fn params(&self, base_dir: &Path) -> Result<SetCoverParams, ComputeError> {
        self.validate()?;
        SetCoverParams::new(self.v, self.m, self.t, self.codewords(base_dir)?)
    }
}
