use std::fs;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::config::config_directory;
use crate::domain::ticket::WorkflowState;
use crate::error::{AppError, AppResult};

const CACHE_FILE_NAME: &str = "workflow_states.json";
const CACHE_LIMIT: usize = 16;

#[derive(Default, Serialize, Deserialize)]
struct CacheFile {
    entries: Vec<CacheEntry>,
}

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    key: String,
    states: Vec<WorkflowState>,
}

/// Workflow states per API endpoint. They are seeded once server side and
/// almost never change, so the board does not refetch them on every run.
pub struct WorkflowStateCache {
    file_path: PathBuf,
    file: CacheFile,
}

impl WorkflowStateCache {
    pub fn load() -> AppResult<Self> {
        let dir = config_directory()?;
        Self::load_from(dir.join(CACHE_FILE_NAME))
    }

    pub fn load_from(path: PathBuf) -> AppResult<Self> {
        let file = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<CacheFile>(&contents)
                .map_err(|err| AppError::Cache(format!("invalid cache file: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => CacheFile::default(),
            Err(err) => return Err(AppError::Io(err)),
        };

        Ok(Self {
            file_path: path,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn get(&self, key: &str) -> Option<Vec<WorkflowState>> {
        self.file
            .entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.states.clone())
    }

    pub fn insert(&mut self, key: String, states: &[WorkflowState]) {
        self.file.entries.retain(|entry| entry.key != key);
        self.file.entries.push(CacheEntry {
            key,
            states: states.to_vec(),
        });

        if self.file.entries.len() > CACHE_LIMIT {
            let overflow = self.file.entries.len() - CACHE_LIMIT;
            self.file.entries.drain(0..overflow);
        }
    }

    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.file)
            .map_err(|err| AppError::Cache(format!("failed to write cache: {err}")))?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }

    pub fn compute_key(base_url: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(base_url.trim().trim_end_matches('/').as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
