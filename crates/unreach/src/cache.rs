//! Analysis Cache (C4): content-addressed on-disk store mapping file
//! hash to `FileSummary`, plus per-file metadata for change detection.
//!
//! A `DashMap`-backed concurrent cache layered over read-only disk state,
//! following `ftree_cache::context_data::WithCache`'s idiom of a fast
//! in-memory layer in front of a durable on-disk one.
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::parse::FileSummary;

const MANIFEST_FILE: &str = "cache.json";
const AST_DIR: &str = "asts";
const CACHE_DIR: &str = ".unreach";
const AST_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const AST_DIR_MAX_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileMetadata {
    pub hash: String,
    pub mtime: u64,
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AstBlob {
    node: FileSummary,
    hash: String,
    timestamp: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct Classification {
    pub changed: Vec<PathBuf>,
    pub new: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

pub struct AnalysisCache {
    root: PathBuf,
    in_memory: DashMap<PathBuf, (FileSummary, String)>,
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn ast_key(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

impl AnalysisCache {
    pub fn new(project_root: &Path) -> Self {
        Self {
            root: project_root.join(CACHE_DIR),
            in_memory: DashMap::new(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.root
    }

    pub fn file_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn metadata(path: &Path, content: &str) -> std::io::Result<FileMetadata> {
        let meta = std::fs::metadata(path)?;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(FileMetadata {
            hash: Self::file_hash(content),
            mtime,
            size: meta.len(),
        })
    }

    /// Ensures `.unreach/` is present in `.gitignore` if a `.git` directory
    /// exists at the project root.
    pub fn ensure_gitignore(&self, project_root: &Path) {
        if !project_root.join(".git").is_dir() {
            return;
        }
        let gitignore_path = project_root.join(".gitignore");
        let existing = std::fs::read_to_string(&gitignore_path).unwrap_or_default();
        if existing.lines().any(|l| l.trim() == CACHE_DIR) {
            return;
        }
        let mut file = match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&gitignore_path)
        {
            Ok(f) => f,
            Err(_) => return,
        };
        let prefix = if existing.is_empty() || existing.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        let _ = write!(file, "{prefix}{CACHE_DIR}\n");
    }

    /// Loads the manifest, tolerating a missing or malformed file by
    /// returning an empty mapping.
    pub fn load_manifest(&self) -> ahashmap::AHashMap<PathBuf, FileMetadata> {
        let path = self.root.join(MANIFEST_FILE);
        let Ok(content) = std::fs::read_to_string(path) else {
            return ahashmap::AHashMap::default();
        };
        let entries: Vec<(PathBuf, FileMetadata)> = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(_) => return ahashmap::AHashMap::default(),
        };
        entries.into_iter().collect()
    }

    pub fn save_manifest(
        &self,
        manifest: &ahashmap::AHashMap<PathBuf, FileMetadata>,
    ) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let entries: Vec<(&PathBuf, &FileMetadata)> = manifest.iter().collect();
        let json = serde_json::to_string(&entries)?;
        let tmp_path = self.root.join(format!("{MANIFEST_FILE}.tmp"));
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, self.root.join(MANIFEST_FILE))
    }

    /// Classifies the current set of on-disk files against a previously
    /// saved manifest.
    pub fn classify(
        &self,
        current_files: &[PathBuf],
        current_metadata: &ahashmap::AHashMap<PathBuf, FileMetadata>,
        old_manifest: &ahashmap::AHashMap<PathBuf, FileMetadata>,
    ) -> Classification {
        let mut result = Classification::default();
        let current_set: ahashmap::AHashSet<&PathBuf> = current_files.iter().collect();

        for file in current_files {
            match old_manifest.get(file) {
                None => result.new.push(file.clone()),
                Some(old) => {
                    let current = current_metadata.get(file);
                    match current {
                        Some(current) if current.hash == old.hash && current.mtime == old.mtime => {
                            result.unchanged.push(file.clone());
                        }
                        _ => result.changed.push(file.clone()),
                    }
                }
            }
        }

        for file in old_manifest.keys() {
            if !current_set.contains(file) {
                result.deleted.push(file.clone());
            }
        }

        result
    }

    /// Loads a cached `FileSummary`, returning `None` on miss, hash
    /// mismatch, or an AST blob older than 7 days.
    pub fn load_ast(&self, path: &Path, current_hash: &str) -> Option<FileSummary> {
        if let Some(entry) = self.in_memory.get(path) {
            if entry.1 == current_hash {
                return Some(entry.0.clone());
            }
        }

        let blob_path = self.root.join(AST_DIR).join(format!("{}.json", ast_key(path)));
        let content = std::fs::read_to_string(&blob_path).ok()?;
        let blob: AstBlob = serde_json::from_str(&content).ok()?;

        if blob.hash != current_hash {
            return None;
        }
        let age = now_unix().saturating_sub(blob.timestamp);
        if age > AST_MAX_AGE.as_secs() {
            return None;
        }

        self.in_memory
            .insert(path.to_path_buf(), (blob.node.clone(), blob.hash));
        Some(blob.node)
    }

    /// Writes a parsed `FileSummary` back under its content-hash key,
    /// evicting the oldest 25% of blobs if the `asts/` directory has grown
    /// past 100 MiB.
    pub fn save_ast(&self, path: &Path, node: &FileSummary, hash: &str) -> std::io::Result<()> {
        let ast_dir = self.root.join(AST_DIR);
        std::fs::create_dir_all(&ast_dir)?;
        self.evict_if_oversized(&ast_dir)?;

        let blob = AstBlob {
            node: node.clone(),
            hash: hash.to_string(),
            timestamp: now_unix(),
        };
        let json = serde_json::to_string(&blob)?;
        let blob_path = ast_dir.join(format!("{}.json", ast_key(path)));
        let tmp_path = ast_dir.join(format!("{}.json.tmp", ast_key(path)));
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &blob_path)?;

        self.in_memory
            .insert(path.to_path_buf(), (node.clone(), hash.to_string()));
        Ok(())
    }

    fn evict_if_oversized(&self, ast_dir: &Path) -> std::io::Result<()> {
        let mut entries: Vec<(PathBuf, u64, SystemTime)> = Vec::new();
        let mut total: u64 = 0;

        let Ok(dir) = std::fs::read_dir(ast_dir) else {
            return Ok(());
        };
        for entry in dir.flatten() {
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(UNIX_EPOCH);
            total += meta.len();
            entries.push((entry.path(), meta.len(), modified));
        }

        if total <= AST_DIR_MAX_BYTES {
            return Ok(());
        }

        entries.sort_by_key(|(_, _, modified)| *modified);
        let evict_count = entries.len() / 4;
        for (path, _, _) in entries.into_iter().take(evict_count) {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }

    pub fn clear_all(&self) -> std::io::Result<()> {
        self.in_memory.clear();
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }

    pub fn clear_asts(&self) -> std::io::Result<()> {
        self.in_memory.clear();
        let ast_dir = self.root.join(AST_DIR);
        if ast_dir.exists() {
            std::fs::remove_dir_all(&ast_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_tmpdir::test_tmpdir;

    #[test]
    fn manifest_round_trips_through_disk() {
        let tmpdir = test_tmpdir!();
        let cache = AnalysisCache::new(tmpdir.root());
        let mut manifest = ahashmap::AHashMap::default();
        manifest.insert(
            PathBuf::from("/a/b.ts"),
            FileMetadata {
                hash: "abc".to_string(),
                mtime: 123,
                size: 10,
            },
        );
        cache.save_manifest(&manifest).unwrap();
        let loaded = cache.load_manifest();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn missing_manifest_loads_as_empty() {
        let tmpdir = test_tmpdir!();
        let cache = AnalysisCache::new(tmpdir.root());
        assert!(cache.load_manifest().is_empty());
    }

    #[test]
    fn classify_detects_new_changed_unchanged_deleted() {
        let tmpdir = test_tmpdir!();
        let cache = AnalysisCache::new(tmpdir.root());

        let mut old_manifest = ahashmap::AHashMap::default();
        old_manifest.insert(
            PathBuf::from("/a/unchanged.ts"),
            FileMetadata {
                hash: "same".to_string(),
                mtime: 1,
                size: 1,
            },
        );
        old_manifest.insert(
            PathBuf::from("/a/changed.ts"),
            FileMetadata {
                hash: "old".to_string(),
                mtime: 1,
                size: 1,
            },
        );
        old_manifest.insert(
            PathBuf::from("/a/deleted.ts"),
            FileMetadata {
                hash: "gone".to_string(),
                mtime: 1,
                size: 1,
            },
        );

        let mut current_metadata = ahashmap::AHashMap::default();
        current_metadata.insert(
            PathBuf::from("/a/unchanged.ts"),
            FileMetadata {
                hash: "same".to_string(),
                mtime: 1,
                size: 1,
            },
        );
        current_metadata.insert(
            PathBuf::from("/a/changed.ts"),
            FileMetadata {
                hash: "new".to_string(),
                mtime: 2,
                size: 2,
            },
        );
        current_metadata.insert(
            PathBuf::from("/a/new.ts"),
            FileMetadata {
                hash: "n".to_string(),
                mtime: 1,
                size: 1,
            },
        );

        let current_files = vec![
            PathBuf::from("/a/unchanged.ts"),
            PathBuf::from("/a/changed.ts"),
            PathBuf::from("/a/new.ts"),
        ];

        let result = cache.classify(&current_files, &current_metadata, &old_manifest);
        assert_eq!(result.unchanged, vec![PathBuf::from("/a/unchanged.ts")]);
        assert_eq!(result.changed, vec![PathBuf::from("/a/changed.ts")]);
        assert_eq!(result.new, vec![PathBuf::from("/a/new.ts")]);
        assert_eq!(result.deleted, vec![PathBuf::from("/a/deleted.ts")]);
    }

    #[test]
    fn ast_round_trips_through_disk() {
        let tmpdir = test_tmpdir!();
        let cache = AnalysisCache::new(tmpdir.root());
        let path = PathBuf::from("/a/b.ts");
        let summary = FileSummary::default();
        cache.save_ast(&path, &summary, "hash1").unwrap();

        // force a fresh cache instance so this exercises the disk path, not
        // the in-memory layer
        let cache2 = AnalysisCache::new(tmpdir.root());
        let loaded = cache2.load_ast(&path, "hash1");
        assert_eq!(loaded, Some(summary));
    }

    #[test]
    fn ast_load_misses_on_hash_mismatch() {
        let tmpdir = test_tmpdir!();
        let cache = AnalysisCache::new(tmpdir.root());
        let path = PathBuf::from("/a/b.ts");
        cache
            .save_ast(&path, &FileSummary::default(), "hash1")
            .unwrap();
        assert!(cache.load_ast(&path, "hash2").is_none());
    }
}
