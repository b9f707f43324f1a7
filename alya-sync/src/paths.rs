//! DataPaths - 工作目录路径管理
//!
//! ## 目录结构
//!
//! ```text
//! {work-dir}/
//! ├── cache/                   # Local cache store, one JSON document per key
//! │   ├── dulce_alya_invoices.json
//! │   └── ...
//! ├── handles.redb             # Session handle store
//! ├── downloads/               # Fallback "download" target for snapshots
//! └── logs/                    # Rolling log files
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataPaths {
    base: PathBuf,
}

impl DataPaths {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            base: work_dir.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// 缓存目录: {work}/cache/
    pub fn cache_dir(&self) -> PathBuf {
        self.base.join("cache")
    }

    /// 句柄数据库: {work}/handles.redb
    pub fn handles_db(&self) -> PathBuf {
        self.base.join("handles.redb")
    }

    /// 默认下载目录: {work}/downloads/
    pub fn downloads_dir(&self) -> PathBuf {
        self.base.join("downloads")
    }

    /// 日志目录: {work}/logs/
    pub fn logs_dir(&self) -> PathBuf {
        self.base.join("logs")
    }

    /// Create every directory the stores write into
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.cache_dir())?;
        std::fs::create_dir_all(self.downloads_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = DataPaths::new("/data/alya");
        assert_eq!(paths.cache_dir(), PathBuf::from("/data/alya/cache"));
        assert_eq!(paths.handles_db(), PathBuf::from("/data/alya/handles.redb"));
        assert_eq!(paths.downloads_dir(), PathBuf::from("/data/alya/downloads"));
        assert_eq!(paths.logs_dir(), PathBuf::from("/data/alya/logs"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("work"));
        paths.ensure_dirs().unwrap();
        assert!(paths.cache_dir().is_dir());
        assert!(paths.downloads_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
    }
}
