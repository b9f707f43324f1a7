use std::path::PathBuf;
use std::time::Duration;

use drive_client::DriveConfig;

use crate::paths::DataPaths;

/// Default auto-save quiescence window
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;
/// Default scheduled flush interval
pub const DEFAULT_SCHEDULED_FLUSH_SECS: u64 = 5 * 60;
/// Folder holding the backup in the cloud drive
pub const CLOUD_FOLDER_NAME: &str = "Dulce Alya Backup";
/// Snapshot file name, in the cloud folder
pub const CLOUD_FILE_NAME: &str = "DulceAlya_DB.json";

/// 同步核心配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | ALYA_WORK_DIR | ./alya-data | 工作目录 (cache, handles, logs) |
/// | ALYA_DOWNLOAD_DIR | {work}/downloads | 无文件句柄时的下载目录 |
/// | ALYA_DEBOUNCE_MS | 2000 | 自动保存防抖 (毫秒) |
/// | ALYA_SCHEDULED_FLUSH_SECS | 300 | 定时保存间隔 (秒) |
/// | ALYA_ADMIN_USER | admin | 登录用户名 |
/// | ALYA_ADMIN_PASSWORD | Jhoyliz20 | 登录密码 |
/// | ALYA_DEVICE | Desktop | 登录历史中的设备名 |
///
/// Drive endpoints are read by [`DriveConfig::from_env`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub work_dir: PathBuf,
    pub download_dir: PathBuf,
    pub debounce: Duration,
    pub scheduled_interval: Duration,
    pub admin_user: String,
    pub admin_password: String,
    pub device_name: String,
    pub drive: DriveConfig,
    pub cloud_folder_name: String,
    pub cloud_file_name: String,
}

impl SyncConfig {
    /// Defaults rooted at `work_dir`, without consulting the environment
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            download_dir: DataPaths::new(&work_dir).downloads_dir(),
            work_dir,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            scheduled_interval: Duration::from_secs(DEFAULT_SCHEDULED_FLUSH_SECS),
            admin_user: "admin".into(),
            admin_password: "Jhoyliz20".into(),
            device_name: "Desktop".into(),
            drive: DriveConfig::default(),
            cloud_folder_name: CLOUD_FOLDER_NAME.into(),
            cloud_file_name: CLOUD_FILE_NAME.into(),
        }
    }

    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let work_dir = std::env::var("ALYA_WORK_DIR").unwrap_or_else(|_| "./alya-data".into());
        let mut config = Self::new(work_dir);

        if let Ok(dir) = std::env::var("ALYA_DOWNLOAD_DIR") {
            config.download_dir = dir.into();
        }
        if let Some(ms) = env_parse("ALYA_DEBOUNCE_MS") {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse("ALYA_SCHEDULED_FLUSH_SECS") {
            config.scheduled_interval = Duration::from_secs(secs);
        }
        if let Ok(user) = std::env::var("ALYA_ADMIN_USER") {
            config.admin_user = user;
        }
        if let Ok(password) = std::env::var("ALYA_ADMIN_PASSWORD") {
            config.admin_password = password;
        }
        if let Ok(device) = std::env::var("ALYA_DEVICE") {
            config.device_name = device;
        }
        config.drive = DriveConfig::from_env();
        config
    }

    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.work_dir)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_scheduled_interval(mut self, interval: Duration) -> Self {
        self.scheduled_interval = interval;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::new("/tmp/alya");
        assert_eq!(config.debounce, Duration::from_secs(2));
        assert_eq!(config.scheduled_interval, Duration::from_secs(300));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/alya/downloads"));
        assert_eq!(config.cloud_folder_name, "Dulce Alya Backup");
        assert_eq!(config.cloud_file_name, "DulceAlya_DB.json");
    }

    #[test]
    fn test_builders() {
        let config = SyncConfig::new("/tmp/alya")
            .with_debounce(Duration::from_millis(10))
            .with_download_dir("/tmp/out");
        assert_eq!(config.debounce, Duration::from_millis(10));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/out"));
    }
}
