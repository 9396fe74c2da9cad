use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// データディレクトリを指定する環境変数。
pub const DATA_DIR_ENV: &str = "TIME_TRACKER_DIR";
const DEFAULT_DIR_NAME: &str = ".time-tracker";
const DATABASE_FILE_NAME: &str = "time-tracker.db";

/// アプリケーションの設定。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// 設定を解決する。
    ///
    /// データディレクトリは引数、環境変数`TIME_TRACKER_DIR`、`~/.time-tracker`の順に優先する。
    ///
    /// # Arguments
    ///
    /// * `data_dir` - コマンドライン引数で指定されたデータディレクトリ
    pub fn resolve(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => match env::var_os(DATA_DIR_ENV) {
                Some(dir) if !dir.is_empty() => PathBuf::from(dir),
                _ => dirs::home_dir()
                    .context("Failed to find home directory")?
                    .join(DEFAULT_DIR_NAME),
            },
        };

        Ok(Self { data_dir })
    }

    /// データベースファイルのパス。
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}
