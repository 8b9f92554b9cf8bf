use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use super::{StreamConfig, WebServer};

/// Имя файла настроек
pub const CONFIG_FILE_NAME: &str = "evlog.json";

/// Настройки приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Рабочий каталог
    #[serde(skip)]
    pub work_dir: String,

    /// Настройки веб сервера
    #[serde(default)]
    pub web_server: WebServer,

    /// Настройки потока
    #[serde(default)]
    pub stream: StreamConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            work_dir: ".".to_string(),
            web_server: WebServer::default(),
            stream: StreamConfig::default(),
        }
    }
}

impl AppConfig {
    fn work_dir() -> String {
        env::current_dir()
            .ok()
            .and_then(|d| d.to_str().map(|s| s.to_string()))
            .unwrap_or(".".to_string())
    }

    fn find_file_up(from: String, name: &str) -> Option<PathBuf> {
        let mut dir = PathBuf::from(from);
        loop {
            let file = dir.join(name);
            if file.exists() {
                return Some(file);
            }

            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break None,
            }
        }
    }

    /// Чтение настроек из json
    pub fn from_json(work_dir: String, json: &str) -> Result<Self, serde_json::Error> {
        let conf: AppConfig = serde_json::from_str(json)?;
        Ok(AppConfig { work_dir, ..conf })
    }

    /// Поиск `evlog.json` от рабочего каталога вверх
    pub fn find_or_default() -> Self {
        let work_dir = Self::work_dir();
        let found = Self::find_file_up(work_dir.clone(), CONFIG_FILE_NAME).and_then(|file| {
            info!("found config file {:?}", &file);
            match fs::read_to_string(&file) {
                Ok(str) => match Self::from_json(work_dir.clone(), &str) {
                    Ok(conf) => Some(conf),
                    Err(err) => {
                        warn!("can't read json from config file {file:?}: {err}");
                        None
                    }
                },
                Err(err) => {
                    warn!("can't read file {file:?}: {err}");
                    None
                }
            }
        });

        match found {
            Some(conf) => conf,
            None => {
                info!("use default config");
                AppConfig {
                    work_dir,
                    ..Self::default()
                }
            }
        }
    }
}

#[test]
fn test_json() {
    let conf = AppConfig::from_json(
        "/data".to_string(),
        r#"{
            "web_server": { "host": "0.0.0.0", "port": 9000 },
            "stream": { "file": "${work.dir}/flight.bin", "checkpoint_interval": 16 }
        }"#,
    )
    .unwrap();

    assert_eq!(conf.work_dir, "/data");
    assert_eq!(conf.web_server.port, 9000);
    assert_eq!(conf.stream.checkpoint_interval, 16);
    assert_eq!(conf.stream.cache_capacity, evlog::chunk::DEFAULT_CACHE_CAPACITY);

    let s = serde_json::to_string_pretty(&AppConfig::default()).unwrap();
    assert!(s.contains("checkpoint_interval"));
}

#[test]
fn test_empty_json() {
    let conf = AppConfig::from_json(".".to_string(), "{}").unwrap();
    assert_eq!(conf.web_server.port, WebServer::default().port);
    assert!(conf.stream.tags.is_none());
}
