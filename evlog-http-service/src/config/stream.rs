use std::{env, path::PathBuf};

use evlog::{
    chunk::DEFAULT_CACHE_CAPACITY,
    index::DEFAULT_CHECKPOINT_INTERVAL,
    record::{TagDef, TagTable, TagTableErr},
    timekeeper::TimeConfig,
};
use serde::{Deserialize, Serialize};

/// Настройки потока
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Шаблон пути к файлу, допустимы `${work.dir}` и `${exe.dir}`
    pub file: String,

    /// Контрольная точка индекса на каждую n-ю запись
    pub checkpoint_interval: u64,

    /// Кол-во диапазонов в кеше
    pub cache_capacity: usize,

    /// `tick_ns`, `reorder_window_ticks`
    #[serde(flatten)]
    pub time: TimeConfig,

    /// Таблица тегов, если не задана - стандартная
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagDef>>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            file: "${work.dir}/stream.bin".to_string(),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            time: TimeConfig::default(),
            tags: None,
        }
    }
}

impl StreamConfig {
    /// Путь к файлу с подставленными переменными
    pub fn file_path(&self, work_dir: &str) -> PathBuf {
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|f| f.parent().and_then(|d| d.to_str()).map(|s| s.to_string()))
            .unwrap_or(".".to_string());

        let file = self.file.replace("${work.dir}", work_dir).replace("${exe.dir}", &exe_dir);
        let file = PathBuf::from(file);
        if file.is_absolute() {
            file
        } else {
            PathBuf::from(work_dir).join(file)
        }
    }

    pub fn tag_table(&self) -> Result<TagTable, TagTableErr> {
        match &self.tags {
            Some(defs) => TagTable::new(defs.clone()),
            None => Ok(TagTable::standard()),
        }
    }
}

#[test]
fn test_file_path() {
    let conf = StreamConfig::default();
    assert_eq!(conf.file_path("/var/evlog"), PathBuf::from("/var/evlog/stream.bin"));

    let conf = StreamConfig {
        file: "logs/a.bin".to_string(),
        ..StreamConfig::default()
    };
    assert_eq!(conf.file_path("/w"), PathBuf::from("/w/logs/a.bin"));
}

#[test]
fn test_custom_tags() {
    let conf: StreamConfig = serde_json::from_str(
        r#"{
            "reorder_window_ticks": 100,
            "tags": [
                { "tag": 1, "name": "tick", "kind": "fixed", "len": 2, "timestamp_at": 0 },
                { "tag": 32, "name": "text", "kind": "text" }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(conf.time.reorder_window_ticks, 100);
    assert_eq!(conf.time.tick_ns, evlog::timekeeper::TICK_NS);

    let table = conf.tag_table().unwrap();
    assert_eq!(table.iter().count(), 2);
    assert!(table.get(0x02).is_none());
}
