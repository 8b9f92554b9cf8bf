use std::{fmt, path::PathBuf, sync::Arc};

use evlog::{
    bbuff::{ABuffError, FileBuff},
    chunk::ChunkProvider,
    index::{IndexErr, Indexer},
    record::TagTableErr,
    timekeeper::TimeKeeper,
};
use log::info;

use crate::config::StreamConfig;

/// Открытый поток
pub type Provider = ChunkProvider<FileBuff>;

#[derive(Clone)]
pub struct AppState {
    /// Файл потока
    pub file: PathBuf,

    pub provider: Arc<Provider>,
}

/// Ошибка открытия потока
#[derive(Debug)]
pub enum OpenErr {
    Buff(ABuffError),
    Tags(TagTableErr),
    Index(IndexErr),
}

impl From<ABuffError> for OpenErr {
    fn from(value: ABuffError) -> Self {
        Self::Buff(value)
    }
}

impl From<TagTableErr> for OpenErr {
    fn from(value: TagTableErr) -> Self {
        Self::Tags(value)
    }
}

impl From<IndexErr> for OpenErr {
    fn from(value: IndexErr) -> Self {
        Self::Index(value)
    }
}

impl fmt::Display for OpenErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buff(err) => write!(f, "can't open stream: {err}"),
            Self::Tags(err) => write!(f, "bad tag table: {err}"),
            Self::Index(err) => write!(f, "can't build index: {err}"),
        }
    }
}

impl AppState {
    /// Открытие файла и построение индекса
    pub fn open(conf: &StreamConfig, work_dir: &str) -> Result<Self, OpenErr> {
        let file = conf.file_path(work_dir);
        info!("opening stream {file:?}");

        let table = Arc::new(conf.tag_table()?);
        let keeper = TimeKeeper::new(conf.time);
        let source = Arc::new(FileBuff::open_read_only(&file)?);

        let index = Indexer::new(table.clone(), keeper)
            .checkpoint_interval(conf.checkpoint_interval)
            .build(&*source)?;

        let provider = ChunkProvider::new(source, Arc::new(index), table, keeper, conf.cache_capacity);
        Ok(Self {
            file,
            provider: Arc::new(provider),
        })
    }
}
