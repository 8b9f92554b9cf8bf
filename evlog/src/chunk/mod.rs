use std::fmt;

use serde::Serialize;

use crate::{
    bbuff::ABuffError,
    decode::DecodeErr,
    timekeeper::{ReorderStats, TimedRecord},
};

/// LRU кеш прочитанных диапазонов
mod cache;
pub use cache::*;

/// Чтение диапазона записей по индексу
mod provider;
pub use provider::*;

/// Диапазон записей `[start, end)` в порядке выдачи
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub start: u64,
    pub end: u64,

    /// Всего записей в потоке
    pub total: u64,

    pub records: Vec<TimedRecord>,

    /// Коррекции среди записей диапазона
    pub stats: ReorderStats,
}

impl Chunk {
    /// Пустой диапазон: запрошенные номера за пределами потока
    pub fn empty(start: u64, total: u64) -> Self {
        Self {
            start,
            end: start,
            total,
            records: Vec::new(),
            stats: ReorderStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Ошибка чтения диапазона
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkErr {
    /// Размер файла изменился после построения индекса
    IndexStale { indexed: u64, actual: u64 },
    Decode(DecodeErr),
    Buff(ABuffError),
}

impl From<DecodeErr> for ChunkErr {
    fn from(value: DecodeErr) -> Self {
        Self::Decode(value)
    }
}

impl From<ABuffError> for ChunkErr {
    fn from(value: ABuffError) -> Self {
        Self::Buff(value)
    }
}

impl fmt::Display for ChunkErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexStale { indexed, actual } => {
                write!(f, "index is stale: indexed {indexed} bytes, file has {actual}")
            }
            Self::Decode(err) => write!(f, "{err}"),
            Self::Buff(err) => write!(f, "{err}"),
        }
    }
}
