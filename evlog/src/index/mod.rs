use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    bbuff::ABuffError,
    decode::{DecodeErr, SessionStart, StreamEnd},
    timekeeper::{ReorderStats, TimestampState},
};

/// Построение индекса
mod indexer;
pub use indexer::*;

/// Контрольная точка для произвольного доступа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub ordinal: u64,

    /// Смещение первого байта записи `ordinal`
    pub byte_offset: u64,

    /// Состояние до декодирования записи `ordinal`
    pub state: TimestampState,
}

impl From<IndexEntry> for SessionStart {
    fn from(value: IndexEntry) -> Self {
        SessionStart {
            ordinal: value.ordinal,
            offset: value.byte_offset,
            state: value.state,
        }
    }
}

/// Запись, время которой не удалось однозначно восстановить
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub ordinal: u64,
    pub byte_offset: u64,

    /// Шаг назад, тики
    pub back_ticks: u16,
}

/// Индекс потока
///
/// Строится за один проход и после не меняется
#[derive(Debug, Clone, Serialize)]
pub struct Index {
    pub(crate) entries: Vec<IndexEntry>,

    /// Кол-во декодированных записей
    pub total_records: u64,

    /// Размер файла на момент построения
    pub total_bytes: u64,

    /// Смещение сразу за последней записью
    pub decoded_bytes: u64,

    /// Причина остановки прохода
    pub end: StreamEnd,

    pub stats: ReorderStats,

    pub(crate) anomalies: Vec<Anomaly>,

    /// Сколько аномалий не поместилось в `anomalies`
    pub anomalies_dropped: u64,

    pub checkpoint_interval: u64,
}

impl Index {
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Ближайшая контрольная точка с номером не больше `ordinal`
    pub fn checkpoint_before(&self, ordinal: u64) -> Option<&IndexEntry> {
        let idx = self.entries.partition_point(|e| e.ordinal <= ordinal);
        if idx == 0 {
            None
        } else {
            self.entries.get(idx - 1)
        }
    }
}

/// Ошибка построения индекса
#[derive(Debug, Clone, PartialEq)]
pub enum IndexErr {
    Decode(DecodeErr),
    Buff(ABuffError),
    /// Интервал контрольных точек должен быть больше 0
    ZeroInterval,
}

impl From<DecodeErr> for IndexErr {
    fn from(value: DecodeErr) -> Self {
        Self::Decode(value)
    }
}

impl From<ABuffError> for IndexErr {
    fn from(value: ABuffError) -> Self {
        Self::Buff(value)
    }
}

impl fmt::Display for IndexErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "{err}"),
            Self::Buff(err) => write!(f, "{err}"),
            Self::ZeroInterval => write!(f, "checkpoint interval must be positive"),
        }
    }
}
