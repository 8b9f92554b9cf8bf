use serde::{Deserialize, Serialize};

/// Таблица тегов
mod tag;
pub use tag::*;

/// Разбор отдельной записи
mod parser;
pub use parser::*;

/// Вид записи
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Запись фиксированной длины
    Fixed,

    /// Строковая запись
    ///
    /// `terminated = false` - строка была прервана записью с другим тегом
    Text { terminated: bool },
}

/// Логическая запись потока
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Порядковый номер записи в потоке, с 0
    pub ordinal: u64,

    pub tag: u8,

    pub kind: RecordKind,

    /// Данные записи без байта тега; для строк - символы без завершающего нуля
    pub payload: Vec<u8>,

    /// Смещение первого байта записи
    pub byte_offset: u64,

    /// Кол-во байт потока, занятых записью
    pub byte_length: u32,

    /// Сырая метка времени в тиках, если тег ее содержит
    pub raw_ticks: Option<u16>,
}

impl Record {
    /// Смещение сразу за записью
    pub fn end_offset(&self) -> u64 {
        self.byte_offset + self.byte_length as u64
    }

    pub fn is_timed(&self) -> bool {
        self.raw_ticks.is_some()
    }
}
