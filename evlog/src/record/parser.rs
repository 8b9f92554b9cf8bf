use std::{fmt, sync::Arc};

use super::{Record, RecordKind, TagKind, TagTable};

/// Результат разбора очередной порции байтов
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Получена полная запись
    ///
    /// `consumed` может быть `0`, когда строка закрыта тегом следующей записи
    Complete { record: Record, consumed: usize },

    /// Поглощен фрагмент строки, запись еще не готова
    Pending { consumed: usize },

    /// Данных меньше, чем требует тег
    NeedMoreData,
}

/// Тег отсутствует в таблице, длина записи не известна
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LostSync {
    /// Смещение байта тега
    pub offset: u64,
    pub tag: u8,
}

impl fmt::Display for LostSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lost sync at offset {} (tag 0x{:02x})", self.offset, self.tag)
    }
}

/// Максимальное кол-во символов строки, дальше строка закрывается как
/// не завершенная и продолжается следующей записью
pub const MAX_TEXT_LEN: usize = (u32::MAX / 2 - 1) as usize;

/// Накопленная строка
#[derive(Debug, Clone)]
struct Accumulator {
    tag: u8,
    start_offset: u64,
    bytes: Vec<u8>,
}

impl Accumulator {
    /// Завершение строки, `end` - смещение сразу за строкой
    fn into_record(self, end: u64, ordinal: u64, terminated: bool) -> Record {
        Record {
            ordinal,
            tag: self.tag,
            kind: RecordKind::Text { terminated },
            payload: self.bytes,
            byte_offset: self.start_offset,
            byte_length: u32::try_from(end - self.start_offset).unwrap_or(u32::MAX),
            raw_ticks: None,
        }
    }
}

/// Разбор записей по таблице тегов
///
/// Единственное состояние - накопитель строковой записи
#[derive(Debug, Clone)]
pub struct RecordParser {
    table: Arc<TagTable>,
    acc: Option<Accumulator>,
    max_text_len: usize,
}

impl RecordParser {
    pub fn new(table: Arc<TagTable>) -> Self {
        Self {
            table,
            acc: None,
            max_text_len: MAX_TEXT_LEN,
        }
    }

    /// Предел длины строки, не меньше одного символа
    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = max_text_len.clamp(1, MAX_TEXT_LEN);
        self
    }

    /// Сброс накопителя строки
    pub fn reset(&mut self) {
        self.acc = None;
    }

    /// Начало строки, которая еще накапливается
    pub fn pending_offset(&self) -> Option<u64> {
        self.acc.as_ref().map(|a| a.start_offset)
    }

    /// Разбор одной записи
    ///
    /// Аргументы
    ///
    /// - `buff` - доступные данные, `buff[0]` расположен по смещению `offset`
    /// - `ordinal` - номер, который получит завершенная запись
    pub fn decode_one(&mut self, buff: &[u8], offset: u64, ordinal: u64) -> Result<Decoded, LostSync> {
        let Some(&tag) = buff.first() else {
            return Ok(Decoded::NeedMoreData);
        };

        let Some(kind) = self.table.get(tag).map(|def| def.kind) else {
            // сначала выдается начатая строка, ошибка - при следующем вызове
            if let Some(acc) = self.acc.take() {
                let record = acc.into_record(offset, ordinal, false);
                return Ok(Decoded::Complete { record, consumed: 0 });
            }
            return Err(LostSync { offset, tag });
        };

        if self.acc.as_ref().is_some_and(|acc| acc.tag != tag) {
            if let Some(acc) = self.acc.take() {
                let record = acc.into_record(offset, ordinal, false);
                return Ok(Decoded::Complete { record, consumed: 0 });
            }
        }

        match kind {
            TagKind::Fixed { len, timestamp_at } => {
                // длина проверена при построении таблицы
                let size = len.saturating_add(1);
                if buff.len() < size {
                    return Ok(Decoded::NeedMoreData);
                }
                let payload = buff[1..size].to_vec();
                let raw_ticks = timestamp_at.map(|at| u16::from_le_bytes([payload[at], payload[at + 1]]));
                Ok(Decoded::Complete {
                    record: Record {
                        ordinal,
                        tag,
                        kind: RecordKind::Fixed,
                        payload,
                        byte_offset: offset,
                        byte_length: u32::try_from(size).unwrap_or(u32::MAX),
                        raw_ticks,
                    },
                    consumed: size,
                })
            }
            TagKind::Text => {
                if buff.len() < 2 {
                    return Ok(Decoded::NeedMoreData);
                }
                let ch = buff[1];
                let acc = self.acc.take().unwrap_or(Accumulator {
                    tag,
                    start_offset: offset,
                    bytes: Vec::new(),
                });
                if ch == 0 {
                    let record = acc.into_record(offset + 2, ordinal, true);
                    Ok(Decoded::Complete { record, consumed: 2 })
                } else if acc.bytes.len() >= self.max_text_len {
                    let record = acc.into_record(offset, ordinal, false);
                    Ok(Decoded::Complete { record, consumed: 0 })
                } else {
                    let mut acc = acc;
                    acc.bytes.push(ch);
                    self.acc = Some(acc);
                    Ok(Decoded::Pending { consumed: 2 })
                }
            }
        }
    }
}
