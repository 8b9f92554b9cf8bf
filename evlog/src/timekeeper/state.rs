use serde::{Deserialize, Serialize};

/// Состояние восстановления времени
///
/// Полностью определяет дальнейшее декодирование: две сессии, начатые
/// с равного состояния с одного смещения, дают одинаковый результат
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampState {
    /// Последняя сырая метка, задавшая опорную точку
    pub last_raw_ticks: u16,

    /// Текущее абсолютное время, нс
    pub absolute_ns: u64,

    /// Кол-во записей без метки после последней опорной точки
    pub untimed_counter: u64,

    /// Опорная метка уже встречалась
    pub anchored: bool,

    /// Предыдущая запись сдвинула опорную точку и может быть переставлена
    /// со следующей
    pub swap_candidate: bool,

    /// Значение `absolute_ns` до установки текущей опорной точки
    pub floor_ns: u64,
}
