/// Источники байтов с позиционным чтением
pub mod bbuff;

/// Записи и таблица тегов
pub mod record;

/// Восстановление абсолютного времени
pub mod timekeeper;

/// Последовательное декодирование потока
pub mod decode;

/// Индекс контрольных точек
pub mod index;

/// Произвольный доступ к диапазонам записей
pub mod chunk;

/// Текстовое представление записей
pub mod render;

/// Синтетические потоки
pub mod synth;

/// Замеры производительности
pub mod perf;
