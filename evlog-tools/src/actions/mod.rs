use std::{path::Path, sync::Arc};

use evlog::{
    bbuff::FileBuff,
    chunk::{ChunkProvider, DEFAULT_CACHE_CAPACITY},
    index::Indexer,
    record::TagTable,
    timekeeper::TimeKeeper,
};

use crate::err::ToolErr;

/// Сводка по файлу
pub mod info;

/// Вывод диапазона записей
pub mod view;

/// Создание тестового потока
pub mod generate;

/// Открытие файла со стандартной таблицей тегов
pub fn open_stream<P: AsRef<Path>>(file: P) -> Result<ChunkProvider<FileBuff>, ToolErr> {
    let table = Arc::new(TagTable::standard());
    let keeper = TimeKeeper::default();
    let source = Arc::new(FileBuff::open_read_only(file)?);
    let index = Indexer::new(table.clone(), keeper).build(&*source)?;
    Ok(ChunkProvider::new(source, Arc::new(index), table, keeper, DEFAULT_CACHE_CAPACITY))
}
