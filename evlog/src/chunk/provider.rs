use std::sync::Arc;

use log::{debug, trace};

use super::{CacheStats, Chunk, ChunkCache, ChunkErr};
use crate::{
    bbuff::{BytesCount, ReadBytesFrom},
    decode::{DecodeSession, SessionStart},
    index::Index,
    perf::Tracker,
    record::TagTable,
    timekeeper::{ReorderStats, TimeKeeper, TimedRecord},
};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Чтение диапазона записей по индексу
///
/// ```mermaid
/// flowchart TD
/// req["fetch(start, end)"] --> stale{"размер файла = index.total_bytes"}
/// stale --> |нет| err[IndexStale]
/// stale --> |да| clamp["end = min(end, total)"]
/// clamp --> empty{"start >= end"}
/// empty --> |да| e[пустой диапазон]
/// empty --> |нет| cache{"кеш (start, end)"}
/// cache --> |есть| hit[Arc&lt;Chunk&gt;]
/// cache --> |нет| cp["контрольная точка <= start - 1"]
/// cp --> dec["декодирование до end + 1"]
/// dec --> flt["позиции выдачи [start, end)"]
/// flt --> put[в кеш] --> hit
/// ```
///
/// Каждый вызов читает файл своим курсором, индекс и источник не меняются,
/// поэтому `fetch` можно вызывать из нескольких потоков
pub struct ChunkProvider<S: ReadBytesFrom + BytesCount + ?Sized> {
    source: Arc<S>,
    index: Arc<Index>,
    table: Arc<TagTable>,
    keeper: TimeKeeper,
    cache: ChunkCache,
    tracker: Tracker,
}

impl<S: ReadBytesFrom + BytesCount + ?Sized> ChunkProvider<S> {
    pub fn new(
        source: Arc<S>,
        index: Arc<Index>,
        table: Arc<TagTable>,
        keeper: TimeKeeper,
        cache_capacity: usize,
    ) -> Self {
        Self {
            source,
            index,
            table,
            keeper,
            cache: ChunkCache::new(cache_capacity),
            tracker: Tracker::new(),
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn table(&self) -> &TagTable {
        &self.table
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Замеры декодирования
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Записи, занимающие позиции `[start, end)` в порядке выдачи
    ///
    /// Позиция совпадает с номером записи, кроме пар соседних записей,
    /// переставленных при коррекции; склейка соседних диапазонов дает
    /// ту же последовательность, что и чтение с начала потока
    pub fn fetch(&self, start: u64, end: u64) -> Result<Arc<Chunk>, ChunkErr> {
        let actual = self.source.bytes_count()?;
        if actual != self.index.total_bytes {
            return Err(ChunkErr::IndexStale {
                indexed: self.index.total_bytes,
                actual,
            });
        }

        let total = self.index.total_records;
        let end = end.min(total);
        if start >= end {
            trace!("empty range {start}..{end}, total {total}");
            return Ok(Arc::new(Chunk::empty(start.min(total), total)));
        }

        let key = (start, end);
        if let Some(chunk) = self.cache.get(&key) {
            return Ok(chunk);
        }

        let chunk = Arc::new(self.tracker.track("chunk.decode", || self.decode(start, end))?);
        self.cache.put(key, chunk.clone());
        Ok(chunk)
    }

    fn decode(&self, start: u64, end: u64) -> Result<Chunk, ChunkErr> {
        // запас в одну запись перед start
        let from: SessionStart = self
            .index
            .checkpoint_before(start.saturating_sub(1))
            .map(|e| (*e).into())
            .unwrap_or_default();
        debug!("decode {start}..{end} from ordinal {} at {}", from.ordinal, from.offset);

        // позиция end - 1 может быть занята записью end, переставленной вперед
        let session = DecodeSession::resume(&*self.source, self.table.clone(), self.keeper, from)
            .with_limit(end.saturating_add(1));
        let mut records = Vec::<TimedRecord>::with_capacity((end - start) as usize);
        for (position, timed) in (from.ordinal..).zip(session) {
            if position >= end {
                break;
            }
            let timed = timed?;
            if position >= start {
                records.push(timed);
            }
        }

        Ok(Chunk {
            start,
            end,
            total: self.index.total_records,
            stats: ReorderStats::of(records.iter()),
            records,
        })
    }
}
