use std::{sync::Arc, time::Instant};

use log::{debug, info, warn};

use super::{Anomaly, Index, IndexEntry, IndexErr};
use crate::{
    bbuff::{BytesCount, ReadBytesFrom},
    decode::{DecodeObserver, DecodeSession, StreamEnd},
    record::{Record, TagTable},
    timekeeper::{Order, TimeKeeper, TimestampState},
};

/// Интервал контрольных точек по умолчанию
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 64;

/// Максимальное кол-во сохраняемых аномалий
pub const MAX_ANOMALIES: usize = 1024;

/// Построение индекса за один проход
#[derive(Debug, Clone)]
pub struct Indexer {
    table: Arc<TagTable>,
    keeper: TimeKeeper,
    checkpoint_interval: u64,
}

/// Сбор контрольных точек каждые `interval` записей
struct Checkpoints {
    interval: u64,
    entries: Vec<IndexEntry>,
}

impl DecodeObserver for Checkpoints {
    fn record_parsed(&mut self, record: &Record, before: &TimestampState) {
        if record.ordinal % self.interval == 0 {
            self.entries.push(IndexEntry {
                ordinal: record.ordinal,
                byte_offset: record.byte_offset,
                state: *before,
            });
        }
    }
}

impl Indexer {
    pub fn new(table: Arc<TagTable>, keeper: TimeKeeper) -> Self {
        Self {
            table,
            keeper,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }

    /// Контрольная точка на каждую `interval`-ю запись
    pub fn checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn build<S>(&self, source: &S) -> Result<Index, IndexErr>
    where
        S: ReadBytesFrom + BytesCount + ?Sized,
    {
        if self.checkpoint_interval == 0 {
            return Err(IndexErr::ZeroInterval);
        }

        let t0 = Instant::now();
        let total_bytes = source.bytes_count()?;
        debug!("index build started, {total_bytes} bytes, interval {}", self.checkpoint_interval);

        let mut observer = Checkpoints {
            interval: self.checkpoint_interval,
            entries: Vec::new(),
        };
        let mut anomalies = Vec::<Anomaly>::new();
        let mut anomalies_dropped = 0u64;

        let mut session = DecodeSession::new(source, self.table.clone(), self.keeper);
        while let Some(timed) = session.next_timed(&mut observer)? {
            if let Order::Ambiguous { ticks } = timed.order {
                if anomalies.len() < MAX_ANOMALIES {
                    anomalies.push(Anomaly {
                        ordinal: timed.record.ordinal,
                        byte_offset: timed.record.byte_offset,
                        back_ticks: ticks,
                    });
                } else {
                    anomalies_dropped += 1;
                }
            }
        }

        let end = session.end().unwrap_or(StreamEnd::Eof);
        let total_records = session.next_ordinal();
        let decoded_bytes = match end {
            StreamEnd::Eof => session.offset(),
            StreamEnd::Truncated { offset, .. } => offset,
            StreamEnd::LostSync { offset, .. } => offset,
            StreamEnd::Limit { .. } => session.offset(),
        };

        match end {
            StreamEnd::LostSync { ordinal, offset, tag, .. } => {
                warn!("lost sync at ordinal {ordinal}, offset {offset}, tag 0x{tag:02x}")
            }
            StreamEnd::Truncated { offset, trailing_bytes } => {
                debug!("stream truncated at {offset}, {trailing_bytes} trailing bytes")
            }
            _ => {}
        }

        let stats = session.stats();
        info!(
            "indexed {total_records} records, {} checkpoints, {} corrections, {} ambiguous in {:?}",
            observer.entries.len(),
            stats.corrections,
            stats.ambiguous,
            t0.elapsed()
        );

        Ok(Index {
            entries: observer.entries,
            total_records,
            total_bytes,
            decoded_bytes,
            end,
            stats,
            anomalies,
            anomalies_dropped,
            checkpoint_interval: self.checkpoint_interval,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{decode::LastGood, synth::StreamWriter};

    fn indexer(interval: u64) -> Indexer {
        Indexer::new(Arc::new(TagTable::standard()), TimeKeeper::default()).checkpoint_interval(interval)
    }

    #[test]
    fn every_record_checkpoint() {
        let data = StreamWriter::new()
            .timed(0x01, 10, &[])
            .text(0x20, "abc")
            .timed(0x02, 12, &[0, 0])
            .into_bytes();
        let index = indexer(1).build(&data).unwrap();

        assert_eq!(index.total_records, 3);
        assert_eq!(index.total_bytes, data.len() as u64);
        assert_eq!(index.decoded_bytes, data.len() as u64);
        assert_eq!(index.end, StreamEnd::Eof);

        let offsets: Vec<u64> = index.entries().iter().map(|e| e.byte_offset).collect();
        assert_eq!(offsets, vec![0, 3, 11]);
        assert_eq!(index.entries()[0].state, TimestampState::default());
        assert_eq!(index.entries()[1].state.last_raw_ticks, 10);
        assert_eq!(index.entries()[2].state.absolute_ns, 1);
    }

    #[test]
    fn sparse_checkpoints() {
        let mut w = StreamWriter::new();
        for i in 0..1000u16 {
            w = w.timed(0x01, i, &[]);
        }
        let index = indexer(100).build(&w.into_bytes()).unwrap();
        assert_eq!(index.entries().len(), 10);
        assert_eq!(index.checkpoint_before(0).unwrap().ordinal, 0);
        assert_eq!(index.checkpoint_before(99).unwrap().ordinal, 0);
        assert_eq!(index.checkpoint_before(100).unwrap().ordinal, 100);
        assert_eq!(index.checkpoint_before(5000).unwrap().ordinal, 900);
        assert_eq!(index.checkpoint_before(250).unwrap().byte_offset, 200 * 3);
    }

    #[test]
    fn empty_stream() {
        let index = indexer(8).build(&Vec::new()).unwrap();
        assert_eq!(index.total_records, 0);
        assert!(index.entries().is_empty());
        assert!(index.checkpoint_before(0).is_none());
        assert_eq!(index.end, StreamEnd::Eof);
    }

    #[test]
    fn zero_interval_rejected() {
        assert_eq!(indexer(0).build(&Vec::new()).unwrap_err(), IndexErr::ZeroInterval);
    }

    #[test]
    fn lost_sync_keeps_earlier_entries() {
        let data = StreamWriter::new()
            .timed(0x01, 1, &[])
            .timed(0x01, 2, &[])
            .raw(&[0xFE, 0x01, 0x02])
            .timed(0x01, 3, &[])
            .into_bytes();
        let index = indexer(1).build(&data).unwrap();
        assert_eq!(index.total_records, 2);
        assert_eq!(index.entries().len(), 2);
        assert_eq!(index.decoded_bytes, 6);
        assert_eq!(
            index.end,
            StreamEnd::LostSync {
                ordinal: 2,
                offset: 6,
                tag: 0xFE,
                last_good: Some(LastGood { ordinal: 1, byte_offset: 3 }),
            }
        );
    }

    #[test]
    fn decoded_bytes_cover_pending_text() {
        let data = StreamWriter::new()
            .timed(0x01, 1, &[])
            .raw(&[0x20, b'a', 0x20, b'b', 0xEE])
            .into_bytes();
        let index = indexer(1).build(&data).unwrap();
        assert_eq!(index.total_records, 2);
        assert_eq!(index.decoded_bytes, 7);
        assert_eq!(index.entries()[1].byte_offset, 3);
        assert!(matches!(index.end, StreamEnd::LostSync { ordinal: 2, offset: 7, .. }));
    }

    #[test]
    fn ambiguous_steps_are_collected() {
        let data = StreamWriter::new()
            .timed(0x01, 0x8005, &[])
            .timed(0x01, 0x8009, &[])
            .timed(0x01, 0x1008, &[])
            .into_bytes();
        let index = indexer(1).build(&data).unwrap();
        assert_eq!(index.stats.ambiguous, 1);
        assert_eq!(
            index.anomalies(),
            &[Anomaly { ordinal: 2, byte_offset: 6, back_ticks: 0x7001 }]
        );
    }
}
