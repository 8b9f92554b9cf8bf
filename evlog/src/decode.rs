use std::{collections::VecDeque, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    bbuff::{ABuffError, ReadBytesFrom, StreamCursor},
    record::{Decoded, Record, RecordParser, TagTable},
    timekeeper::{ReorderQueue, ReorderStats, TimeKeeper, TimedRecord, TimestampState},
};

/// Ошибка декодирования
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeErr {
    Buff(ABuffError),
}

impl From<ABuffError> for DecodeErr {
    fn from(value: ABuffError) -> Self {
        Self::Buff(value)
    }
}

impl fmt::Display for DecodeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buff(err) => write!(f, "decode failed: {err}"),
        }
    }
}

/// Последняя успешно декодированная запись
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastGood {
    pub ordinal: u64,
    pub byte_offset: u64,
}

/// Причина остановки декодирования
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEnd {
    /// Данные закончились ровно на границе записи
    Eof,

    /// Последняя запись обрезана концом файла
    Truncated { offset: u64, trailing_bytes: u64 },

    /// Тег не из таблицы, дальнейший разбор не возможен
    LostSync {
        ordinal: u64,
        offset: u64,
        tag: u8,
        last_good: Option<LastGood>,
    },

    /// Достигнут заданный предел номеров
    Limit { ordinal: u64 },
}

/// Точка начала декодирования
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStart {
    pub ordinal: u64,
    pub offset: u64,
    pub state: TimestampState,
}

/// Наблюдение за разобранными записями
pub trait DecodeObserver {
    /// Вызывается для каждой записи в порядке потока
    ///
    /// `before` - состояние до обработки записи
    fn record_parsed(&mut self, record: &Record, before: &TimestampState);
}

impl DecodeObserver for () {
    fn record_parsed(&mut self, _record: &Record, _before: &TimestampState) {}
}

/// Сессия последовательного декодирования
///
/// Выдает записи в порядке выдачи (после коррекции), а не в порядке потока
pub struct DecodeSession<'a, S: ReadBytesFrom + ?Sized> {
    cursor: StreamCursor<'a, S>,
    parser: RecordParser,
    keeper: TimeKeeper,
    state: TimestampState,
    next_ordinal: u64,
    limit: Option<u64>,
    queue: ReorderQueue,
    ready: VecDeque<TimedRecord>,
    end: Option<StreamEnd>,
    last_good: Option<LastGood>,
    stats: ReorderStats,
}

impl<'a, S: ReadBytesFrom + ?Sized> DecodeSession<'a, S> {
    /// Декодирование с начала потока
    pub fn new(source: &'a S, table: Arc<TagTable>, keeper: TimeKeeper) -> Self {
        Self::resume(source, table, keeper, SessionStart::default())
    }

    /// Декодирование с контрольной точки
    pub fn resume(source: &'a S, table: Arc<TagTable>, keeper: TimeKeeper, start: SessionStart) -> Self {
        Self {
            cursor: StreamCursor::new(source, start.offset),
            parser: RecordParser::new(table),
            keeper,
            state: start.state,
            next_ordinal: start.ordinal,
            limit: None,
            queue: ReorderQueue::new(),
            ready: VecDeque::new(),
            end: None,
            last_good: None,
            stats: ReorderStats::default(),
        }
    }

    /// Не разбирать записи с номером `limit` и больше
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Причина остановки, если декодирование закончено
    pub fn end(&self) -> Option<StreamEnd> {
        self.end
    }

    pub fn stats(&self) -> ReorderStats {
        self.stats
    }

    pub fn state(&self) -> &TimestampState {
        &self.state
    }

    /// Номер следующей записи потока
    pub fn next_ordinal(&self) -> u64 {
        self.next_ordinal
    }

    /// Смещение сразу за последней разобранной записью
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    pub fn last_good(&self) -> Option<LastGood> {
        self.last_good
    }

    /// Следующая запись в порядке выдачи
    pub fn next_timed<O: DecodeObserver>(&mut self, observer: &mut O) -> Result<Option<TimedRecord>, DecodeErr> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Ok(Some(record));
            }
            if self.end.is_some() {
                return Ok(None);
            }
            match self.parse_next()? {
                Some(record) => {
                    let before = self.state;
                    let adv = self.keeper.advance(&before, &record);
                    observer.record_parsed(&record, &before);
                    self.state = adv.state;
                    self.stats.observe(adv.order);
                    self.queue.push(
                        TimedRecord {
                            record,
                            absolute_ns: adv.absolute_ns,
                            order: adv.order,
                        },
                        &mut self.ready,
                    );
                }
                None => self.queue.flush(&mut self.ready),
            }
        }
    }

    /// Разбор следующей записи в порядке потока
    ///
    /// `None` - разбор закончен, причина в `self.end`
    fn parse_next(&mut self) -> Result<Option<Record>, DecodeErr> {
        loop {
            if let Some(limit) = self.limit {
                if self.next_ordinal >= limit {
                    self.end = Some(StreamEnd::Limit { ordinal: limit });
                    return Ok(None);
                }
            }

            let offset = self.cursor.offset();
            match self.parser.decode_one(self.cursor.available(), offset, self.next_ordinal) {
                Ok(Decoded::Complete { record, consumed }) => {
                    self.cursor.consume(consumed);
                    self.next_ordinal += 1;
                    self.last_good = Some(LastGood {
                        ordinal: record.ordinal,
                        byte_offset: record.byte_offset,
                    });
                    return Ok(Some(record));
                }
                Ok(Decoded::Pending { consumed }) => {
                    self.cursor.consume(consumed);
                }
                Ok(Decoded::NeedMoreData) => {
                    if self.cursor.fill()? == 0 {
                        self.end = Some(self.end_of_data());
                        return Ok(None);
                    }
                }
                Err(lost) => {
                    self.end = Some(StreamEnd::LostSync {
                        ordinal: self.next_ordinal,
                        offset: lost.offset,
                        tag: lost.tag,
                        last_good: self.last_good,
                    });
                    return Ok(None);
                }
            }
        }
    }

    fn end_of_data(&self) -> StreamEnd {
        let tail = self.cursor.available().len() as u64;
        match self.parser.pending_offset() {
            Some(start) => StreamEnd::Truncated {
                offset: start,
                trailing_bytes: self.cursor.offset() - start + tail,
            },
            None if tail > 0 => StreamEnd::Truncated {
                offset: self.cursor.offset(),
                trailing_bytes: tail,
            },
            None => StreamEnd::Eof,
        }
    }
}

impl<'a, S: ReadBytesFrom + ?Sized> Iterator for DecodeSession<'a, S> {
    type Item = Result<TimedRecord, DecodeErr>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_timed(&mut ()).transpose()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{record::RecordKind, synth::StreamWriter, timekeeper::Order};

    fn decode_all(data: &Vec<u8>) -> (Vec<TimedRecord>, Option<StreamEnd>, ReorderStats) {
        let mut session = DecodeSession::new(data, Arc::new(TagTable::standard()), TimeKeeper::default());
        let records: Vec<TimedRecord> = session.by_ref().collect::<Result<_, _>>().unwrap();
        (records, session.end(), session.stats())
    }

    fn ordinals(records: &[TimedRecord]) -> Vec<u64> {
        records.iter().map(|r| r.record.ordinal).collect()
    }

    #[test]
    fn local_reorder_example() {
        let data = StreamWriter::new()
            .timed(0x01, 0x8005, &[])
            .timed(0x01, 0x8009, &[])
            .timed(0x01, 0x8008, &[])
            .into_bytes();
        let (records, end, stats) = decode_all(&data);

        assert_eq!(ordinals(&records), vec![0, 2, 1]);
        assert_eq!(stats.corrections, 1);
        assert_eq!(stats.max_corrected_ticks, 1);
        assert_eq!(end, Some(StreamEnd::Eof));

        let times: Vec<u64> = records.iter().map(|r| r.absolute_ns).collect();
        assert_eq!(times, vec![0, 6000, 8000]);
    }

    #[test]
    fn ambiguous_example() {
        let data = StreamWriter::new()
            .timed(0x01, 0x8005, &[])
            .timed(0x01, 0x8009, &[])
            .timed(0x01, 0x1008, &[])
            .into_bytes();
        let (records, _, stats) = decode_all(&data);

        assert_eq!(ordinals(&records), vec![0, 1, 2]);
        assert_eq!(records[2].order, Order::Ambiguous { ticks: 0x7001 });
        assert_eq!(stats.ambiguous, 1);
        assert_eq!(stats.corrections, 0);
    }

    #[test]
    fn untimed_sequencing() {
        let data = StreamWriter::new()
            .timed(0x01, 100, &[])
            .untimed(0x10, &[1, 2])
            .untimed(0x12, &[3])
            .timed(0x01, 110, &[])
            .into_bytes();
        let (records, _, _) = decode_all(&data);
        let times: Vec<u64> = records.iter().map(|r| r.absolute_ns).collect();
        assert_eq!(times, vec![0, 1, 2, 2 + 20_000]);
    }

    #[test]
    fn emitted_time_non_decreasing() {
        let data = StreamWriter::new()
            .timed(0x02, 10, &[0, 0])
            .text(0x20, "boot")
            .timed(0x02, 20, &[0, 0])
            .timed(0x02, 18, &[0, 0])
            .untimed(0x12, &[99])
            .timed(0x03, 15, &[1])
            .timed(0x03, 40, &[1])
            .into_bytes();
        let (records, _, stats) = decode_all(&data);
        assert_eq!(records.len(), 7);
        assert!(records.windows(2).all(|w| w[0].absolute_ns <= w[1].absolute_ns));
        assert_eq!(stats.corrections, 1);
        assert_eq!(stats.clamped, 1);
    }

    #[test]
    fn records_are_contiguous() {
        let data = StreamWriter::new()
            .text(0x21, "a longer event text")
            .timed(0x04, 7, &[0; 10])
            .untimed(0x11, &[0; 8])
            .text(0x20, "")
            .into_bytes();
        let (records, end, _) = decode_all(&data);
        let mut offset = 0;
        for r in records.iter() {
            assert_eq!(r.record.byte_offset, offset);
            offset = r.record.end_offset();
        }
        assert_eq!(offset, data.len() as u64);
        assert_eq!(end, Some(StreamEnd::Eof));
    }

    #[test]
    fn truncated_tail_is_not_an_error() {
        let mut data = StreamWriter::new().timed(0x01, 1, &[]).timed(0x01, 2, &[]).into_bytes();
        data.extend_from_slice(&[0x02, 0x00]);
        let (records, end, _) = decode_all(&data);
        assert_eq!(records.len(), 2);
        assert_eq!(end, Some(StreamEnd::Truncated { offset: 6, trailing_bytes: 2 }));
    }

    #[test]
    fn truncated_inside_text() {
        let mut data = StreamWriter::new().timed(0x01, 1, &[]).into_bytes();
        data.extend_from_slice(&[0x20, b'a', 0x20, b'b', 0x20]);
        let (records, end, _) = decode_all(&data);
        assert_eq!(records.len(), 1);
        assert_eq!(end, Some(StreamEnd::Truncated { offset: 3, trailing_bytes: 5 }));
    }

    #[test]
    fn lost_sync_at_exact_offset() {
        let mut data = StreamWriter::new()
            .timed(0x01, 1, &[])
            .untimed(0x10, &[5, 6])
            .timed(0x02, 3, &[7, 8])
            .into_bytes();
        let bad = data.len() as u64;
        data.push(0xEE);
        data.extend(StreamWriter::new().timed(0x01, 4, &[]).into_bytes());

        let (records, end, _) = decode_all(&data);
        assert_eq!(records.len(), 3);
        assert_eq!(
            end,
            Some(StreamEnd::LostSync {
                ordinal: 3,
                offset: bad,
                tag: 0xEE,
                last_good: Some(LastGood { ordinal: 2, byte_offset: 6 }),
            })
        );
    }

    #[test]
    fn text_fragment_then_bad_tag() {
        let mut data = StreamWriter::new().timed(0x01, 1, &[]).into_bytes();
        data.extend_from_slice(&[0x20, b'a', 0x20, b'b', 0xEE]);

        let (records, end, _) = decode_all(&data);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].record.kind, RecordKind::Text { terminated: false });
        assert_eq!(records[0].record.end_offset(), records[1].record.byte_offset);
        assert_eq!(records[1].record.end_offset(), 7);
        assert_eq!(
            end,
            Some(StreamEnd::LostSync {
                ordinal: 2,
                offset: 7,
                tag: 0xEE,
                last_good: Some(LastGood { ordinal: 1, byte_offset: 3 }),
            })
        );
    }

    #[test]
    fn limit_stops_parsing() {
        let data = StreamWriter::new()
            .timed(0x01, 1, &[])
            .timed(0x01, 2, &[])
            .timed(0x01, 3, &[])
            .into_bytes();
        let mut session =
            DecodeSession::new(&data, Arc::new(TagTable::standard()), TimeKeeper::default()).with_limit(2);
        let records: Vec<TimedRecord> = session.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(session.end(), Some(StreamEnd::Limit { ordinal: 2 }));
    }

    #[test]
    fn large_stream_crosses_read_buffer() {
        let mut w = StreamWriter::new();
        for i in 0..5000u32 {
            w = w.timed(0x04, (i * 3) as u16, &[0xAB; 10]).text(0x20, "x");
        }
        let data = w.into_bytes();
        let (records, end, _) = decode_all(&data);
        assert_eq!(records.len(), 10_000);
        assert_eq!(end, Some(StreamEnd::Eof));
        assert!(records.iter().enumerate().all(|(i, r)| r.record.ordinal == i as u64));
    }
}
