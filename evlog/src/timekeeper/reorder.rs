use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::Order;
use crate::record::Record;

/// Запись с восстановленным временем
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedRecord {
    pub record: Record,

    /// Абсолютное время, нс
    pub absolute_ns: u64,

    /// Положение в выдаче
    pub order: Order,
}

/// Счетчики коррекции порядка
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderStats {
    /// Кол-во перестановок соседних записей
    pub corrections: u64,

    /// Максимальный исправленный шаг назад, тики
    pub max_corrected_ticks: u16,

    /// Шаги назад, которые не удалось исправить перестановкой
    pub clamped: u64,

    /// Шаги назад больше окна
    pub ambiguous: u64,
}

impl ReorderStats {
    pub fn observe(&mut self, order: Order) {
        match order {
            Order::InOrder => {}
            Order::SwapWithPrevious { ticks } => {
                self.corrections += 1;
                self.max_corrected_ticks = self.max_corrected_ticks.max(ticks);
            }
            Order::Clamped { .. } => self.clamped += 1,
            Order::Ambiguous { .. } => self.ambiguous += 1,
        }
    }

    pub fn of<'a, I: IntoIterator<Item = &'a TimedRecord>>(records: I) -> Self {
        records.into_iter().fold(Self::default(), |mut stats, r| {
            stats.observe(r.order);
            stats
        })
    }
}

/// Очередь выдачи глубиной 2
///
/// Запись удерживается до прихода следующей: если следующая отстает
/// по времени, она выдается первой
#[derive(Debug, Default)]
pub struct ReorderQueue {
    pending: Option<TimedRecord>,
}

impl ReorderQueue {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Добавить запись, готовые к выдаче записи дописываются в `out`
    pub fn push(&mut self, record: TimedRecord, out: &mut VecDeque<TimedRecord>) {
        match record.order {
            Order::SwapWithPrevious { .. } => {
                out.push_back(record);
                if let Some(prev) = self.pending.take() {
                    out.push_back(prev);
                }
            }
            _ => {
                if let Some(prev) = self.pending.replace(record) {
                    out.push_back(prev);
                }
            }
        }
    }

    /// Выдать удерживаемую запись
    pub fn flush(&mut self, out: &mut VecDeque<TimedRecord>) {
        if let Some(prev) = self.pending.take() {
            out.push_back(prev);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::RecordKind;

    fn timed(ordinal: u64, absolute_ns: u64, order: Order) -> TimedRecord {
        TimedRecord {
            record: Record {
                ordinal,
                tag: 1,
                kind: RecordKind::Fixed,
                payload: vec![],
                byte_offset: ordinal * 3,
                byte_length: 3,
                raw_ticks: Some(0),
            },
            absolute_ns,
            order,
        }
    }

    fn ordinals(out: &VecDeque<TimedRecord>) -> Vec<u64> {
        out.iter().map(|r| r.record.ordinal).collect()
    }

    #[test]
    fn holds_one_record() {
        let mut q = ReorderQueue::new();
        let mut out = VecDeque::new();
        q.push(timed(0, 0, Order::InOrder), &mut out);
        assert!(out.is_empty());
        q.push(timed(1, 10, Order::InOrder), &mut out);
        assert_eq!(ordinals(&out), vec![0]);
        q.flush(&mut out);
        assert_eq!(ordinals(&out), vec![0, 1]);
    }

    #[test]
    fn swap_emits_later_first() {
        let mut q = ReorderQueue::new();
        let mut out = VecDeque::new();
        q.push(timed(0, 0, Order::InOrder), &mut out);
        q.push(timed(1, 8000, Order::InOrder), &mut out);
        q.push(timed(2, 6000, Order::SwapWithPrevious { ticks: 1 }), &mut out);
        q.flush(&mut out);
        assert_eq!(ordinals(&out), vec![0, 2, 1]);

        let stats = ReorderStats::of(out.iter());
        assert_eq!(stats.corrections, 1);
        assert_eq!(stats.max_corrected_ticks, 1);
    }

    #[test]
    fn swap_without_pending_emits_directly() {
        let mut q = ReorderQueue::new();
        let mut out = VecDeque::new();
        q.push(timed(5, 100, Order::SwapWithPrevious { ticks: 3 }), &mut out);
        assert_eq!(ordinals(&out), vec![5]);
        q.flush(&mut out);
        assert_eq!(out.len(), 1);
    }
}
