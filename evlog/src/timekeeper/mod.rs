use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Сохраняемое состояние
mod state;
pub use state::*;

/// Очередь перестановки соседних записей
mod reorder;
pub use reorder::*;

/// Длительность одного тика, нс
pub const TICK_NS: u64 = 2000;

/// Период 16-битного счетчика в тиках
pub const TICKS_PERIOD: u32 = 1 << 16;

/// Максимальный шаг назад (в тиках), который считается задержкой прерывания
pub const REORDER_WINDOW_TICKS: u16 = 4096;

/// Параметры восстановления времени
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConfig {
    #[serde(default = "TimeConfig::default_tick_ns")]
    pub tick_ns: u64,

    #[serde(default = "TimeConfig::default_reorder_window")]
    pub reorder_window_ticks: u16,
}

impl TimeConfig {
    fn default_tick_ns() -> u64 {
        TICK_NS
    }
    fn default_reorder_window() -> u16 {
        REORDER_WINDOW_TICKS
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            tick_ns: TICK_NS,
            reorder_window_ticks: REORDER_WINDOW_TICKS,
        }
    }
}

/// Как запись должна быть выдана относительно соседей
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// В порядке потока
    InOrder,

    /// Метка отстает от предыдущей на `ticks` в пределах окна,
    /// запись выдается перед предыдущей
    SwapWithPrevious { ticks: u16 },

    /// Метка отстает на `ticks` в пределах окна, но предыдущая запись
    /// не может быть переставлена; время удерживается на текущем значении
    Clamped { ticks: u16 },

    /// Шаг назад на `ticks` превышает окно, время посчитано как переход
    /// через ноль, порядок не меняется
    Ambiguous { ticks: u16 },
}

/// Результат шага восстановления времени
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub state: TimestampState,
    pub absolute_ns: u64,
    pub order: Order,
}

/// Восстановление абсолютного времени по 16-битным меткам
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeKeeper {
    config: TimeConfig,
}

impl TimeKeeper {
    pub fn new(config: TimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> TimeConfig {
        self.config
    }

    /// Вычисляет время записи и новое состояние
    pub fn advance(&self, state: &TimestampState, record: &Record) -> Advance {
        match record.raw_ticks {
            None => self.untimed(state),
            Some(raw) => self.timed(state, raw),
        }
    }

    fn untimed(&self, state: &TimestampState) -> Advance {
        let absolute_ns = state.absolute_ns + 1;
        Advance {
            state: TimestampState {
                absolute_ns,
                untimed_counter: state.untimed_counter + 1,
                swap_candidate: false,
                ..*state
            },
            absolute_ns,
            order: Order::InOrder,
        }
    }

    fn timed(&self, state: &TimestampState, raw: u16) -> Advance {
        if !state.anchored {
            return self.anchor(state, raw, state.absolute_ns, Order::InOrder);
        }

        let delta = raw.wrapping_sub(state.last_raw_ticks) as u32;
        if delta < TICKS_PERIOD / 2 {
            let absolute_ns = state.absolute_ns + delta as u64 * self.config.tick_ns;
            return self.anchor(state, raw, absolute_ns, Order::InOrder);
        }

        let back = (TICKS_PERIOD - delta) as u16;
        if back > self.config.reorder_window_ticks {
            let absolute_ns = state.absolute_ns + delta as u64 * self.config.tick_ns;
            return self.anchor(state, raw, absolute_ns, Order::Ambiguous { ticks: back });
        }

        // опорная точка не сдвигается: следующие дельты считаются от более поздней метки
        let next = TimestampState {
            swap_candidate: false,
            ..*state
        };
        if state.swap_candidate {
            let absolute_ns = state
                .absolute_ns
                .saturating_sub(back as u64 * self.config.tick_ns)
                .max(state.floor_ns);
            Advance {
                state: next,
                absolute_ns,
                order: Order::SwapWithPrevious { ticks: back },
            }
        } else {
            Advance {
                state: next,
                absolute_ns: state.absolute_ns,
                order: Order::Clamped { ticks: back },
            }
        }
    }

    fn anchor(&self, state: &TimestampState, raw: u16, absolute_ns: u64, order: Order) -> Advance {
        Advance {
            state: TimestampState {
                last_raw_ticks: raw,
                absolute_ns,
                untimed_counter: 0,
                anchored: true,
                swap_candidate: true,
                floor_ns: state.absolute_ns,
            },
            absolute_ns,
            order,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::RecordKind;

    fn rec(raw: Option<u16>) -> Record {
        Record {
            ordinal: 0,
            tag: 1,
            kind: RecordKind::Fixed,
            payload: vec![],
            byte_offset: 0,
            byte_length: 3,
            raw_ticks: raw,
        }
    }

    #[test]
    fn first_timestamp_starts_at_zero() {
        let tk = TimeKeeper::default();
        let adv = tk.advance(&TimestampState::default(), &rec(Some(0xBEEF)));
        assert_eq!(adv.absolute_ns, 0);
        assert_eq!(adv.state.last_raw_ticks, 0xBEEF);
        assert!(adv.state.anchored);
    }

    #[test]
    fn untimed_before_first_anchor() {
        let tk = TimeKeeper::default();
        let u1 = tk.advance(&TimestampState::default(), &rec(None));
        let u2 = tk.advance(&u1.state, &rec(None));
        assert_eq!((u1.absolute_ns, u2.absolute_ns), (1, 2));
        assert!(!u2.state.anchored);

        // первая метка продолжает текущее время, а не сбрасывает его в 0
        let a = tk.advance(&u2.state, &rec(Some(0x4000)));
        assert_eq!(a.absolute_ns, 2);
        assert_eq!(a.order, Order::InOrder);
        assert!(a.state.anchored);

        let b = tk.advance(&a.state, &rec(Some(0x4001)));
        assert_eq!(b.absolute_ns, 2 + TICK_NS);
    }

    #[test]
    fn wraparound_delta() {
        let tk = TimeKeeper::default();
        let state = TimestampState {
            last_raw_ticks: 0xFFF0,
            absolute_ns: 1_000_000,
            anchored: true,
            ..Default::default()
        };
        let adv = tk.advance(&state, &rec(Some(0x0010)));
        assert_eq!(adv.absolute_ns, 1_000_000 + 64_000);
        assert_eq!(adv.order, Order::InOrder);
        assert_eq!(adv.state.last_raw_ticks, 0x0010);
    }

    #[test]
    fn untimed_records_bump_one_ns() {
        let tk = TimeKeeper::default();
        let s0 = TimestampState::default();
        let a = tk.advance(&s0, &rec(Some(100)));
        let t = a.absolute_ns;
        let u1 = tk.advance(&a.state, &rec(None));
        let u2 = tk.advance(&u1.state, &rec(None));
        assert_eq!(u1.absolute_ns, t + 1);
        assert_eq!(u2.absolute_ns, t + 2);
        assert_eq!(u2.state.untimed_counter, 2);
        assert_eq!(u2.state.last_raw_ticks, 100);

        let b = tk.advance(&u2.state, &rec(Some(110)));
        assert_eq!(b.absolute_ns, t + 2 + 20_000);
        assert_eq!(b.state.untimed_counter, 0);
    }

    #[test]
    fn small_backward_step_swaps() {
        let tk = TimeKeeper::default();
        let a = tk.advance(&TimestampState::default(), &rec(Some(0x8005)));
        let b = tk.advance(&a.state, &rec(Some(0x8009)));
        let c = tk.advance(&b.state, &rec(Some(0x8008)));

        assert_eq!(b.absolute_ns, 8000);
        assert_eq!(c.order, Order::SwapWithPrevious { ticks: 1 });
        assert_eq!(c.absolute_ns, 6000);
        assert_eq!(c.state.last_raw_ticks, 0x8009);
        assert_eq!(c.state.absolute_ns, 8000);

        let d = tk.advance(&c.state, &rec(Some(0x800A)));
        assert_eq!(d.absolute_ns, 10_000);
    }

    #[test]
    fn swapped_time_never_precedes_floor() {
        let tk = TimeKeeper::default();
        let a = tk.advance(&TimestampState::default(), &rec(Some(0x8005)));
        let b = tk.advance(&a.state, &rec(Some(0x8009)));
        let c = tk.advance(&b.state, &rec(Some(0x8001)));
        assert_eq!(c.order, Order::SwapWithPrevious { ticks: 8 });
        assert_eq!(c.absolute_ns, a.absolute_ns);
    }

    #[test]
    fn backward_after_untimed_is_clamped() {
        let tk = TimeKeeper::default();
        let a = tk.advance(&TimestampState::default(), &rec(Some(500)));
        let u = tk.advance(&a.state, &rec(None));
        let c = tk.advance(&u.state, &rec(Some(498)));
        assert_eq!(c.order, Order::Clamped { ticks: 2 });
        assert_eq!(c.absolute_ns, u.absolute_ns);
    }

    #[test]
    fn large_backward_step_is_ambiguous() {
        let tk = TimeKeeper::default();
        let a = tk.advance(&TimestampState::default(), &rec(Some(0x8009)));
        let c = tk.advance(&a.state, &rec(Some(0x1008)));
        assert_eq!(c.order, Order::Ambiguous { ticks: 0x7001 });
        assert_eq!(c.absolute_ns, 0x8FFF * TICK_NS);
        assert_eq!(c.state.last_raw_ticks, 0x1008);
    }

    #[test]
    fn reorder_window_is_configurable() {
        let tk = TimeKeeper::new(TimeConfig { tick_ns: TICK_NS, reorder_window_ticks: 2 });
        let a = tk.advance(&TimestampState::default(), &rec(Some(100)));
        let c = tk.advance(&a.state, &rec(Some(97)));
        assert_eq!(c.order, Order::Ambiguous { ticks: 3 });
    }
}
