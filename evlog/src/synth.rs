//! Построение потоков для тестов и демонстрации

use rand::Rng;

use crate::record::{TagKind, TagTable};

/// Запись потока в формате регистратора
#[derive(Debug, Clone, Default)]
pub struct StreamWriter {
    buff: Vec<u8>,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self { buff: Vec::new() }
    }

    /// Запись с меткой времени: `raw` (little endian), затем `rest`
    pub fn timed(mut self, tag: u8, raw: u16, rest: &[u8]) -> Self {
        self.buff.push(tag);
        self.buff.extend_from_slice(&raw.to_le_bytes());
        self.buff.extend_from_slice(rest);
        self
    }

    /// Запись без метки времени
    pub fn untimed(mut self, tag: u8, payload: &[u8]) -> Self {
        self.buff.push(tag);
        self.buff.extend_from_slice(payload);
        self
    }

    /// Строка: пары `тег символ`, затем `тег 0`
    pub fn text(mut self, tag: u8, text: &str) -> Self {
        for b in text.bytes().filter(|b| *b != 0) {
            self.buff.push(tag);
            self.buff.push(b);
        }
        self.buff.push(tag);
        self.buff.push(0);
        self
    }

    /// Произвольные байты
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buff.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buff
    }
}

const MESSAGES: [&str; 6] = ["boot", "sd mounted", "gps fix", "low battery", "sample rate 1kHz", "sync"];

/// Генерация правдоподобного потока из `count` записей
///
/// Метки времени растут с разным шагом, иногда соседние метки
/// меняются местами как при задержке прерывания
pub fn generate<R: Rng>(table: &TagTable, count: usize, rng: &mut R) -> Vec<u8> {
    let defs: Vec<_> = table.iter().collect();
    if defs.is_empty() {
        return Vec::new();
    }

    let mut w = StreamWriter::new();
    let mut ticks: u16 = rng.gen();
    let mut i = 0usize;
    while i < count {
        let def = defs[rng.gen_range(0..defs.len())];
        match def.kind {
            TagKind::Fixed { len, timestamp_at: Some(at) } => {
                ticks = ticks.wrapping_add(rng.gen_range(1..2000));
                let inverted = i + 1 < count && rng.gen_ratio(1, 50);
                let first = if inverted { ticks.wrapping_add(rng.gen_range(1..8)) } else { ticks };
                w = w.untimed(def.tag, &timed_payload(len, at, first, rng));
                if inverted {
                    w = w.untimed(def.tag, &timed_payload(len, at, ticks, rng));
                    ticks = first;
                    i += 1;
                }
            }
            TagKind::Fixed { len, timestamp_at: None } => {
                let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
                w = w.untimed(def.tag, &payload);
            }
            TagKind::Text => {
                w = w.text(def.tag, MESSAGES[rng.gen_range(0..MESSAGES.len())]);
            }
        }
        i += 1;
    }
    w.into_bytes()
}

fn timed_payload<R: Rng>(len: usize, at: usize, raw: u16, rng: &mut R) -> Vec<u8> {
    let mut payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    payload[at..at + 2].copy_from_slice(&raw.to_le_bytes());
    payload
}

#[test]
fn text_layout() {
    let bytes = StreamWriter::new().text(0x20, "ok").into_bytes();
    assert_eq!(bytes, vec![0x20, b'o', 0x20, b'k', 0x20, 0]);
}

#[test]
fn generate_is_decodable() {
    use crate::{decode::{DecodeSession, StreamEnd}, timekeeper::TimeKeeper};
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Arc;

    let table = TagTable::standard();
    let mut rng = StdRng::seed_from_u64(7);
    let data = generate(&table, 2000, &mut rng);

    let mut session = DecodeSession::new(&data, Arc::new(table), TimeKeeper::default());
    let count = session.by_ref().map(|r| r.unwrap()).count();
    assert_eq!(count, 2000);
    assert_eq!(session.end(), Some(StreamEnd::Eof));
    assert!(session.stats().corrections > 0);
}
