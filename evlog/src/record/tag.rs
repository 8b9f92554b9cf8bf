use std::fmt;

use serde::{Deserialize, Serialize};

/// Способ определения длины записи по тегу
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TagKind {
    /// Фиксированная длина данных после байта тега
    Fixed {
        len: usize,

        /// Смещение 16-битной метки времени (little endian) внутри данных
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp_at: Option<usize>,
    },

    /// Строка, завершаемая нулем: каждый символ передается парой `тег байт`
    Text,
}

/// Описание тега
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDef {
    pub tag: u8,
    pub name: String,
    #[serde(flatten)]
    pub kind: TagKind,
}

impl TagDef {
    pub fn fixed(tag: u8, name: &str, len: usize) -> Self {
        Self { tag, name: name.to_string(), kind: TagKind::Fixed { len, timestamp_at: None } }
    }

    pub fn timed(tag: u8, name: &str, len: usize, timestamp_at: usize) -> Self {
        Self { tag, name: name.to_string(), kind: TagKind::Fixed { len, timestamp_at: Some(timestamp_at) } }
    }

    pub fn text(tag: u8, name: &str) -> Self {
        Self { tag, name: name.to_string(), kind: TagKind::Text }
    }

    /// Содержит ли запись метку времени
    pub fn is_timed(&self) -> bool {
        matches!(self.kind, TagKind::Fixed { timestamp_at: Some(_), .. })
    }
}

/// Ошибка построения таблицы тегов
#[derive(Debug, Clone, PartialEq)]
pub enum TagTableErr {
    Duplicate { tag: u8 },
    TimestampOutside { tag: u8, len: usize, timestamp_at: usize },
    TooLong { tag: u8, len: usize },
}

impl fmt::Display for TagTableErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { tag } => write!(f, "tag 0x{tag:02x} defined twice"),
            Self::TimestampOutside { tag, len, timestamp_at } => write!(
                f,
                "tag 0x{tag:02x}: timestamp at {timestamp_at} does not fit payload of {len} bytes"
            ),
            Self::TooLong { tag, len } => write!(f, "tag 0x{tag:02x}: payload of {len} bytes exceeds {MAX_FIXED_LEN}"),
        }
    }
}

/// Максимальная длина данных записи фиксированной длины
pub const MAX_FIXED_LEN: usize = u16::MAX as usize;

/// Статическая таблица тегов
///
/// Длина записи целиком определяется тегом, префикса длины в потоке нет
#[derive(Debug, Clone)]
pub struct TagTable {
    defs: Vec<Option<TagDef>>,
}

impl TagTable {
    pub fn new<I: IntoIterator<Item = TagDef>>(defs: I) -> Result<Self, TagTableErr> {
        let mut table: Vec<Option<TagDef>> = vec![None; 256];
        for def in defs {
            if let TagKind::Fixed { len, timestamp_at } = def.kind {
                if len > MAX_FIXED_LEN {
                    return Err(TagTableErr::TooLong { tag: def.tag, len });
                }
                if let Some(at) = timestamp_at {
                    if at.checked_add(2).map_or(true, |ts_end| ts_end > len) {
                        return Err(TagTableErr::TimestampOutside { tag: def.tag, len, timestamp_at: at });
                    }
                }
            }
            let slot = &mut table[def.tag as usize];
            if slot.is_some() {
                return Err(TagTableErr::Duplicate { tag: def.tag });
            }
            *slot = Some(def);
        }
        Ok(Self { defs: table })
    }

    /// Таблица по умолчанию
    pub fn standard() -> Self {
        let defs = vec![
            TagDef::timed(0x01, "tick", 2, 0),
            TagDef::timed(0x02, "adc", 4, 0),
            TagDef::timed(0x03, "gpio", 3, 0),
            TagDef::timed(0x04, "can", 12, 0),
            TagDef::fixed(0x10, "temp", 2),
            TagDef::fixed(0x11, "gps", 8),
            TagDef::fixed(0x12, "batt", 1),
            TagDef::text(0x20, "text"),
            TagDef::text(0x21, "event"),
        ];
        Self { defs: Self::slots(defs) }
    }

    fn slots(defs: Vec<TagDef>) -> Vec<Option<TagDef>> {
        let mut table: Vec<Option<TagDef>> = vec![None; 256];
        for def in defs {
            let idx = def.tag as usize;
            table[idx] = Some(def);
        }
        table
    }

    pub fn get(&self, tag: u8) -> Option<&TagDef> {
        self.defs[tag as usize].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagDef> {
        self.defs.iter().filter_map(|d| d.as_ref())
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[test]
fn standard_table_lookup() {
    let t = TagTable::standard();
    assert!(t.get(0x02).unwrap().is_timed());
    assert!(!t.get(0x10).unwrap().is_timed());
    assert_eq!(t.get(0x20).unwrap().kind, TagKind::Text);
    assert!(t.get(0xFF).is_none());
    assert_eq!(t.iter().count(), 9);
}

#[test]
fn table_rejects_bad_defs() {
    let dup = TagTable::new(vec![TagDef::fixed(1, "a", 1), TagDef::fixed(1, "b", 2)]);
    assert_eq!(dup.unwrap_err(), TagTableErr::Duplicate { tag: 1 });

    let outside = TagTable::new(vec![TagDef::timed(2, "t", 3, 2)]);
    assert!(matches!(outside, Err(TagTableErr::TimestampOutside { tag: 2, .. })));
}

#[test]
fn table_rejects_huge_lengths() {
    let huge = TagTable::new(vec![TagDef::fixed(3, "h", usize::MAX)]);
    assert_eq!(huge.unwrap_err(), TagTableErr::TooLong { tag: 3, len: usize::MAX });

    let far = TagTable::new(vec![TagDef::timed(4, "f", 8, usize::MAX)]);
    assert!(matches!(far, Err(TagTableErr::TimestampOutside { tag: 4, .. })));

    assert!(TagTable::new(vec![TagDef::timed(5, "ok", MAX_FIXED_LEN, MAX_FIXED_LEN - 2)]).is_ok());
}

#[test]
fn tag_def_from_json() {
    let defs: Vec<TagDef> = serde_json::from_str(
        r#"[
            {"tag": 1, "name": "tick", "kind": "fixed", "len": 2, "timestamp_at": 0},
            {"tag": 16, "name": "temp", "kind": "fixed", "len": 2},
            {"tag": 32, "name": "text", "kind": "text"}
        ]"#,
    )
    .unwrap();
    let t = TagTable::new(defs).unwrap();
    assert!(t.get(1).unwrap().is_timed());
    assert_eq!(t.get(16).unwrap().kind, TagKind::Fixed { len: 2, timestamp_at: None });
    assert_eq!(t.get(32).unwrap().kind, TagKind::Text);
}
