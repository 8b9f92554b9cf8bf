use crate::record::{Record, RecordKind, TagKind, TagTable};

/// Текстовое представление записи
///
/// Разбирается только общая структура (тег/метка/данные), смысл
/// конкретных полей не интерпретируется
pub fn render(table: &TagTable, record: &Record) -> String {
    let name = match table.get(record.tag) {
        Some(def) => def.name.clone(),
        None => format!("tag 0x{:02x}", record.tag),
    };

    match record.kind {
        RecordKind::Text { terminated } => {
            let text = String::from_utf8_lossy(&record.payload);
            if terminated {
                format!("{name} {text:?}")
            } else {
                format!("{name} {text:?}…")
            }
        }
        RecordKind::Fixed => match record.raw_ticks {
            Some(raw) => {
                let rest = timestamp_at(table, record)
                    .map(|at| {
                        let mut rest = record.payload.clone();
                        rest.drain(at..at + 2);
                        rest
                    })
                    .unwrap_or_default();
                if rest.is_empty() {
                    format!("{name} ts=0x{raw:04x}")
                } else {
                    format!("{name} ts=0x{raw:04x} {}", hex::encode(rest))
                }
            }
            None if record.payload.is_empty() => name,
            None => format!("{name} {}", hex::encode(&record.payload)),
        },
    }
}

fn timestamp_at(table: &TagTable, record: &Record) -> Option<usize> {
    match table.get(record.tag)?.kind {
        TagKind::Fixed { timestamp_at, len } if record.payload.len() == len => timestamp_at,
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::{decode::DecodeSession, synth::StreamWriter, timekeeper::TimeKeeper};

    fn rendered(data: Vec<u8>) -> Vec<String> {
        let table = Arc::new(TagTable::standard());
        DecodeSession::new(&data, table.clone(), TimeKeeper::default())
            .map(|r| render(&table, &r.unwrap().record))
            .collect()
    }

    #[test]
    fn render_fixed_and_text() {
        let lines = rendered(
            StreamWriter::new()
                .timed(0x02, 0x8005, &[0x34, 0x12])
                .untimed(0x12, &[0x5a])
                .text(0x21, "gps fix")
                .timed(0x01, 0x0001, &[])
                .into_bytes(),
        );
        assert_eq!(
            lines,
            vec![
                "adc ts=0x8005 3412".to_string(),
                "batt 5a".to_string(),
                "event \"gps fix\"".to_string(),
                "tick ts=0x0001".to_string(),
            ]
        );
    }

    #[test]
    fn render_unterminated_text() {
        let lines = rendered(StreamWriter::new().raw(&[0x20, b'o', 0x20, b'k']).untimed(0x12, &[1]).into_bytes());
        assert_eq!(lines[0], "text \"ok\"…");
    }
}
