use super::{ABuffError, ReadBytesFrom};

/// Размер буфера при чтении файла
pub const READ_BUFF_SIZE: usize = 1024 * 8;

/// Окно чтения поверх источника байтов
///
/// Каждая сессия декодирования имеет собственный курсор,
/// источник при этом разделяется между сессиями
pub struct StreamCursor<'a, S: ReadBytesFrom + ?Sized> {
    source: &'a S,

    /// Прочитанные, но еще не разобранные байты
    buff: Vec<u8>,

    /// Индекс первого не разобранного байта в `buff`
    start: usize,

    /// Смещение в файле, соответствующее `buff[start]`
    offset: u64,

    /// Источник вернул 0 байт
    eof: bool,
}

impl<'a, S: ReadBytesFrom + ?Sized> StreamCursor<'a, S> {
    pub fn new(source: &'a S, offset: u64) -> Self {
        Self {
            source,
            buff: Vec::with_capacity(READ_BUFF_SIZE),
            start: 0,
            offset,
            eof: false,
        }
    }

    /// Смещение первого не разобранного байта
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Доступные для разбора байты
    pub fn available(&self) -> &[u8] {
        &self.buff[self.start..]
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Пометить `count` байт как разобранные
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.buff.len() - self.start);
        self.start += count;
        self.offset += count as u64;
    }

    /// Дочитать следующую порцию данных
    ///
    /// Результат - кол-во добавленных байт, `0` - конец данных
    pub fn fill(&mut self) -> Result<usize, ABuffError> {
        if self.eof {
            return Ok(0);
        }

        // compact
        if self.start > 0 {
            self.buff.drain(..self.start);
            self.start = 0;
        }

        let filled = self.buff.len();
        let read_pos = self.offset + filled as u64;
        self.buff.resize(filled + READ_BUFF_SIZE, 0);

        let reads = self.source.read_from(read_pos, &mut self.buff[filled..]);
        let reads = match reads {
            Ok(reads) => reads as usize,
            Err(err) => {
                self.buff.truncate(filled);
                return Err(err);
            }
        };

        self.buff.truncate(filled + reads);
        if reads == 0 {
            self.eof = true;
        }
        Ok(reads)
    }
}

#[test]
fn cursor_keeps_unconsumed_tail() {
    let data: Vec<u8> = (0..(READ_BUFF_SIZE + 10)).map(|i| (i % 251) as u8).collect();
    let mut cur = StreamCursor::new(&data, 0);

    assert_eq!(cur.fill().unwrap(), READ_BUFF_SIZE);
    cur.consume(READ_BUFF_SIZE - 2);
    assert_eq!(cur.offset(), (READ_BUFF_SIZE - 2) as u64);

    assert_eq!(cur.fill().unwrap(), 10);
    assert_eq!(cur.available().len(), 12);
    assert_eq!(cur.available()[0], data[READ_BUFF_SIZE - 2]);

    cur.consume(12);
    assert_eq!(cur.fill().unwrap(), 0);
    assert!(cur.is_eof());
}

#[test]
fn cursor_starts_at_offset() {
    let data: Vec<u8> = (0u8..100).collect();
    let mut cur = StreamCursor::new(&data, 40);
    cur.fill().unwrap();
    assert_eq!(cur.available()[0], 40);
    assert_eq!(cur.available().len(), 60);
}
