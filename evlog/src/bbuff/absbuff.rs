use std::{fmt, fs::{File, OpenOptions}, path::{Path, PathBuf}};

/// Ошибка при работе с источником байтов
#[derive(Debug, Clone, PartialEq)]
pub enum ABuffError {
    IO {
        message: String,
        os_error: Option<i32>,
    },
    /// Позиция чтения за пределами адресуемой памяти
    PositionOverflow {
        position: u64,
    },
}

impl From<std::io::Error> for ABuffError {
    fn from(value: std::io::Error) -> Self {
        Self::IO {
            message: value.to_string(),
            os_error: value.raw_os_error(),
        }
    }
}

impl fmt::Display for ABuffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IO { message, os_error } => match os_error {
                Some(code) => write!(f, "io error: {message} (os error {code})"),
                None => write!(f, "io error: {message}"),
            },
            Self::PositionOverflow { position } => write!(f, "position {position} overflow"),
        }
    }
}

/// Чтение байтов с указанной позиции
///
/// Чтение не меняет общего курсора, поэтому один источник
/// можно читать одновременно из нескольких потоков
pub trait ReadBytesFrom {
    /// Читает байты начиная с `position` в `buff`
    ///
    /// Результат - кол-во прочитанных байт, `0` - конец данных
    fn read_from(&self, position: u64, buff: &mut [u8]) -> Result<u64, ABuffError>;
}

/// Размер данных в байтах
pub trait BytesCount {
    fn bytes_count(&self) -> Result<u64, ABuffError>;
}

impl ReadBytesFrom for Vec<u8> {
    fn read_from(&self, position: u64, buff: &mut [u8]) -> Result<u64, ABuffError> {
        let start = usize::try_from(position).map_err(|_| ABuffError::PositionOverflow { position })?;
        if start >= self.len() {
            return Ok(0);
        }
        let count = buff.len().min(self.len() - start);
        buff[..count].copy_from_slice(&self[start..start + count]);
        Ok(count as u64)
    }
}

impl BytesCount for Vec<u8> {
    fn bytes_count(&self) -> Result<u64, ABuffError> {
        Ok(self.len() as u64)
    }
}

/// Файл, открытый только на чтение
#[derive(Debug)]
pub struct FileBuff {
    path: PathBuf,
    file: File,
}

impl FileBuff {
    /// Открытие файла на чтение
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, ABuffError> {
        let file = OpenOptions::new().read(true).write(false).create(false).open(path.as_ref())?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn read_at(file: &File, position: u64, buff: &mut [u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buff, position)
}

#[cfg(windows)]
fn read_at(file: &File, position: u64, buff: &mut [u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buff, position)
}

impl ReadBytesFrom for FileBuff {
    fn read_from(&self, position: u64, buff: &mut [u8]) -> Result<u64, ABuffError> {
        loop {
            match read_at(&self.file, position, buff) {
                Ok(reads) => return Ok(reads as u64),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl BytesCount for FileBuff {
    fn bytes_count(&self) -> Result<u64, ABuffError> {
        Ok(self.file.metadata()?.len())
    }
}

#[test]
fn vec_read_from_tail() {
    let data: Vec<u8> = (0u8..10).collect();
    let mut buff = [0u8; 4];

    assert_eq!(data.read_from(8, &mut buff).unwrap(), 2);
    assert_eq!(&buff[..2], &[8, 9]);
    assert_eq!(data.read_from(10, &mut buff).unwrap(), 0);
    assert_eq!(data.bytes_count().unwrap(), 10);
}

#[test]
fn file_buff_positioned_read() {
    use std::io::Write;

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"0123456789").unwrap();
    tmp.flush().unwrap();

    let fb = FileBuff::open_read_only(tmp.path()).unwrap();
    let mut buff = [0u8; 3];
    assert_eq!(fb.read_from(4, &mut buff).unwrap(), 3);
    assert_eq!(&buff, b"456");
    assert_eq!(fb.read_from(1, &mut buff).unwrap(), 3);
    assert_eq!(&buff, b"123");
    assert_eq!(fb.bytes_count().unwrap(), 10);
}
