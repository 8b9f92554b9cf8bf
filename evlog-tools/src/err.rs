use evlog::{bbuff::ABuffError, chunk::ChunkErr, index::IndexErr};

#[derive(Debug, Clone)]
pub enum ToolErr {
    BuffErr(ABuffError),
    Index(IndexErr),
    Chunk(ChunkErr),
    IOError {
        message: String,
        os_error: Option<i32>,
    },
}

impl From<ABuffError> for ToolErr {
    fn from(value: ABuffError) -> Self {
        Self::BuffErr(value)
    }
}

impl From<IndexErr> for ToolErr {
    fn from(value: IndexErr) -> Self {
        Self::Index(value)
    }
}

impl From<ChunkErr> for ToolErr {
    fn from(value: ChunkErr) -> Self {
        Self::Chunk(value)
    }
}

impl From<std::io::Error> for ToolErr {
    fn from(value: std::io::Error) -> Self {
        Self::IOError {
            message: value.to_string(),
            os_error: value.raw_os_error(),
        }
    }
}

impl std::fmt::Display for ToolErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuffErr(err) => write!(f, "{err}"),
            Self::Index(err) => write!(f, "{err}"),
            Self::Chunk(err) => write!(f, "{err}"),
            Self::IOError { message, .. } => write!(f, "io error: {message}"),
        }
    }
}
