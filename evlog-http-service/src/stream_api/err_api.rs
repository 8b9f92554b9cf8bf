use actix_web::{error, http::StatusCode, HttpResponse};
use evlog::chunk::ChunkErr;
use std::fmt::Display;

#[derive(Debug)]
pub enum ApiErr {
    /// Файл изменился после построения индекса
    IndexStale { indexed: u64, actual: u64 },

    /// Некорректный диапазон в запросе
    BadRange { message: String },

    ChunkErr(String),

    /// Блокирующая задача не выполнилась
    Blocking(String),
}

impl Display for ApiErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexStale { indexed, actual } => {
                write!(f, "IndexStale indexed={indexed} actual={actual}")
            }
            Self::BadRange { message } => write!(f, "BadRange: {message}"),
            Self::ChunkErr(err) => write!(f, "ChunkErr: {err}"),
            Self::Blocking(err) => write!(f, "Blocking: {err}"),
        }
    }
}

impl error::ResponseError for ApiErr {
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::IndexStale { .. } => StatusCode::CONFLICT,
            Self::BadRange { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ChunkErr> for ApiErr {
    fn from(value: ChunkErr) -> Self {
        match value {
            ChunkErr::IndexStale { indexed, actual } => Self::IndexStale { indexed, actual },
            err => Self::ChunkErr(err.to_string()),
        }
    }
}

impl From<error::BlockingError> for ApiErr {
    fn from(value: error::BlockingError) -> Self {
        Self::Blocking(value.to_string())
    }
}
