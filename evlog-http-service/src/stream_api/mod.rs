use actix_web::web;

mod err_api;
pub use err_api::*;

mod info_api;
mod range_api;
mod index_api;

/// Размер диапазона по умолчанию
pub const DEFAULT_SPAN: u64 = 100;

/// Максимальный размер диапазона за один запрос
pub const MAX_SPAN: u64 = 10_000;

/// настройка ручек
pub fn stream_api_route(cfg: &mut web::ServiceConfig) {
    cfg
     .service(info_api::get_info)
     .service(range_api::read_range)
     .service(index_api::read_index);
}

/// Проверка диапазона `[start, end)` из запроса
fn check_span(start: u64, end: u64) -> Result<(), ApiErr> {
    if end < start {
        return Err(ApiErr::BadRange { message: format!("end {end} before start {start}") });
    }
    if end - start > MAX_SPAN {
        return Err(ApiErr::BadRange { message: format!("span {} exceeds {MAX_SPAN}", end - start) });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_stream {
    use std::path::Path;

    use evlog::{record::TagTable, synth};
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::NamedTempFile;

    use crate::{config::StreamConfig, state::AppState};

    /// Временный файл с `count` записями
    pub fn stream_file(count: usize) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        let mut rng = StdRng::seed_from_u64(count as u64);
        std::fs::write(file.path(), synth::generate(&TagTable::standard(), count, &mut rng)).unwrap();
        file
    }

    pub fn open_state(path: &Path) -> AppState {
        let conf = StreamConfig {
            file: path.to_string_lossy().to_string(),
            checkpoint_interval: 16,
            ..StreamConfig::default()
        };
        AppState::open(&conf, ".").unwrap()
    }
}
