/// Источники байтов с чтением по позиции
pub mod absbuff;
pub use absbuff::*;

/// Окно последовательного чтения
mod cursor;
pub use cursor::*;
