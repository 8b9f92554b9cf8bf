mod app;
pub use app::*;

mod web;
pub use web::*;

mod stream;
pub use stream::*;

/// Обработка параметров коммандой строки
mod cmd_line;
pub use cmd_line::*;
