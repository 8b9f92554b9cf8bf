/// Конфигурация
mod config;

/// Состояние
mod state;

/// Rest api для чтения потока
mod stream_api;

use actix_web::{web, App, HttpServer};
use config::{AppConfig, CmdLineParams};
use log::info;
use std::io;

use crate::state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app_conf = CmdLineParams::from_cmd_line().apply(AppConfig::find_or_default());

    // stream ..........
    let state = AppState::open(&app_conf.stream, &app_conf.work_dir)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    {
        let index = state.provider.index();
        info!(
            "stream {:?} opened, {} records, {} bytes",
            state.file, index.total_records, index.total_bytes
        );
    }

    // configure atix ...........
    info!("starting server on {}:{}", &app_conf.web_server.host, app_conf.web_server.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(stream_api::stream_api_route)
    })
    .bind((app_conf.web_server.host.clone(), app_conf.web_server.port))?
    .run()
    .await
}
