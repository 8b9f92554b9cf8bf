use actix_web::{get, web, Responder, Result};
use evlog::{chunk::CacheStats, decode::StreamEnd, timekeeper::ReorderStats};
use serde::Serialize;

use crate::{state::AppState, stream_api::ApiErr};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Info {
    file: String,
    total_records: u64,
    total_bytes: u64,
    decoded_bytes: u64,
    checkpoints: usize,
    checkpoint_interval: u64,
    end: StreamEnd,
    reorder: ReorderStats,
    anomalies: usize,
    anomalies_dropped: u64,
    cache: CacheStats,
}

/// Сводка по потоку и индексу
#[get("/info")]
pub async fn get_info(state: web::Data<AppState>) -> Result<impl Responder, ApiErr> {
    let index = state.provider.index();
    Ok(web::Json(Info {
        file: state.file.to_string_lossy().to_string(),
        total_records: index.total_records,
        total_bytes: index.total_bytes,
        decoded_bytes: index.decoded_bytes,
        checkpoints: index.entries().len(),
        checkpoint_interval: index.checkpoint_interval,
        end: index.end,
        reorder: index.stats,
        anomalies: index.anomalies().len(),
        anomalies_dropped: index.anomalies_dropped,
        cache: state.provider.cache_stats(),
    }))
}

#[test]
fn test_info() {
    use actix_web::{test, App};
    use crate::stream_api::{stream_api_route, test_stream::*};

    let file = stream_file(500);
    let len = std::fs::metadata(file.path()).unwrap().len();
    let state = open_state(file.path());

    actix_rt::System::new().block_on(async move {
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(stream_api_route)).await;
        let req = test::TestRequest::get().uri("/info").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["totalRecords"], 500);
        assert_eq!(body["totalBytes"], len);
        assert_eq!(body["decodedBytes"], len);
        assert_eq!(body["checkpoints"], 32);
        assert_eq!(body["end"], "Eof");
        assert_eq!(body["cache"]["misses"], 0);
    });
}
