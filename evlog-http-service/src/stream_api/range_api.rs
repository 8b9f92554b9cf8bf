use actix_web::{get, web, Responder, Result};
use evlog::{
    chunk::Chunk,
    record::TagTable,
    render::render,
    timekeeper::{Order, ReorderStats, TimedRecord},
};
use serde::{Deserialize, Serialize};

use crate::{
    state::AppState,
    stream_api::{check_span, ApiErr, DEFAULT_SPAN},
};

#[derive(Deserialize)]
pub struct RangeQuery {
    start: u64,

    /// По умолчанию `start + 100`
    end: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordView {
    ordinal: u64,
    absolute_ns: u64,
    tag: u8,
    byte_offset: u64,
    byte_length: u32,

    /// Данные записи в hex
    raw_bytes: String,
    rendered_text: String,
    order: Order,
}

impl RecordView {
    fn new(table: &TagTable, timed: &TimedRecord) -> Self {
        Self {
            ordinal: timed.record.ordinal,
            absolute_ns: timed.absolute_ns,
            tag: timed.record.tag,
            byte_offset: timed.record.byte_offset,
            byte_length: timed.record.byte_length,
            raw_bytes: hex::encode(&timed.record.payload),
            rendered_text: render(table, &timed.record),
            order: timed.order,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeView {
    total: u64,
    start: u64,
    end: u64,
    reorder: ReorderStats,
    records: Vec<RecordView>,
}

impl RangeView {
    fn new(table: &TagTable, chunk: &Chunk) -> Self {
        Self {
            total: chunk.total,
            start: chunk.start,
            end: chunk.end,
            reorder: chunk.stats,
            records: chunk.records.iter().map(|r| RecordView::new(table, r)).collect(),
        }
    }
}

/// Записи с позициями `[start, end)` в порядке выдачи
#[get("/range")]
pub async fn read_range(state: web::Data<AppState>, query: web::Query<RangeQuery>) -> Result<impl Responder, ApiErr> {
    let RangeQuery { start, end } = query.into_inner();
    let end = end.unwrap_or(start.saturating_add(DEFAULT_SPAN));
    check_span(start, end)?;

    let provider = state.provider.clone();
    let chunk = web::block(move || provider.fetch(start, end)).await??;
    Ok(web::Json(RangeView::new(state.provider.table(), &chunk)))
}

#[cfg(test)]
mod test {
    use actix_web::{http::StatusCode, test, App};
    use std::{fs::OpenOptions, io::Write};

    use super::*;
    use crate::stream_api::{stream_api_route, test_stream::*};

    #[::core::prelude::v1::test]
    fn test_range() {
        let file = stream_file(300);
        let state = open_state(file.path());

        actix_rt::System::new().block_on(async move {
            let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(stream_api_route)).await;

            let req = test::TestRequest::get().uri("/range?start=10&end=20").to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["total"], 300);
            assert_eq!(body["start"], 10);
            assert_eq!(body["end"], 20);

            let records = body["records"].as_array().unwrap();
            assert_eq!(records.len(), 10);
            let mut last_ns = 0;
            for r in records {
                // переставленная пара может пересекать границу диапазона
                let ordinal = r["ordinal"].as_u64().unwrap();
                assert!((9..=20).contains(&ordinal));
                let ns = r["absoluteNs"].as_u64().unwrap();
                assert!(ns >= last_ns);
                last_ns = ns;
                assert!(r["rawBytes"].is_string());
                assert!(r["renderedText"].is_string());
                assert!(r["absoluteNs"].is_u64());
            }

            let req = test::TestRequest::get().uri("/range?start=250").to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["end"], 300);
            assert_eq!(body["records"].as_array().unwrap().len(), 50);

            let req = test::TestRequest::get().uri("/range?start=1000&end=1010").to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["records"].as_array().unwrap().len(), 0);
            assert_eq!(body["total"], 300);
        });
    }

    #[::core::prelude::v1::test]
    fn test_bad_range() {
        let file = stream_file(50);
        let state = open_state(file.path());

        actix_rt::System::new().block_on(async move {
            let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(stream_api_route)).await;

            let req = test::TestRequest::get().uri("/range?start=20&end=10").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let req = test::TestRequest::get().uri("/range?start=0&end=20000").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        });
    }

    #[::core::prelude::v1::test]
    fn test_stale_index() {
        let file = stream_file(50);
        let state = open_state(file.path());

        let mut f = OpenOptions::new().append(true).open(file.path()).unwrap();
        f.write_all(&[0x12, 0x01]).unwrap();
        f.flush().unwrap();

        actix_rt::System::new().block_on(async move {
            let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(stream_api_route)).await;
            let req = test::TestRequest::get().uri("/range?start=0&end=10").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CONFLICT);
        });
    }
}
