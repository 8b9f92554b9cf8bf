use actix_web::{get, web, Responder, Result};
use evlog::index::IndexEntry;
use serde::{Deserialize, Serialize};

use crate::{
    state::AppState,
    stream_api::{ApiErr, DEFAULT_SPAN, MAX_SPAN},
};

#[derive(Deserialize)]
pub struct IndexQuery {
    /// Номер записи, с которой начинается список
    from: Option<u64>,
    count: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexView {
    checkpoint_interval: u64,
    total: usize,
    entries: Vec<IndexEntry>,
}

/// Контрольные точки индекса начиная с записи `from`
#[get("/index")]
pub async fn read_index(state: web::Data<AppState>, query: web::Query<IndexQuery>) -> Result<impl Responder, ApiErr> {
    let from = query.from.unwrap_or(0);
    let count = query.count.unwrap_or(DEFAULT_SPAN);
    if count > MAX_SPAN {
        return Err(ApiErr::BadRange { message: format!("count {count} exceeds {MAX_SPAN}") });
    }

    let index = state.provider.index();
    let entries = index.entries();
    let first = entries.partition_point(|e| e.ordinal < from);
    let last = first.saturating_add(count as usize).min(entries.len());

    Ok(web::Json(IndexView {
        checkpoint_interval: index.checkpoint_interval,
        total: entries.len(),
        entries: entries[first..last].to_vec(),
    }))
}

#[test]
fn test_index() {
    use actix_web::{test, App};
    use crate::stream_api::{stream_api_route, test_stream::*};

    let file = stream_file(200);
    let state = open_state(file.path());

    actix_rt::System::new().block_on(async move {
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(stream_api_route)).await;

        let req = test::TestRequest::get().uri("/index?from=20&count=3").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["checkpointInterval"], 16);
        assert_eq!(body["total"], 13);

        let ordinals: Vec<u64> = body["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["ordinal"].as_u64().unwrap())
            .collect();
        assert_eq!(ordinals, vec![32, 48, 64]);
        assert!(body["entries"][0]["state"]["anchored"].is_boolean());
    });
}
