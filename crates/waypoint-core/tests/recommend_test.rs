//! Candidate retrieval and recommendation tests against the in-memory store.

mod common;

use serde_json::json;
use uuid::Uuid;

use waypoint_core::CoreError;
use waypoint_core::store::Store;
use waypoint_db::models::PlaceKind;
use waypoint_db::queries::places::NewPlace;
use waypoint_test_utils::fixtures::{attraction, recommendations_json};

use common::{Harness, harness};

async fn seed_busan(h: &Harness) {
    for place in [
        attraction("해운대 해수욕장", "부산", "부산 해운대구 우동", 35.1587, 129.1604),
        attraction("감천문화마을", "부산", "부산 사하구 감천동", 35.0975, 129.0106),
        attraction("태종대", "부산", "부산 영도구 전망로", 35.0533, 129.0872),
        attraction("성산일출봉", "제주", "제주 서귀포시 성산읍", 33.4581, 126.9425),
    ] {
        h.store.insert_place(&place).await.unwrap();
    }
}

#[tokio::test]
async fn coordinates_come_from_matching_candidates() {
    let h = harness();
    seed_busan(&h).await;
    let session = h.session("부산").await;
    h.extraction
        .push_json(recommendations_json(&["감천문화마을", "없는 장소", "해운대 해수욕장"]));

    let recs = h.service.recommend(session.id, 10).await.unwrap();

    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0].name, "감천문화마을");
    assert_eq!(recs[0].latitude, Some(35.0975));
    assert_eq!(recs[0].longitude, Some(129.0106));
    assert_eq!(recs[1].latitude, None);
    assert_eq!(recs[1].longitude, None);
    assert_eq!(recs[2].latitude, Some(35.1587));
    assert_eq!(recs[0].match_score, Some(10));
}

#[tokio::test]
async fn prompt_lists_only_hinted_candidates() {
    let h = harness();
    seed_busan(&h).await;
    let session = h.session("부산").await;
    h.extraction.push_json(recommendations_json(&["태종대"]));

    h.service.recommend(session.id, 5).await.unwrap();

    let prompt = &h.extraction.requests()[1].prompt;
    assert!(prompt.contains("1. 해운대 해수욕장 | 부산 해운대구 우동 | 해운대 해수욕장 설명"));
    assert!(prompt.contains("3. 태종대 | "));
    assert!(!prompt.contains("성산일출봉"));
    assert!(prompt.contains("Select at most 5 places"));
    assert!(prompt.contains("Purpose: 여행 및 관광"));
    assert!(prompt.contains("Keywords: 바다, 야경, 해산물"));
}

#[tokio::test]
async fn results_are_truncated_to_limit() {
    let h = harness();
    seed_busan(&h).await;
    let session = h.session("부산").await;
    h.extraction
        .push_json(recommendations_json(&["태종대", "감천문화마을", "해운대 해수욕장"]));

    let recs = h.service.recommend(session.id, 2).await.unwrap();
    let names: Vec<_> = recs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["태종대", "감천문화마을"]);
}

#[tokio::test]
async fn short_lists_are_not_padded() {
    let h = harness();
    seed_busan(&h).await;
    let session = h.session("부산").await;
    h.extraction.push_json(recommendations_json(&["태종대"]));

    let recs = h.service.recommend(session.id, 10).await.unwrap();
    assert_eq!(recs.len(), 1);
}

#[tokio::test]
async fn unmatched_hint_falls_back_to_whole_catalog() {
    let h = harness();
    seed_busan(&h).await;
    let session = h.session("대한민국").await;
    h.extraction.push_json(recommendations_json(&["성산일출봉"]));

    let recs = h.service.recommend(session.id, 10).await.unwrap();
    assert_eq!(recs[0].latitude, Some(33.4581));

    let prompt = &h.extraction.requests()[1].prompt;
    assert!(prompt.contains("성산일출봉"));
    assert!(prompt.contains("해운대 해수욕장"));
}

#[tokio::test]
async fn no_eligible_places_is_no_candidates() {
    let h = harness();
    h.store
        .insert_place(&NewPlace {
            name: "불국사".into(),
            kind: PlaceKind::Heritage,
            address: Some("경북 경주시".into()),
            description: None,
            latitude: None,
            longitude: None,
            region: Some("경북".into()),
        })
        .await
        .unwrap();
    h.store
        .insert_place(&NewPlace {
            address: None,
            ..attraction("주소 없음", "부산", "", 0.0, 0.0)
        })
        .await
        .unwrap();
    let session = h.session("부산").await;

    let err = h.service.recommend(session.id, 10).await.unwrap_err();
    assert!(matches!(err, CoreError::NoCandidates), "got {err:?}");
    assert_eq!(h.extraction.call_count(), 1, "recommendation model must not be called");
}

#[tokio::test]
async fn zero_limit_is_invalid() {
    let h = harness();
    let err = h.service.recommend(Uuid::new_v4(), 0).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn missing_session_is_reported() {
    let h = harness();
    seed_busan(&h).await;
    let err = h.service.recommend(Uuid::new_v4(), 10).await.unwrap_err();
    assert!(matches!(err, CoreError::SessionNotFound(_)));
}

#[tokio::test]
async fn malformed_recommendations_are_rejected() {
    let h = harness();
    seed_busan(&h).await;
    let session = h.session("부산").await;
    h.extraction.push_json(json!({"places": "해운대"}));

    let err = h.service.recommend(session.id, 10).await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedGenerationOutput(_)), "got {err:?}");
}

#[tokio::test]
async fn results_never_outnumber_candidates() {
    let h = harness();
    h.store
        .insert_place(&attraction("태종대", "부산", "부산 영도구 전망로", 35.0533, 129.0872))
        .await
        .unwrap();
    let session = h.session("부산").await;
    h.extraction
        .push_json(recommendations_json(&["태종대", "오륙도", "송도 해상케이블카", "태종대"]));

    let recs = h.service.recommend(session.id, 10).await.unwrap();
    let names: Vec<_> = recs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["태종대"]);
}
