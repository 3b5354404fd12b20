//! Session state machine tests against the in-memory store.

mod common;

use serde_json::json;
use uuid::Uuid;

use waypoint_core::CoreError;
use waypoint_core::schema::MAX_PRIMARY_TRAITS;
use waypoint_core::session::{OptionOutcome, SessionStage};
use waypoint_core::store::Store;

use common::harness;

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_pins_place_to_trimmed_input() {
    let h = harness();
    let session = h.session("  부산  ").await;

    assert_eq!(session.categories["place"], "부산");
    let traits = session.categories["primary_traits"].as_array().unwrap();
    assert_eq!(traits.len(), MAX_PRIMARY_TRAITS);
    assert_eq!(session.main_purpose, "");
    assert!(session.options.is_empty());
    assert!(!session.finished);
    assert_eq!(SessionStage::of(&session), SessionStage::Created);

    let requests = h.extraction.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt.contains("Destination: 부산\n"));
    assert_eq!(requests[0].schema.as_ref().unwrap().name, "place_features");
}

#[tokio::test]
async fn create_rejects_blank_destination_without_generating() {
    let h = harness();
    for text in ["", "   "] {
        let err = h.service.create_session(text).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)), "got {err:?}");
    }
    assert_eq!(h.extraction.call_count(), 0);
    assert!(h.store.list_sessions(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_accepts_fenced_text_output() {
    let h = harness();
    h.extraction.push_text(format!(
        "```json\n{}\n```",
        json!({"place": "x", "primary_traits": ["오름"], "categories": [], "short_description": "섬"})
    ));

    let session = h.service.create_session("제주").await.unwrap();
    assert_eq!(session.categories["place"], "제주");
    assert_eq!(session.categories["primary_traits"], json!(["오름"]));
}

#[tokio::test]
async fn malformed_extraction_persists_nothing() {
    let h = harness();
    h.extraction.push_json(json!({"place": "부산"}));

    let err = h.service.create_session("부산").await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedGenerationOutput(_)), "got {err:?}");
    assert!(h.store.list_sessions(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn generation_failure_is_surfaced_without_retry() {
    let h = harness();
    h.extraction.push_error(503, "overloaded");
    h.extraction.push_json(waypoint_test_utils::fixtures::features_json());

    let err = h.service.create_session("부산").await.unwrap_err();
    assert!(matches!(err, CoreError::Generation(_)), "got {err:?}");
    assert_eq!(h.extraction.call_count(), 1);
}

// ---------------------------------------------------------------------------
// purpose / people / day
// ---------------------------------------------------------------------------

#[tokio::test]
async fn set_purpose_stores_text_and_returns_reply() {
    let h = harness();
    let session = h.session("부산").await;
    h.extraction.push_text("  바다를 즐기기 좋은 여행이 되겠네요.  ");

    let reply = h.service.set_purpose(session.id, "휴식과 맛집").await.unwrap();
    assert_eq!(reply, "바다를 즐기기 좋은 여행이 되겠네요.");

    let reloaded = h.service.get_session(session.id).await.unwrap();
    assert_eq!(reloaded.main_purpose, "휴식과 맛집");
    assert_eq!(reloaded.categories["place"], "부산");
    assert_eq!(SessionStage::of(&reloaded), SessionStage::PurposeSet);

    let prompt = &h.extraction.requests()[1].prompt;
    assert!(prompt.contains("휴식과 맛집"));
    assert!(prompt.contains("\"place\": \"부산\""));
    assert!(h.extraction.requests()[1].schema.is_none());
}

#[tokio::test]
async fn set_purpose_failure_leaves_session_unchanged() {
    let h = harness();
    let session = h.session("부산").await;
    h.extraction.push_error(500, "boom");

    assert!(h.service.set_purpose(session.id, "휴식").await.is_err());
    let reloaded = h.service.get_session(session.id).await.unwrap();
    assert_eq!(reloaded.main_purpose, "");
}

#[tokio::test]
async fn set_purpose_on_missing_session() {
    let h = harness();
    let id = Uuid::new_v4();
    let err = h.service.set_purpose(id, "휴식").await.unwrap_err();
    assert!(matches!(err, CoreError::SessionNotFound(missing) if missing == id));
    assert_eq!(h.extraction.call_count(), 0);
}

#[tokio::test]
async fn people_and_day_overwrite() {
    let h = harness();
    let session = h.session("부산").await;

    h.service.set_people(session.id, "2명").await.unwrap();
    h.service.set_people(session.id, "가족 4명").await.unwrap();
    let updated = h.service.set_day(session.id, "2박3일").await.unwrap();

    assert_eq!(updated.people.as_deref(), Some("가족 4명"));
    assert_eq!(updated.day.as_deref(), Some("2박3일"));
    assert_eq!(SessionStage::of(&updated), SessionStage::Collecting);
}

#[tokio::test]
async fn people_and_day_on_missing_session() {
    let h = harness();
    let id = Uuid::new_v4();
    assert!(matches!(
        h.service.set_people(id, "2명").await,
        Err(CoreError::SessionNotFound(_))
    ));
    assert!(matches!(
        h.service.set_day(id, "3일").await,
        Err(CoreError::SessionNotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// options
// ---------------------------------------------------------------------------

#[tokio::test]
async fn options_append_raw_text_in_order() {
    let h = harness();
    let session = h.session("부산").await;

    h.service.add_option(session.id, "카페 투어").await.unwrap();
    let outcome = h.service.add_option(session.id, "  Sea View ").await.unwrap();

    let OptionOutcome::Appended(updated) = outcome else {
        panic!("expected append");
    };
    assert_eq!(updated.options, vec!["카페 투어", "  Sea View "]);
    assert!(!updated.finished);
}

#[tokio::test]
async fn negative_intent_finishes_without_appending() {
    for text in ["없어", "No", "아니요"] {
        let h = harness();
        let session = h.session("부산").await;
        h.service.add_option(session.id, "카페 투어").await.unwrap();

        let outcome = h.service.add_option(session.id, text).await.unwrap();
        assert!(matches!(outcome, OptionOutcome::Finished(_)), "{text:?}");

        let reloaded = h.service.get_session(session.id).await.unwrap();
        assert!(reloaded.finished, "{text:?}");
        assert_eq!(reloaded.options, vec!["카페 투어"], "{text:?}");
        assert_eq!(SessionStage::of(&reloaded), SessionStage::Finished);
    }
}

#[tokio::test]
async fn finished_session_rejects_options() {
    let h = harness();
    let session = h.session("부산").await;
    h.service.add_option(session.id, "없어요").await.unwrap();

    for text in ["야경", "없어", ""] {
        let err = h.service.add_option(session.id, text).await.unwrap_err();
        assert!(matches!(err, CoreError::SessionFinished(id) if id == session.id), "{text:?}");
    }
    let reloaded = h.service.get_session(session.id).await.unwrap();
    assert!(reloaded.options.is_empty());
}

#[tokio::test]
async fn blank_option_is_invalid() {
    let h = harness();
    let session = h.session("부산").await;
    let err = h.service.add_option(session.id, "  ").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn option_on_missing_session() {
    let h = harness();
    let err = h.service.add_option(Uuid::new_v4(), "카페").await.unwrap_err();
    assert!(matches!(err, CoreError::SessionNotFound(_)));
}

#[tokio::test]
async fn other_stages_stay_open_after_finish() {
    let h = harness();
    let session = h.session("부산").await;
    h.service.add_option(session.id, "nothing").await.unwrap();

    let updated = h.service.set_day(session.id, "3일").await.unwrap();
    assert!(updated.finished);
    assert_eq!(updated.day.as_deref(), Some("3일"));
}

#[tokio::test]
async fn list_sessions_newest_first() {
    let h = harness();
    let first = h.session("부산").await;
    let second = h.session("제주").await;

    let listed = h.service.list_sessions(10).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
