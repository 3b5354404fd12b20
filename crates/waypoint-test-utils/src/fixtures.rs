//! Canned generation outputs and catalog records.

use serde_json::{Value, json};

use waypoint_db::models::PlaceKind;
use waypoint_db::queries::places::NewPlace;

/// A `place_features` result. `place` deliberately differs from any input so
/// tests can check that the session pins it to the caller's text.
pub fn features_json() -> Value {
    json!({
        "place": "generated place name",
        "primary_traits": ["바다", "야경", "해산물", "카페", "산책", "시장", "온천", "사찰", "등산", "축제"],
        "categories": [
            {"category": "자연", "tags": ["해변", "산"]},
            {"category": "음식", "tags": ["회", "돼지국밥"]}
        ],
        "short_description": "바다와 도시가 어우러진 항구 도시"
    })
}

/// A `place_recommendations` result naming `names` in order.
pub fn recommendations_json(names: &[&str]) -> Value {
    let places: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "name": name,
                "address": format!("{name} 주소"),
                "reason": format!("{name}은(는) 키워드와 잘 맞습니다."),
                "match_score": 10 - (i as u8 % 10),
                // Coordinates from the model must never reach callers.
                "latitude": 0.0,
                "longitude": 0.0
            })
        })
        .collect();
    json!({ "places": places })
}

/// A `travel_plan` result with `days` contiguous day records.
pub fn travel_plan_json(days: u32) -> Value {
    let daily_plans: Vec<Value> = (1..=days)
        .map(|day| {
            json!({
                "day": day,
                "date": format!("{day}일차"),
                "schedule": [
                    {
                        "kind": "place",
                        "name": "해운대 해수욕장",
                        "address": "부산 해운대구 우동",
                        "latitude": 35.1587,
                        "longitude": 129.1604,
                        "time": "09:00",
                        "reason": "아침 바다 산책"
                    },
                    {
                        "kind": "restaurant",
                        "name": "할매 국밥",
                        "address": "부산 해운대구",
                        "time": "12:00",
                        "reason": "현지 음식",
                        "cuisine_type": "한식",
                        "meal_time": "점심"
                    }
                ],
                "summary": format!("{day}일차 일정")
            })
        })
        .collect();

    json!({
        "main_destination": {
            "name": "해운대 해수욕장",
            "address": "부산 해운대구 우동",
            "latitude": 35.1587,
            "longitude": 129.1604,
            "reason": "바다 중심 여행"
        },
        "total_days": days,
        "daily_plans": daily_plans,
        "overview": "바다와 먹거리 중심의 부산 여행"
    })
}

/// An attraction with an address and coordinates.
pub fn attraction(name: &str, region: &str, address: &str, latitude: f64, longitude: f64) -> NewPlace {
    NewPlace {
        name: name.to_owned(),
        kind: PlaceKind::Attraction,
        address: Some(address.to_owned()),
        description: Some(format!("{name} 설명")),
        latitude: Some(latitude),
        longitude: Some(longitude),
        region: Some(region.to_owned()),
    }
}
