// ABOUTME: Shared fixtures for catalog integration tests
// ABOUTME: Seeds an in-memory gateway with beneficiaries and partner funds

#![allow(dead_code)]

use serde_json::{json, Value};
use shanyraq_catalog::gateway::tables;
use shanyraq_catalog::MemoryGateway;

/// Five active urgent/children records across Алматы, Астана and nationwide
pub fn urgent_fixture() -> Vec<Value> {
    vec![
        beneficiary("u-almaty-old", "urgent", Some("Алматы"), false, "2026-01-05T09:00:00Z"),
        beneficiary("u-almaty-new", "urgent", Some("Алматы"), false, "2026-01-20T09:00:00Z"),
        beneficiary("u-nationwide", "urgent", None, true, "2026-01-10T09:00:00Z"),
        beneficiary("u-astana", "urgent", Some("Астана"), false, "2026-01-25T09:00:00Z"),
        beneficiary("c-almaty", "children", Some("Алматы"), false, "2026-01-30T09:00:00Z"),
    ]
}

/// A wider mix including hidden records and every category
pub fn mixed_fixture() -> Vec<Value> {
    let mut rows = urgent_fixture();
    let mut hidden = beneficiary("hidden-almaty", "children", Some("Алматы"), false, "2026-02-01T09:00:00Z");
    hidden["is_active"] = json!(false);
    rows.push(hidden);
    let mut hidden_nationwide = beneficiary("hidden-nationwide", "urgent", None, true, "2026-02-02T09:00:00Z");
    hidden_nationwide["is_active"] = json!(false);
    rows.push(hidden_nationwide);
    rows.push(beneficiary("animals-shymkent", "animals", Some("Шымкент"), false, "2026-01-12T09:00:00Z"));
    rows.push(beneficiary("social-astana", "social", Some("Астана"), false, "2026-01-13T09:00:00Z"));
    rows.push(beneficiary("ops-nationwide", "operations", None, true, "2026-01-14T09:00:00Z"));
    rows
}

pub fn beneficiary(
    id: &str,
    category: &str,
    city: Option<&str>,
    nationwide: bool,
    created_at: &str,
) -> Value {
    json!({
        "id": id,
        "title": format!("Сбор {}", id),
        "description": "Описание сбора",
        "category": category,
        "city": city,
        "is_nationwide": nationwide,
        "partner_fund": "Шанырак",
        "target_amount": 100000,
        "raised_amount": 25000,
        "image_url": format!("https://img.example/{}.jpg", id),
        "images": [],
        "videos": null,
        "is_active": true,
        "is_urgent": category == "urgent",
        "collection_status": "active",
        "report_photos": ["https://img.example/never-fetched.jpg"],
        "helpers_count": 4,
        "created_at": created_at
    })
}

pub fn funds_fixture() -> Vec<Value> {
    vec![
        json!({"id": "f-1", "name": "Аяла", "is_verified": true, "created_at": "2025-10-01T00:00:00Z"}),
        json!({"id": "f-2", "name": "Мейірім", "is_verified": false, "created_at": "2025-12-01T00:00:00Z"}),
        json!({"id": "f-3", "name": "Шанырак", "is_verified": true, "created_at": "2025-11-01T00:00:00Z"}),
    ]
}

pub fn seeded_gateway(beneficiaries: Vec<Value>) -> MemoryGateway {
    MemoryGateway::new()
        .with_rows(tables::BENEFICIARIES, beneficiaries)
        .with_rows(tables::PARTNER_FUNDS, funds_fixture())
}
