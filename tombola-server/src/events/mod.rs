//! Event administration
//!
//! Upserts, offer catalogs, the opaque per-event panel state, and the
//! read models built on top (overview, ticket lists, participants).

pub mod reporting;

pub use reporting::{
    participants, sales_locked_effective, sold_cards, Participant, SoldCardsBreakdown,
};

use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use shared::models::{
    Event, EventState, EventStateEntry, Offer, Ticket, MAX_COMBOS_COUNT, MAX_COMBO_SIZE,
};
use shared::{AppError, AppResult};
use uuid::Uuid;

/// Distinguishes `"field": null` (Some(None), clear) from an absent field
/// (None, leave untouched) when paired with `#[serde(default)]`
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Partial event update
///
/// Plain `Option` fields are set-if-present; the double-`Option` fields
/// additionally distinguish an explicit `null` (clear) from absence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_time: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub flyer_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub combo_size: Option<u32>,
    #[serde(default)]
    pub price_card: Option<i64>,
    #[serde(default)]
    pub price_combo: Option<i64>,
    #[serde(default)]
    pub target_cards: Option<u32>,
    #[serde(default, deserialize_with = "double_option")]
    pub draw_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub sales_locked: Option<bool>,
}

impl EventPatch {
    fn apply(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.name = name.trim().to_string();
        }
        if let Some(date_time) = self.date_time {
            event.date_time = date_time;
        }
        if let Some(location) = &self.location {
            event.location = Some(location.clone());
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }
        if let Some(flyer_url) = &self.flyer_url {
            event.flyer_url = Some(flyer_url.clone());
        }
        if let Some(is_active) = self.is_active {
            event.is_active = is_active;
        }
        if let Some(combo_size) = self.combo_size {
            event.combo_size = combo_size.clamp(1, MAX_COMBO_SIZE);
        }
        if let Some(price_card) = self.price_card {
            event.price_card = price_card;
        }
        if let Some(price_combo) = self.price_combo {
            event.price_combo = Some(price_combo);
        }
        if let Some(target_cards) = self.target_cards {
            event.target_cards = Some(target_cards);
        }
        if let Some(draw_at) = self.draw_at {
            event.draw_at = draw_at;
        }
        if let Some(sales_locked) = self.sales_locked {
            event.sales_locked = sales_locked;
        }
    }
}

/// One offer row as submitted by the panel
#[derive(Debug, Clone, Deserialize)]
pub struct OfferInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub combos_count: Option<u32>,
    #[serde(default)]
    pub price: Option<i64>,
}

/// Read model for the event admin page
#[derive(Debug, Clone, Serialize)]
pub struct EventOverview {
    pub event: Event,
    pub offers: Vec<Offer>,
    pub sold: SoldCardsBreakdown,
    pub target_cards: Option<u32>,
    pub sales_locked_effective: bool,
}

pub struct EventsAdmin {
    store: Store,
}

impl EventsAdmin {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Apply a partial update, creating the event on first write
    pub async fn upsert_event(&self, event_id: &str, patch: EventPatch) -> AppResult<Event> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(AppError::validation("event_id is required"));
        }
        let mut txn = self.store.begin().await?;
        if txn.doc().find_event(event_id).is_none() {
            txn.doc_mut().events.push(Event::new(event_id));
            tracing::info!(event_id, "Event created");
        }
        let event = {
            let event = txn
                .doc_mut()
                .find_event_mut(event_id)
                .ok_or_else(|| AppError::not_found("Event"))?;
            patch.apply(event);
            event.clone()
        };
        txn.commit()?;
        Ok(event)
    }

    /// Replace the whole offer catalog of an event
    pub async fn replace_offers(
        &self,
        event_id: &str,
        inputs: Vec<OfferInput>,
    ) -> AppResult<Vec<Offer>> {
        let mut txn = self.store.begin().await?;
        let event_id = txn
            .doc()
            .find_event(event_id)
            .map(|e| e.id.clone())
            .ok_or_else(|| {
                AppError::not_found("Event").with_detail("event_id", event_id.to_string())
            })?;

        let offers: Vec<Offer> = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| Offer {
                id: input
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| format!("of_{}", Uuid::new_v4())),
                event_id: event_id.clone(),
                label: input
                    .label
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| format!("Combo {}", i + 1)),
                combos_count: input.combos_count.unwrap_or(1).clamp(1, MAX_COMBOS_COUNT),
                price: input.price.unwrap_or(0),
            })
            .collect();

        let doc = txn.doc_mut();
        doc.offers.retain(|o| !o.event_id.eq_ignore_ascii_case(&event_id));
        doc.offers.extend(offers.clone());
        txn.commit()?;
        tracing::info!(event_id = %event_id, offers = offers.len(), "Offer catalog replaced");
        Ok(offers)
    }

    /// Everything the admin page needs in one read
    pub async fn overview(&self, event_id: &str) -> AppResult<EventOverview> {
        let doc = self.store.snapshot().await?;
        let event = doc
            .find_event(event_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Event"))?;
        let offers = doc.offers_for_event(&event.id).into_iter().cloned().collect();
        let sold = reporting::sold_cards(&doc, &event.id);
        Ok(EventOverview {
            target_cards: event.effective_target_cards(),
            sales_locked_effective: reporting::sales_locked_effective(&event, Utc::now()),
            sold,
            offers,
            event,
        })
    }

    /// Store the panel's per-event state blob (null clears it)
    pub async fn put_event_state(
        &self,
        event_id: &str,
        state: Option<EventState>,
    ) -> AppResult<DateTime<Utc>> {
        let now = Utc::now();
        let mut txn = self.store.begin().await?;
        txn.doc_mut().event_states.insert(
            event_id.to_string(),
            EventStateEntry {
                state,
                updated_at: now,
            },
        );
        txn.commit()?;
        Ok(now)
    }

    pub async fn get_event_state(&self, event_id: &str) -> AppResult<Option<EventStateEntry>> {
        let doc = self.store.snapshot().await?;
        Ok(doc.event_states.get(event_id).cloned())
    }

    /// Tickets of approved orders for an event, in issue order
    pub async fn list_event_tickets(&self, event_id: &str) -> AppResult<Vec<Ticket>> {
        let doc = self.store.snapshot().await?;
        let order_ids: std::collections::HashSet<&str> = doc
            .orders
            .iter()
            .filter(|o| o.event_id.eq_ignore_ascii_case(event_id) && o.status.is_approved())
            .map(|o| o.id.as_str())
            .collect();
        let mut tickets: Vec<Ticket> = doc
            .tickets
            .iter()
            .filter(|t| order_ids.contains(t.order_id.as_str()))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.serial.cmp(&b.serial));
        Ok(tickets)
    }

    /// Aggregated buyers board for the draw screen
    pub async fn participants(&self, event_id: &str) -> AppResult<Vec<Participant>> {
        let doc = self.store.snapshot().await?;
        Ok(reporting::participants(&doc, event_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn admin(dir: &std::path::Path) -> (Store, EventsAdmin) {
        let store = Store::open(dir.join("db.json"));
        (store.clone(), EventsAdmin::new(store))
    }

    #[tokio::test]
    async fn test_upsert_creates_then_patches() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, admin) = admin(dir.path()).await;

        let created = admin
            .upsert_event(
                "E1",
                EventPatch {
                    name: Some("Gran Tómbola".to_string()),
                    price_card: Some(2000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.name, "Gran Tómbola");
        assert_eq!(created.combo_size, 6);

        let patched = admin
            .upsert_event(
                "e1",
                EventPatch {
                    combo_size: Some(10),
                    sales_locked: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.id, "E1");
        assert_eq!(patched.name, "Gran Tómbola");
        assert_eq!(patched.combo_size, 10);
        assert!(patched.sales_locked);
    }

    #[tokio::test]
    async fn test_patch_null_clears_draw_at() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, admin) = admin(dir.path()).await;
        admin
            .upsert_event(
                "E1",
                EventPatch {
                    draw_at: Some(Some(Utc::now() + Duration::hours(2))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Explicit null clears; absence leaves untouched
        let patch: EventPatch = serde_json::from_str(r#"{"draw_at":null}"#).unwrap();
        let cleared = admin.upsert_event("E1", patch).await.unwrap();
        assert!(cleared.draw_at.is_none());

        let patch: EventPatch = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert!(patch.draw_at.is_none());
    }

    #[tokio::test]
    async fn test_replace_offers_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let (store, admin) = admin(dir.path()).await;
        admin.upsert_event("E1", EventPatch::default()).await.unwrap();

        let offers = admin
            .replace_offers(
                "E1",
                vec![
                    OfferInput {
                        id: Some("c1".to_string()),
                        label: Some("1 combo".to_string()),
                        combos_count: Some(1),
                        price: Some(6000),
                    },
                    OfferInput {
                        id: None,
                        label: None,
                        combos_count: Some(0),
                        price: None,
                    },
                    OfferInput {
                        id: Some("c-huge".to_string()),
                        label: Some("Too big".to_string()),
                        combos_count: Some(u32::MAX),
                        price: Some(1),
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].id, "c1");
        assert!(offers[1].id.starts_with("of_"));
        assert_eq!(offers[1].label, "Combo 2");
        assert_eq!(offers[1].combos_count, 1);
        // Quantities clamp into the supported range
        assert_eq!(offers[2].combos_count, MAX_COMBOS_COUNT);

        // Replacement drops the old catalog
        let replaced = admin
            .replace_offers(
                "E1",
                vec![OfferInput {
                    id: Some("c9".to_string()),
                    label: Some("Mega".to_string()),
                    combos_count: Some(5),
                    price: Some(25000),
                }],
            )
            .await
            .unwrap();
        assert_eq!(replaced.len(), 1);
        let doc = store.snapshot().await.unwrap();
        assert_eq!(doc.offers_for_event("E1").len(), 1);
    }

    #[tokio::test]
    async fn test_replace_offers_requires_event() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, admin) = admin(dir.path()).await;
        let err = admin.replace_offers("E-missing", vec![]).await.unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_event_state_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, admin) = admin(dir.path()).await;

        let state: EventState =
            serde_json::from_str(r#"{"vendors":{},"panel_note":"keep me"}"#).unwrap();
        let stamp = admin.put_event_state("E1", Some(state)).await.unwrap();

        let entry = admin.get_event_state("E1").await.unwrap().unwrap();
        assert_eq!(entry.updated_at, stamp);
        let back = entry.state.unwrap();
        assert_eq!(back.extra.get("panel_note").unwrap(), "keep me");

        admin.put_event_state("E1", None).await.unwrap();
        let cleared = admin.get_event_state("E1").await.unwrap().unwrap();
        assert!(cleared.state.is_none());
        assert!(admin.get_event_state("E2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overview_composes_read_model() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, admin) = admin(dir.path()).await;
        admin
            .upsert_event(
                "E1",
                EventPatch {
                    target_cards: Some(500),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        admin
            .replace_offers(
                "E1",
                vec![OfferInput {
                    id: Some("c1".to_string()),
                    label: None,
                    combos_count: Some(1),
                    price: Some(6000),
                }],
            )
            .await
            .unwrap();

        let overview = admin.overview("e1").await.unwrap();
        assert_eq!(overview.event.id, "E1");
        assert_eq!(overview.offers.len(), 1);
        assert_eq!(overview.target_cards, Some(500));
        assert_eq!(overview.sold, SoldCardsBreakdown::default());
        assert!(!overview.sales_locked_effective);
    }
}
