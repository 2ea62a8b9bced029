use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::quote::{Quote, QuoteId, QuoteLineItem, QuoteStatus};

/// Header fields a snapshot copies and a restore writes back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteHeader {
    pub customer_name: String,
    pub status: QuoteStatus,
    pub currency: String,
}

/// Full copy of a quote's mutable state at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub header: QuoteHeader,
    #[serde(default)]
    pub items: Vec<QuoteLineItem>,
}

impl SnapshotPayload {
    pub fn of_quote(quote: &Quote) -> Self {
        let mut items = quote.items.clone();
        items.sort_by_key(|item| item.sort_order);

        Self {
            header: QuoteHeader {
                customer_name: quote.customer_name.clone(),
                status: quote.status,
                currency: quote.currency.clone(),
            },
            items,
        }
    }

    /// Hash of the canonical JSON encoding. Payload types serialize
    /// infallibly (string-keyed maps, Decimal-as-string), so a failure here
    /// is a programming error and must not degrade into a valid-looking hash.
    pub fn content_hash(&self) -> String {
        let canonical_payload =
            serde_json::to_vec(self).expect("snapshot payload serializes to JSON");
        sha256_hex(&canonical_payload)
    }
}

/// One immutable entry of a quote's append-only version history.
/// `version_number` is gap-free and monotonic per quote by construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub id: String,
    pub quote_id: QuoteId,
    pub version_number: u32,
    pub payload: SnapshotPayload,
    pub notes: Option<String>,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut output = String::with_capacity(digest.len() * 2);
    for byte in digest {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::SnapshotPayload;
    use crate::domain::product::ProductId;
    use crate::domain::quote::{LineItemSource, Quote, QuoteId, QuoteLineItem, QuoteStatus};

    fn quote() -> Quote {
        Quote {
            id: QuoteId("Q-7".to_string()),
            customer_name: "Dvorak".to_string(),
            status: QuoteStatus::Draft,
            currency: "CZK".to_string(),
            items: vec![
                QuoteLineItem::new(
                    Some(ProductId("heating-hp6".to_string())),
                    "Heat pump",
                    "technology",
                    1,
                    Decimal::from(52_000),
                    2,
                    LineItemSource::Manual,
                ),
                QuoteLineItem::new(
                    Some(ProductId("baz-kru-base".to_string())),
                    "Circle pool",
                    "pool",
                    1,
                    Decimal::from(180_000),
                    0,
                    LineItemSource::PoolBasePrice,
                ),
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn payload_orders_items_by_sort_order() {
        let payload = SnapshotPayload::of_quote(&quote());
        assert_eq!(payload.items[0].sort_order, 0);
        assert_eq!(payload.items[1].sort_order, 2);
    }

    #[test]
    fn content_hash_is_stable_for_equal_payloads() {
        let first = SnapshotPayload::of_quote(&quote());
        let second = SnapshotPayload::of_quote(&quote());
        assert_eq!(first.content_hash(), second.content_hash());
    }

    #[test]
    fn content_hash_is_never_the_empty_input_hash() {
        // sha256 of zero bytes; a hash equal to this would mean the payload
        // was dropped before hashing
        const EMPTY_SHA256: &str =
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert_ne!(SnapshotPayload::of_quote(&quote()).content_hash(), EMPTY_SHA256);
    }

    #[test]
    fn content_hash_changes_with_items() {
        let base = SnapshotPayload::of_quote(&quote());
        let mut edited = quote();
        edited.items.pop();
        let changed = SnapshotPayload::of_quote(&edited);
        assert_ne!(base.content_hash(), changed.content_hash());
    }

    #[test]
    fn payload_without_items_field_still_decodes() {
        let payload: SnapshotPayload = serde_json::from_str(
            r#"{"header":{"customer_name":"Dvorak","status":"draft","currency":"CZK"}}"#,
        )
        .expect("header-only payload");
        assert!(payload.items.is_empty());
    }

    #[test]
    fn payload_without_header_fails_to_decode() {
        let result = serde_json::from_str::<SnapshotPayload>(r#"{"items":[]}"#);
        assert!(result.is_err());
    }
}
