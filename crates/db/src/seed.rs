//! Bundled static defaults.
//!
//! Two consumers: the destructive `reset` operation replaces the remote
//! collection with this seed set, and the sync client serves it as the
//! last resort when both the remote store and the local cache are empty.

use chrono::TimeZone;
use repatlas_core::types::Timestamp;

use crate::models::category::CreateCategory;
use crate::models::representative::{CreateRepresentative, Representative};

/// The fixed representative seed set.
pub fn default_representatives() -> Vec<CreateRepresentative> {
    fn rep(
        name: &str,
        regions: &[&str],
        territory: &str,
        phone: &str,
        email: &str,
        webhook: &str,
        color: &str,
    ) -> CreateRepresentative {
        CreateRepresentative {
            name: name.to_string(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            contact_url: None,
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            portrait: None,
            webhook_url: Some(webhook.to_string()),
            color: Some(color.to_string()),
            territory: Some(territory.to_string()),
            show_in_grid: true,
        }
    }

    vec![
        rep(
            "Alex Harmon",
            &["WA", "AK"],
            "Washington, Alaska",
            "(206) 555-0171",
            "alexh@example.com",
            "https://hooks.example.com/catch/1001/northwest/",
            "#509E2E",
        ),
        rep(
            "Morgan Vale",
            &["OR"],
            "Oregon",
            "(971) 555-0136",
            "morganv@example.com",
            "https://hooks.example.com/catch/1001/oregon/",
            "#63B839",
        ),
        rep(
            "Riley Coates",
            &["CA", "NV"],
            "Southern California & Southern Nevada",
            "(714) 555-0195",
            "rileyc@example.com",
            "https://hooks.example.com/catch/1001/socal/",
            "#3D7A23",
        ),
        rep(
            "Pat & Toni Keller",
            &["CA", "NV"],
            "Northern California & Northern Nevada",
            "(925) 555-0125",
            "patk@example.com",
            "https://hooks.example.com/catch/1001/norcal/",
            "#76D047",
        ),
        rep(
            "Teddy Marsh",
            &["AZ", "NM", "UT", "CO", "WY", "MT", "ID"],
            "Mountain & SW Region",
            "(253) 555-0185",
            "teddym@example.com",
            "https://hooks.example.com/catch/1001/mountain/",
            "#429525",
        ),
        rep(
            "Phil & Lena Okafor",
            &["HI"],
            "Hawaii",
            "(916) 555-0158",
            "philo@example.com",
            "https://hooks.example.com/catch/1001/hawaii/",
            "#8FE85C",
        ),
    ]
}

/// The seed set rendered as full entities with synthetic identifiers, for
/// clients that need a bundled snapshot of the collection shape.
pub fn default_representative_entities() -> Vec<Representative> {
    let epoch: Timestamp = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    default_representatives()
        .into_iter()
        .enumerate()
        .map(|(index, seed)| Representative {
            id: index as i64 + 1,
            name: seed.name,
            regions: seed.regions,
            contact_url: seed.contact_url,
            email: seed.email,
            phone: seed.phone,
            portrait: seed.portrait,
            webhook_url: seed.webhook_url,
            color: seed.color,
            territory: seed.territory,
            show_in_grid: seed.show_in_grid,
            created_at: epoch,
            updated_at: epoch,
        })
        .collect()
}

/// Default category vocabulary, served when the category table is empty or
/// unreachable.
pub fn default_categories() -> Vec<CreateCategory> {
    fn cat(slug: &str, label: &str, sort_order: i32) -> CreateCategory {
        CreateCategory {
            slug: slug.to_string(),
            label: label.to_string(),
            sort_order,
        }
    }

    vec![
        cat("general", "General", 0),
        cat("training", "Training", 1),
        cat("trade-show", "Trade Show", 2),
        cat("webinar", "Webinar", 3),
        cat("community", "Community", 4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_seed_rep_validates() {
        for rep in default_representatives() {
            rep.validate().unwrap();
        }
    }

    #[test]
    fn seed_entities_have_unique_ids() {
        let entities = default_representative_entities();
        let mut ids: Vec<_> = entities.iter().map(|r| r.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), entities.len());
    }

    #[test]
    fn default_categories_include_general_first() {
        let cats = default_categories();
        assert_eq!(cats[0].slug, "general");
        assert!(cats.windows(2).all(|w| w[0].sort_order <= w[1].sort_order));
    }
}
