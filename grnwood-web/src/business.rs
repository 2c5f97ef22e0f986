//! Business creation and slug backfill

use chrono::Utc;
use grnwood_core::{slugify, Business, GrnwoodResult, NewBusiness};
use grnwood_graph::{BusinessDraft, BusinessRepository, Committed, RequestContext};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct BusinessService {
    businesses: BusinessRepository,
}

impl BusinessService {
    pub fn new(businesses: BusinessRepository) -> Self {
        Self { businesses }
    }

    /// Create a business managed by `input.user_id`.
    ///
    /// Identifier, slug, banner colour and creation date are assigned here.
    pub async fn create_business(
        &self,
        ctx: &RequestContext,
        input: NewBusiness,
    ) -> GrnwoodResult<Committed<Business>> {
        input.validate()?;

        let business_id = uuid::Uuid::new_v4().to_string();
        let draft = BusinessDraft {
            slug: Some(slug_for(&input.name, &business_id)),
            banner_colour: random_banner_colour(),
            date_created: Utc::now().timestamp_millis(),
            business_id,
            user_id: input.user_id,
            name: input.name,
            description: input.description,
            display_image: input.display_image,
            banner_image: input.banner_image,
            gallery: input.gallery,
        };

        self.businesses.create(ctx, &draft).await
    }

    /// Fetch a business, backfilling its slug if it has none yet
    pub async fn get_business(
        &self,
        ctx: &RequestContext,
        business_id: &str,
    ) -> GrnwoodResult<Committed<Business>> {
        let business = self.businesses.find_by_id(ctx, business_id).await?;
        self.assign_slug(ctx, business).await
    }

    /// Give `business` a slug derived from its name.
    ///
    /// A business that already has one is returned unchanged without a
    /// write, so repeated calls are idempotent.
    pub async fn assign_slug(
        &self,
        ctx: &RequestContext,
        business: Business,
    ) -> GrnwoodResult<Committed<Business>> {
        if business.slug.is_some() {
            return Ok(Committed {
                value: business,
                bookmark: None,
            });
        }

        let slug = slug_for(&business.name, &business.business_id);
        debug!(business_id = %business.business_id, slug = %slug, "Backfilling slug");
        let updated = self
            .businesses
            .set_slug_if_absent(ctx, &business.business_id, &slug)
            .await?;
        info!(business_id = %business.business_id, "Slug assigned");
        Ok(updated)
    }
}

/// Slug of `name`, or the business id when nothing in the name survives
fn slug_for(name: &str, business_id: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        business_id.to_string()
    } else {
        slug
    }
}

fn random_banner_colour() -> String {
    format!("#{:06x}", fastrand::u32(..0x100_0000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_falls_back_to_business_id() {
        assert_eq!(slug_for("Joe's Café!", "b-1"), "joes-cafe");
        assert_eq!(slug_for("東京", "b-1"), "b-1");
    }

    #[test]
    fn test_banner_colour_format() {
        for _ in 0..100 {
            let colour = random_banner_colour();
            assert_eq!(colour.len(), 7);
            assert!(colour.starts_with('#'));
            assert!(colour[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
