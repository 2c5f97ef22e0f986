//! Business records and their managing user

use grnwood_core::{not_found_error, Business, GrnwoodResult};
use tracing::info;

use crate::context::RequestContext;
use crate::executor::{Committed, QueryExecutor};
use crate::statement::{GraphQuery, Statement};

macro_rules! business_projection {
    () => {
        "SELECT json_set(b.properties, '$.managedBy', json_extract(u.properties, '$.userId')) \
         FROM nodes b \
         LEFT JOIN relationships r ON r.end_id = b.id AND r.rel_type = 'MANAGES' \
         LEFT JOIN nodes u ON u.id = r.start_id AND u.label = 'User' \
         WHERE b.label = 'Business' AND json_extract(b.properties, '$.businessId') = ?1 \
         LIMIT 1"
    };
}

const FIND_BY_ID: &str = business_projection!();

// Selecting from the managing user makes the insert a no-op when the user
// does not exist; the empty projection then rolls the transaction back.
const CREATE_BUSINESS: &str = "INSERT INTO nodes (label, properties) \
    SELECT 'Business', json_object(\
        'businessId', ?2, 'name', ?3, 'slug', ?4, 'description', ?5, \
        'bannerColour', ?6, 'dateCreated', ?7, 'displayImage', ?8, \
        'bannerImage', ?9, 'gallery', json(?10)) \
    FROM nodes u WHERE u.label = 'User' AND json_extract(u.properties, '$.userId') = ?1";

const LINK_MANAGER: &str = "INSERT INTO relationships (rel_type, start_id, end_id) \
    SELECT 'MANAGES', u.id, b.id FROM nodes u, nodes b \
    WHERE u.label = 'User' AND json_extract(u.properties, '$.userId') = ?1 \
      AND b.label = 'Business' AND json_extract(b.properties, '$.businessId') = ?2";

const SET_SLUG_IF_ABSENT: &str = "UPDATE nodes SET properties = json_set(properties, '$.slug', ?2) \
    WHERE label = 'Business' AND json_extract(properties, '$.businessId') = ?1 \
      AND json_extract(properties, '$.slug') IS NULL";

/// Every server-computed and caller-supplied property of a new business
#[derive(Debug, Clone)]
pub struct BusinessDraft {
    pub business_id: String,
    pub user_id: String,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub banner_colour: String,
    pub date_created: i64,
    pub display_image: Option<String>,
    pub banner_image: Option<String>,
    pub gallery: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BusinessRepository {
    executor: QueryExecutor,
}

impl BusinessRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Create the business managed by `draft.user_id`.
    ///
    /// `NotFound` when the user does not exist; nothing is written then.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        draft: &BusinessDraft,
    ) -> GrnwoodResult<Committed<Business>> {
        let gallery = serde_json::to_string(&draft.gallery)?;

        let query = GraphQuery::write(
            Statement::new(CREATE_BUSINESS)
                .bind(&draft.user_id)
                .bind(&draft.business_id)
                .bind(&draft.name)
                .bind(draft.slug.clone())
                .bind(draft.description.clone())
                .bind(draft.banner_colour.as_str())
                .bind(draft.date_created)
                .bind(draft.display_image.clone())
                .bind(draft.banner_image.clone())
                .bind(gallery),
        )
        .then(
            Statement::new(LINK_MANAGER)
                .bind(&draft.user_id)
                .bind(&draft.business_id),
        )
        .then(Statement::new(FIND_BY_ID).bind(&draft.business_id))
        .entity();

        let created = self
            .executor
            .fetch::<Business>(ctx, &query)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    not_found_error!(format!("User {}", draft.user_id), "businesses")
                } else {
                    e
                }
            })?;

        info!(
            business_id = %created.value.business_id,
            user_id = %draft.user_id,
            "Business created"
        );
        Ok(created)
    }

    pub async fn find_by_id(
        &self,
        ctx: &RequestContext,
        business_id: &str,
    ) -> GrnwoodResult<Business> {
        let query = GraphQuery::read(Statement::new(FIND_BY_ID).bind(business_id)).entity();

        self.executor
            .execute(ctx, &query)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    not_found_error!(format!("Business {}", business_id), "businesses")
                } else {
                    e
                }
            })?
            .decode()
    }

    /// Set the slug unless one is already stored, returning the business as
    /// it is after the write
    pub async fn set_slug_if_absent(
        &self,
        ctx: &RequestContext,
        business_id: &str,
        slug: &str,
    ) -> GrnwoodResult<Committed<Business>> {
        let query = GraphQuery::write(
            Statement::new(SET_SLUG_IF_ABSENT)
                .bind(business_id)
                .bind(slug),
        )
        .then(Statement::new(FIND_BY_ID).bind(business_id))
        .entity();

        self.executor.fetch::<Business>(ctx, &query).await
    }
}
