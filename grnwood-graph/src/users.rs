//! User records: federated identity lookup and creation

use grnwood_core::{not_found_error, FederatedIdentity, GrnwoodError, GrnwoodResult, User};
use tracing::{debug, info};

use crate::context::RequestContext;
use crate::executor::{Committed, QueryExecutor};
use crate::statement::{GraphQuery, Statement};

macro_rules! user_projection {
    () => {
        "SELECT json_object(\
            'userId', json_extract(u.properties, '$.userId'), \
            'displayName', json_extract(u.properties, '$.displayName'), \
            'contact', json_object('email', json(COALESCE(\
                (SELECT json_extract(c.properties, '$.email') \
                 FROM relationships r \
                 JOIN nodes c ON c.id = r.end_id AND c.label = 'Contact' \
                 WHERE r.start_id = u.id AND r.rel_type = 'HAS_CONTACT' \
                 LIMIT 1), \
                '[]')))\
         ) FROM nodes u WHERE u.label = 'User'"
    };
}

const FIND_BY_IDENTITY: &str = concat!(
    user_projection!(),
    " AND json_extract(u.properties, ?1) = ?2 LIMIT 1"
);

const FIND_BY_ID: &str = concat!(
    user_projection!(),
    " AND json_extract(u.properties, '$.userId') = ?1 LIMIT 1"
);

const CREATE_USER: &str = "INSERT INTO nodes (label, properties) \
    VALUES ('User', json_object('userId', ?1, 'displayName', ?2, ?3, ?4))";

const CREATE_CONTACT: &str = "INSERT INTO nodes (label, properties) \
    VALUES ('Contact', json_object('contactId', ?1, 'email', \
        CASE WHEN ?2 IS NULL THEN json_array() ELSE json_array(?2) END))";

const LINK_CONTACT: &str = "INSERT INTO relationships (rel_type, start_id, end_id) \
    SELECT 'HAS_CONTACT', u.id, c.id FROM nodes u, nodes c \
    WHERE u.label = 'User' AND json_extract(u.properties, '$.userId') = ?1 \
      AND c.label = 'Contact' AND json_extract(c.properties, '$.contactId') = ?2";

/// A user to be created on first authentication
#[derive(Debug, Clone)]
pub struct NewUser {
    pub identity: FederatedIdentity,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    executor: QueryExecutor,
}

impl UserRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Look a user up by federated identity; `NotFound` when absent
    pub async fn find_by_identity(
        &self,
        ctx: &RequestContext,
        identity: &FederatedIdentity,
    ) -> GrnwoodResult<User> {
        let query = GraphQuery::read(
            Statement::new(FIND_BY_IDENTITY)
                .bind(identity.field.json_path())
                .bind(&identity.value),
        )
        .entity();

        self.executor
            .execute(ctx, &query)
            .await
            .map_err(|e| {
                rename_not_found(e, || format!("User with {} {}", identity.field, identity.value))
            })?
            .decode()
    }

    pub async fn find_by_id(&self, ctx: &RequestContext, user_id: &str) -> GrnwoodResult<User> {
        let query = GraphQuery::read(Statement::new(FIND_BY_ID).bind(user_id)).entity();

        self.executor
            .execute(ctx, &query)
            .await
            .map_err(|e| rename_not_found(e, || format!("User {}", user_id)))?
            .decode()
    }

    /// Create the user, its contact record and the edge between them in one
    /// write transaction.
    ///
    /// Fails with `ConstraintViolation` when the identity is already taken.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        new_user: NewUser,
    ) -> GrnwoodResult<Committed<User>> {
        let user_id = uuid::Uuid::new_v4().to_string();
        let contact_id = uuid::Uuid::new_v4().to_string();
        let email = new_user.email.filter(|e| !e.trim().is_empty());

        let query = GraphQuery::write(
            Statement::new(CREATE_USER)
                .bind(&user_id)
                .bind(new_user.display_name)
                .bind(new_user.identity.field.as_str())
                .bind(new_user.identity.value),
        )
        .then(Statement::new(CREATE_CONTACT).bind(&contact_id).bind(email))
        .then(Statement::new(LINK_CONTACT).bind(&user_id).bind(&contact_id))
        .then(Statement::new(FIND_BY_ID).bind(&user_id))
        .entity();

        debug!(user_id = %user_id, "Creating user");
        let created = self.executor.fetch::<User>(ctx, &query).await?;
        info!(user_id = %created.value.user_id, "User created");
        Ok(created)
    }
}

fn rename_not_found(err: GrnwoodError, resource: impl FnOnce() -> String) -> GrnwoodError {
    if err.is_not_found() {
        not_found_error!(resource(), "users")
    } else {
        err
    }
}
