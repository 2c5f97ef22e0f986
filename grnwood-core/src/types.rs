//! Core data type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GrnwoodError;
use crate::validation_error;

/// A registered user, as projected from the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub contact: Contact,
}

/// Contact record attached to a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub email: Vec<String>,
}

/// A business managed by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub business_id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub banner_colour: Option<String>,
    /// Epoch milliseconds, server clock at creation
    #[serde(default)]
    pub date_created: Option<i64>,
    #[serde(default)]
    pub display_image: Option<String>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    /// `userId` of the managing user
    #[serde(default)]
    pub managed_by: Option<String>,
}

/// Input of `userCreateBusiness`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBusiness {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub banner_image: Option<String>,
}

impl NewBusiness {
    /// Reject input missing required fields
    pub fn validate(&self) -> Result<(), GrnwoodError> {
        if self.user_id.trim().is_empty() {
            return Err(validation_error!(
                "userId is required",
                "userId",
                "business"
            ));
        }
        if self.name.trim().is_empty() {
            return Err(validation_error!("name is required", "name", "business"));
        }
        Ok(())
    }
}

/// User property holding an external identity provider's stable identifier.
///
/// Only fields listed here can be used as lookup keys; each one is backed by a
/// unique constraint in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityField {
    #[serde(rename = "googleId")]
    GoogleId,
}

impl IdentityField {
    pub const ALL: &'static [IdentityField] = &[IdentityField::GoogleId];

    /// Property name on the `User` node
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityField::GoogleId => "googleId",
        }
    }

    /// JSON path of the property inside the node's property document
    pub fn json_path(&self) -> &'static str {
        match self {
            IdentityField::GoogleId => "$.googleId",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityField {
    type Err = GrnwoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdentityField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                validation_error!(
                    format!("Unsupported identity field: {}", s),
                    "identityField",
                    "auth"
                )
            })
    }
}

/// A federated identity: which provider field, and its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    pub field: IdentityField,
    pub value: String,
}

impl FederatedIdentity {
    pub fn new(field: IdentityField, value: impl Into<String>) -> Result<Self, GrnwoodError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(validation_error!(
                "identity value is required",
                "id",
                "auth"
            ));
        }
        Ok(Self { field, value })
    }
}
