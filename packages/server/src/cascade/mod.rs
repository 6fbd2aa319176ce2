//! Hierarchical soft-delete, blob cleanup and audit propagation for the
//! content tree (blogs, projects, company children).
//!
//! The parent/children relationships are declared statically on
//! [`EntityKind`]; the [`DeletionCoordinator`] walks them explicitly instead of
//! relying on ORM relation loading, and owns the transaction boundary.

mod cleanup;
mod coordinator;
mod sea;
mod store;
mod touch;


use std::fmt;

use serde::Serialize;

pub use cleanup::{CleanupOutcome, key_for_url, remove_blob};
pub use coordinator::{AssetReplacement, CascadeError, DeletionCoordinator, DeletionReport};
pub use sea::{SeaOrmStore, SeaOrmTxn};
pub use store::{EntityStore, EntityTxn, StoreError};
pub use touch::{propagate, touch_owner};

/// Every entity type that participates in the ownership tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ProjectType,
    CompanyProject,
    ProjectFeature,
    FeatureImage,
    Blog,
    BlogImage,
    Company,
    CompanySocialMedia,
    CompanyContact,
}

impl EntityKind {
    /// Child kinds owned by this kind, in no particular order.
    pub fn children(self) -> &'static [EntityKind] {
        use EntityKind::*;
        match self {
            ProjectType => &[CompanyProject],
            CompanyProject => &[ProjectFeature],
            ProjectFeature => &[FeatureImage],
            Blog => &[BlogImage],
            Company => &[CompanySocialMedia, CompanyContact],
            FeatureImage | BlogImage | CompanySocialMedia | CompanyContact => &[],
        }
    }

    /// The owning kind, if any.
    pub fn parent(self) -> Option<EntityKind> {
        use EntityKind::*;
        match self {
            CompanyProject => Some(ProjectType),
            ProjectFeature => Some(CompanyProject),
            FeatureImage => Some(ProjectFeature),
            BlogImage => Some(Blog),
            CompanySocialMedia | CompanyContact => Some(Company),
            ProjectType | Blog | Company => None,
        }
    }

    /// Public blob directory for image rows of this kind. Image rows are
    /// leaves and get their blob removed when the row is soft-deleted.
    pub fn image_dir(self) -> Option<&'static str> {
        match self {
            EntityKind::BlogImage => Some("blogs"),
            EntityKind::FeatureImage => Some("projects"),
            _ => None,
        }
    }

    /// Blob directory of the single replaceable asset on an aggregate
    /// (project thumbnail, company logo).
    pub fn asset_dir(self) -> Option<&'static str> {
        match self {
            EntityKind::CompanyProject => Some("projects"),
            EntityKind::Company => Some("company"),
            _ => None,
        }
    }

    /// Aggregates carry the "last modified by" audit fields that child
    /// mutations propagate to.
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            EntityKind::Blog | EntityKind::CompanyProject | EntityKind::Company
        )
    }

    pub fn is_soft_deletable(self) -> bool {
        self != EntityKind::Company
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::ProjectType => "project_type",
            EntityKind::CompanyProject => "company_project",
            EntityKind::ProjectFeature => "project_feature",
            EntityKind::FeatureImage => "feature_image",
            EntityKind::Blog => "blog",
            EntityKind::BlogImage => "blog_image",
            EntityKind::Company => "company",
            EntityKind::CompanySocialMedia => "company_social_media",
            EntityKind::CompanyContact => "company_contact",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live row as seen by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: EntityKind,
    pub id: i32,
    pub parent_id: Option<i32>,
    /// URL of the blob the row references: the image of an image row, or
    /// the thumbnail/logo of an aggregate that has one.
    pub image_url: Option<String>,
}

impl Node {
    pub fn new(kind: EntityKind, id: i32, parent_id: Option<i32>) -> Self {
        Self {
            kind,
            id,
            parent_id,
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// The acting user, threaded explicitly into every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub name: String,
}
