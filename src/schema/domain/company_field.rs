//! Company-scoped field definitions.

use super::{FieldDataType, FieldHash, SchemaDomainError};
use crate::shared::{CatalogId, CompanyFieldId, CompanyId, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NAME_MIN: usize = 1;
const NAME_MAX: usize = 30;
const DESCRIPTION_MAX: usize = 5000;
const ICON_MAX: usize = 50;

/// Draft of a company field before a hash is minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompanyField {
    /// Owning company.
    pub company: CompanyId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Icon name.
    pub icon: String,
    /// Value type.
    pub data_type: FieldDataType,
    /// Catalog referenced by `data` and `data_array` fields.
    pub data_catalog: Option<CatalogId>,
    /// Catalog the field itself belongs to, when defined inside one.
    pub owner_catalog: Option<CatalogId>,
    /// Email of the author.
    pub created_by: String,
}

impl NewCompanyField {
    /// Creates a draft with empty description and icon.
    #[must_use]
    pub fn new(
        company: CompanyId,
        name: impl Into<String>,
        data_type: FieldDataType,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            company,
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            data_type,
            data_catalog: None,
            owner_catalog: None,
            created_by: created_by.into(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Sets the referenced catalog.
    #[must_use]
    pub const fn with_data_catalog(mut self, catalog: CatalogId) -> Self {
        self.data_catalog = Some(catalog);
        self
    }

    /// Sets the catalog owning the field.
    #[must_use]
    pub const fn with_owner_catalog(mut self, catalog: CatalogId) -> Self {
        self.owner_catalog = Some(catalog);
        self
    }

    /// Validates the draft.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDomainError::Validation`] for out-of-range text and a
    /// catalog error when `data`/`data_array` lack a usable reference.
    pub fn validate(&self, validator: &Validator) -> Result<(), SchemaDomainError> {
        validate_texts(validator, &self.name, &self.description, &self.icon)?;
        if self.data_type.references_catalog() {
            let catalog = self
                .data_catalog
                .ok_or(SchemaDomainError::MissingCatalogReference)?;
            if self.owner_catalog == Some(catalog) {
                return Err(SchemaDomainError::SelfCatalogReference);
            }
        }
        Ok(())
    }
}

fn validate_texts(
    validator: &Validator,
    name: &str,
    description: &str,
    icon: &str,
) -> Result<(), SchemaDomainError> {
    validator
        .checks()
        .length("name", name, NAME_MIN, NAME_MAX)
        .max_length("description", description, DESCRIPTION_MAX)
        .max_length("icon", icon, ICON_MAX)
        .finish()?;
    Ok(())
}

/// Editable attributes of a company field; the hash never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyFieldEdit {
    /// New display name.
    pub name: String,
    /// New description.
    pub description: String,
    /// New icon.
    pub icon: String,
}

/// Company-wide dynamic field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyField {
    id: CompanyFieldId,
    company: CompanyId,
    hash: FieldHash,
    name: String,
    description: String,
    icon: String,
    data_type: FieldDataType,
    data_catalog: Option<CatalogId>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted company field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCompanyField {
    /// Field identifier.
    pub id: CompanyFieldId,
    /// Owning company.
    pub company: CompanyId,
    /// Minted hash.
    pub hash: FieldHash,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Icon.
    pub icon: String,
    /// Value type.
    pub data_type: FieldDataType,
    /// Referenced catalog.
    pub data_catalog: Option<CatalogId>,
    /// Author email.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CompanyField {
    /// Builds a field from a validated draft and a freshly minted hash.
    #[must_use]
    pub fn from_draft(draft: NewCompanyField, hash: FieldHash, created_at: DateTime<Utc>) -> Self {
        Self {
            id: CompanyFieldId::new(),
            company: draft.company,
            hash,
            name: draft.name,
            description: draft.description,
            icon: draft.icon,
            data_type: draft.data_type,
            data_catalog: draft.data_catalog,
            created_by: draft.created_by,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    /// Reconstructs a field from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedCompanyField) -> Self {
        Self {
            id: data.id,
            company: data.company,
            hash: data.hash,
            name: data.name,
            description: data.description,
            icon: data.icon,
            data_type: data.data_type,
            data_catalog: data.data_catalog,
            created_by: data.created_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
        }
    }

    /// Applies an edit after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDomainError::Validation`] for out-of-range text.
    pub fn apply_edit(
        &mut self,
        edit: CompanyFieldEdit,
        validator: &Validator,
        now: DateTime<Utc>,
    ) -> Result<(), SchemaDomainError> {
        validate_texts(validator, &edit.name, &edit.description, &edit.icon)?;
        self.store_edit(edit, now);
        Ok(())
    }

    /// Copies an already validated edit; used by storage adapters.
    pub(crate) fn store_edit(&mut self, edit: CompanyFieldEdit, now: DateTime<Utc>) {
        self.name = edit.name;
        self.description = edit.description;
        self.icon = edit.icon;
        self.updated_at = now;
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> CompanyFieldId {
        self.id
    }

    /// Returns the owning company.
    #[must_use]
    pub const fn company(&self) -> CompanyId {
        self.company
    }

    /// Returns the hash.
    #[must_use]
    pub const fn hash(&self) -> &FieldHash {
        &self.hash
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the icon.
    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Returns the value type.
    #[must_use]
    pub const fn data_type(&self) -> FieldDataType {
        self.data_type
    }

    /// Returns the referenced catalog.
    #[must_use]
    pub const fn data_catalog(&self) -> Option<CatalogId> {
        self.data_catalog
    }

    /// Returns the author email.
    #[must_use]
    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the soft-delete timestamp.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns `true` unless soft-deleted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Marks the field deleted.
    pub const fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
    }
}
