//! Identifier newtypes shared by every bounded context.
//!
//! These types wrap UUIDs so that a task identifier cannot be passed where a
//! project identifier is expected, while keeping a uniform storage
//! representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value.trim()).map(Self)
            }
        }
    };
}

uuid_identifier!(
    /// Top-level tenant owning companies and users.
    FederationId
);
uuid_identifier!(
    /// Tenant inside a federation; owns projects and field definitions.
    CompanyId
);
uuid_identifier!(
    /// Workflow scope inside a company; owns tasks and field projections.
    ProjectId
);
uuid_identifier!(
    /// Registered user.
    UserId
);
uuid_identifier!(
    /// Task record.
    TaskId
);
uuid_identifier!(
    /// Comment attached to a task.
    CommentId
);
uuid_identifier!(
    /// Reference catalog owned by a company.
    CatalogId
);
uuid_identifier!(
    /// Company-scoped dynamic field definition.
    CompanyFieldId
);
uuid_identifier!(
    /// Projection of a company field onto a project.
    ProjectFieldId
);
uuid_identifier!(
    /// Activity journal entry.
    ActivityId
);
uuid_identifier!(
    /// Stored attachment.
    FileId
);
uuid_identifier!(
    /// Entry of a task's status history.
    StopId
);
