//! Types shared by every bounded context: identifiers, the acting user,
//! error classification, validation, and the change feed.

mod actor;
pub mod change_feed;
mod error_kind;
mod ids;
pub mod validation;

pub use actor::Actor;
pub use change_feed::{BroadcastChangeFeed, ChangeEvent, ChangeFeed, ChangedEntity};
pub use error_kind::{Classify, ErrorKind};
pub use ids::{
    ActivityId, CatalogId, CommentId, CompanyFieldId, CompanyId, FederationId, FileId, ProjectFieldId,
    ProjectId, StopId, TaskId, UserId,
};
pub use validation::{Language, Rule, ValidationErrors, Validator};
