//! Domain layer: entities, filters, credentials and response records (no I/O).

mod entities;
mod entity;
mod field;
mod request;
mod response;
mod validation;
mod value;

pub use entities::{Ad, Campaign, Group, Keyword, Region, Vertex};
pub use entity::{Entity, EntitySchema, EntitySource, SchemaError};
pub use field::Field;
pub use request::{
    AdsFilter, CampaignsFilter, DEFAULT_KEYWORDS_BATCH, GroupsFilter, KeywordsFilter,
};
pub use response::{ApiDialect, ApiResponse, ApiVersion, Completion, Diagnostic, Limits};
pub use validation::ValidationError;
pub use value::{
    ApiStatus, Credentials, KnownStatus, Login, Password, SessionToken, UserContext, UserId,
};
