pub mod error;
pub mod model;

pub use error::UserServiceError;
pub use model::{
    NewUser, RawNameRecord, RejectionRecord, SortField, User, UserPatch, UserQuery,
    DEFAULT_LIST_LIMIT,
};
