pub mod products;
pub mod users;

use thiserror::Error;

use crate::api::ApiError;
use crate::form::FormError;

pub use products::ProductManager;
pub use users::UserManager;

/// Why a user action did not complete. By the time a manager returns one of
/// these it has already been reported on the surface.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("no {0} is pending deletion")]
    NothingPending(&'static str),

    #[error("nothing to update")]
    EmptyPatch,

    #[error("backend is not ready (status {0})")]
    NotReady(String),
}

impl FlowError {
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
