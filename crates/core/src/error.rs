use thiserror::Error;

use crate::model::{ActivityError, ChildError, IdError, ProgressError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Child(#[from] ChildError),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Id(#[from] IdError),
}
