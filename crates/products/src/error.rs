//! Errors surfaced by the product lifecycle.

use stockroom_core::DataValidationError;
use thiserror::Error;

use crate::store::StoreError;

/// Failure of a product CRUD call.
///
/// Both variants are transparent: the validation message and the store error
/// reach the caller unchanged.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error(transparent)]
    DataValidation(#[from] DataValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProductError {
    pub fn is_data_validation(&self) -> bool {
        matches!(self, Self::DataValidation(_))
    }

    pub fn as_store(&self) -> Option<&StoreError> {
        match self {
            Self::Store(e) => Some(e),
            Self::DataValidation(_) => None,
        }
    }
}
