pub mod acts;
pub mod auth;
pub mod customers;
pub mod health;
pub mod labeled;
pub mod lots;
pub mod meters;
pub mod pre_catastrals;
pub mod reports;
pub mod roles;
pub mod technicians;
pub mod users;

use serde::Deserialize;

use crate::state::AppState;
use crate::utils::{ApiError, PageParams, PageRequest};

pub(crate) const MSG_DELETED: &str = "Registro eliminado correctamente.";

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i32,
}

/// `deleted_by` falls back to the session user.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: i32,
    pub deleted_by: Option<i32>,
}

pub(crate) fn page_request(state: &AppState, page: Option<i64>, limit: Option<i64>) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::resolve(
        PageParams { page, limit },
        &state.settings.pagination,
    )?)
}
