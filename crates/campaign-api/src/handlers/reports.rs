use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::auth::AuthUser;
use crate::domain::{permissions, ReportKind, ReportQuery};
use crate::services::report::{ReportFile, XLSX_CONTENT_TYPE};
use crate::state::AppState;
use crate::utils::{ApiError, ApiQuery};

const TOTAL_RECORDS: HeaderName = HeaderName::from_static("x-total-records");

fn attachment(file: ReportFile) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file.filename))
        .map_err(|e| ApiError::InternalError(format!("invalid report filename: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
            (TOTAL_RECORDS, HeaderValue::from(file.total)),
        ],
        file.bytes,
    )
        .into_response())
}

async fn export(state: &AppState, user: &AuthUser, kind: ReportKind, query: &ReportQuery) -> Result<Response, ApiError> {
    user.require(permissions::REPORT_EXPORT)?;
    let file = state.reports.export(kind, query).await?;
    attachment(file)
}

pub async fn acts_report(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Response, ApiError> {
    export(&state, &user, ReportKind::Acts, &query).await
}

pub async fn pre_catastrals_report(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Response, ApiError> {
    export(&state, &user, ReportKind::PreCatastrals, &query).await
}
