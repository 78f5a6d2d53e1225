//! Order change request route handlers.
//!
//! Admins approve or reject; what a decision means for the order is left
//! to the backend.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Redirect, Response},
    routing::{get, post},
};
use printloom_api::ChangeRequestResolution;
use printloom_core::{ChangeRequestId, ChangeRequestStatus, Page, StatusFilter};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::Result,
    filters,
    flash::{Flash, set_flash, take_flash},
    middleware::RequireAdminAuth,
    models::AdminSession,
    state::AppState,
    views::{
        AdminUserView, ChangeRequestView, Pager, SelectOption, query_prefix,
        status_filter_options,
    },
};

use super::{ListQuery, PER_PAGE, render, safe_redirect};

/// Longest admin response accepted.
const MAX_RESPONSE_CHARS: usize = 1000;

/// Change requests list page template.
#[derive(Template)]
#[template(path = "change_requests/index.html")]
pub struct ChangeRequestsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub requests: Vec<ChangeRequestView>,
    pub status_options: Vec<SelectOption>,
    pub pager: Pager,
    /// This page with its filters, for the resolve forms to come back to.
    pub return_to: String,
}

/// Approve/reject form.
#[derive(Debug, Deserialize)]
pub struct ResolveForm {
    #[serde(default)]
    pub admin_response: String,
    pub return_to: Option<String>,
}

impl ResolveForm {
    fn resolution(
        &self,
        status: ChangeRequestStatus,
    ) -> std::result::Result<ChangeRequestResolution, String> {
        let response = self.admin_response.trim();
        if response.chars().count() > MAX_RESPONSE_CHARS {
            return Err(format!(
                "Responses are limited to {MAX_RESPONSE_CHARS} characters."
            ));
        }
        Ok(ChangeRequestResolution {
            status,
            admin_response: (!response.is_empty()).then(|| response.to_string()),
        })
    }
}

/// Build the change requests router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/change-requests", get(index))
        .route("/change-requests/{id}/approve", post(approve))
        .route("/change-requests/{id}/reject", post(reject))
}

/// The list filter; pending requests when no status is given.
fn status_filter(status: Option<&str>) -> StatusFilter<ChangeRequestStatus> {
    StatusFilter::from_query(Some(status.unwrap_or(ChangeRequestStatus::Pending.as_str())))
}

/// Change requests list page handler.
///
/// GET /change-requests
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let requests = state.api().list_change_requests(&current.backend).await?;

    let status = status_filter(query.status.as_deref());
    let selected = status.selected().map_or("ALL", |s| s.as_str());
    let mut requests: Vec<_> = requests
        .into_iter()
        .filter(|request| status.matches(request.status))
        .collect();
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let page = Page::paginate(requests, query.page(), PER_PAGE);
    let prefix = query_prefix(&[("status", selected)]);
    let return_to = format!("/change-requests?{prefix}page={}", page.page);
    let pager = Pager::new(&page, prefix);

    Ok(render(&ChangeRequestsTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/change-requests".to_string(),
        flash: take_flash(&session).await,
        requests: page.items.iter().map(ChangeRequestView::from).collect(),
        status_options: status_filter_options(
            ChangeRequestStatus::all()
                .iter()
                .map(|s| (s.as_str(), s.label())),
            Some(selected),
        ),
        pager,
        return_to,
    }))
}

/// Send a decision to the backend and report it.
async fn resolve(
    state: &AppState,
    session: &Session,
    current: &AdminSession,
    id: ChangeRequestId,
    form: &ResolveForm,
    status: ChangeRequestStatus,
) -> Redirect {
    let flash = match form.resolution(status) {
        Err(message) => Flash::error(message),
        Ok(resolution) => match state
            .api()
            .resolve_change_request(&current.backend, id, &resolution)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    request_id = %id,
                    status = status.as_str(),
                    "Change request resolved"
                );
                Flash::success(format!(
                    "Change request #{id} {}.",
                    status.label().to_lowercase()
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, request_id = %id, "Failed to resolve change request");
                Flash::error(e.user_message())
            }
        },
    };
    set_flash(session, flash).await;
    Redirect::to(&safe_redirect(form.return_to.as_deref(), "/change-requests"))
}

/// Approve a change request.
///
/// POST /change-requests/{id}/approve
#[instrument(skip_all)]
async fn approve(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<ChangeRequestId>,
    Form(form): Form<ResolveForm>,
) -> Redirect {
    resolve(&state, &session, &current, id, &form, ChangeRequestStatus::Approved).await
}

/// Reject a change request.
///
/// POST /change-requests/{id}/reject
#[instrument(skip_all)]
async fn reject(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<ChangeRequestId>,
    Form(form): Form<ResolveForm>,
) -> Redirect {
    resolve(&state, &session, &current, id, &form, ChangeRequestStatus::Rejected).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_pending() {
        assert_eq!(
            status_filter(None),
            StatusFilter::Only(ChangeRequestStatus::Pending)
        );
        assert_eq!(status_filter(Some("ALL")), StatusFilter::All);
        assert_eq!(
            status_filter(Some("approved")),
            StatusFilter::Only(ChangeRequestStatus::Approved)
        );
    }

    #[test]
    fn test_resolution_trims_response() {
        let form = ResolveForm {
            admin_response: "  Refund issued  ".to_string(),
            return_to: None,
        };
        let resolution = form.resolution(ChangeRequestStatus::Approved).unwrap();
        assert_eq!(resolution.admin_response.as_deref(), Some("Refund issued"));

        let blank = ResolveForm {
            admin_response: "   ".to_string(),
            return_to: None,
        };
        let resolution = blank.resolution(ChangeRequestStatus::Rejected).unwrap();
        assert!(resolution.admin_response.is_none());
    }

    #[test]
    fn test_overlong_response_is_rejected() {
        let form = ResolveForm {
            admin_response: "x".repeat(MAX_RESPONSE_CHARS + 1),
            return_to: None,
        };
        assert!(form.resolution(ChangeRequestStatus::Rejected).is_err());
    }
}
