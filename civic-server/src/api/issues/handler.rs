//! Issue API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::auth::{CurrentUser, OfficerUser};
use crate::core::ServerState;
use crate::db::repository::issue::{self, IssueFilter, NewIssue};
use crate::db::repository::comment as comment_repo;
use crate::db::repository::upvote as upvote_repo;
use crate::db::repository::{RepoError, user};
use crate::error::{ServiceError, ServiceResult};
use shared::event::IssueEventType;
use shared::geo::{BoundingBox, haversine_meters};
use shared::models::{
    CommentCreate, Coordinates, Issue, IssueCreate, IssueQuery, IssueStatusUpdate, NearbyIssue,
    NearbyQuery, UpvoteResult, UserRef, normalize_category,
};
use shared::{ApiResponse, AppError, ErrorCode, Pagination};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;
const DEFAULT_REGION: &str = "general";

/// Issues within `radius_m` of `center`, closest first
async fn within_radius(
    state: &ServerState,
    center: Coordinates,
    radius_m: f64,
) -> ServiceResult<Vec<NearbyIssue>> {
    let bbox = BoundingBox::around(center, radius_m);
    let candidates = issue::find_in_box(state.pool(), &bbox).await?;

    let mut nearby: Vec<NearbyIssue> = candidates
        .into_iter()
        .filter_map(|issue| {
            let distance = haversine_meters(center, issue.location.coordinates());
            (distance <= radius_m).then_some(NearbyIssue { issue, distance })
        })
        .collect();
    nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(nearby)
}

/// POST /api/issues/create
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<IssueCreate>,
) -> ServiceResult<Json<ApiResponse<Issue>>> {
    let text = payload.text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::new(ErrorCode::IssueTextEmpty).into());
    }

    let location = payload
        .location
        .ok_or_else(|| AppError::new(ErrorCode::LocationRequired))?;
    location.validate()?;

    let region = payload
        .region
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let created = issue::create(
        state.pool(),
        NewIssue {
            text,
            image_link: payload
                .image_link
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            location,
            category: normalize_category(&payload.category),
            region,
            priority: payload.priority.unwrap_or_default(),
            reported_by: current.id.clone(),
        },
    )
    .await?;

    tracing::info!(
        issue_id = %created.id,
        category = %created.category,
        reporter = %current.id,
        "Issue reported"
    );
    state
        .live
        .publish_data(IssueEventType::IssueCreated, &created);

    Ok(Json(ApiResponse::success_with_message(
        "Issue reported",
        created,
    )))
}

/// GET /api/issues
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<IssueQuery>,
) -> ServiceResult<Json<ApiResponse<Vec<Issue>>>> {
    let page = query.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let filter = IssueFilter {
        status: query.status,
        category: query
            .category
            .filter(|c| !c.trim().is_empty())
            .map(|c| normalize_category(&c)),
        region: query.region.filter(|r| !r.trim().is_empty()),
        priority: query.priority,
        reported_by: query.reported_by.filter(|r| !r.is_empty()),
    };

    let offset = u64::from(page - 1) * u64::from(limit);
    let (issues, total) = issue::list(state.pool(), &filter, limit, offset).await?;
    let pagination = Pagination::new(page, limit, total);

    Ok(Json(ApiResponse::list(issues, Some(pagination))))
}

/// GET /api/issues/nearby
pub async fn nearby(
    State(state): State<ServerState>,
    Query(query): Query<NearbyQuery>,
) -> ServiceResult<Json<ApiResponse<Vec<NearbyIssue>>>> {
    let center = Coordinates::new(query.latitude, query.longitude);
    center.validate()?;

    let radius_m = query
        .max_distance
        .unwrap_or(state.config.nearby_default_radius_m);
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "maxDistance must be a positive number of meters",
        )
        .with_detail("field", "maxDistance")
        .into());
    }

    let nearby = within_radius(&state, center, radius_m).await?;
    tracing::debug!(
        latitude = center.latitude,
        longitude = center.longitude,
        radius_m,
        found = nearby.len(),
        "Nearby search"
    );
    Ok(Json(ApiResponse::list(nearby, None)))
}

/// GET /api/issues/my
pub async fn my_issues(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> ServiceResult<Json<ApiResponse<Vec<Issue>>>> {
    let filter = IssueFilter {
        reported_by: Some(current.id),
        ..IssueFilter::default()
    };
    let issues = issue::list_all(state.pool(), &filter).await?;
    Ok(Json(ApiResponse::list(issues, None)))
}

/// GET /api/issues/officer/dashboard
///
/// Officers registered with a station location see the issues around it;
/// the rest see everything.
pub async fn officer_dashboard(
    State(state): State<ServerState>,
    OfficerUser(officer): OfficerUser,
) -> ServiceResult<Json<ApiResponse<Vec<Issue>>>> {
    let station = user::find_by_id(state.pool(), &officer.id)
        .await?
        .and_then(|u| u.location);

    let issues = match station {
        Some(location) => {
            let mut issues: Vec<Issue> =
                within_radius(&state, location.coordinates(), state.config.officer_radius_m)
                    .await?
                    .into_iter()
                    .map(|n| n.issue)
                    .collect();
            issues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            issues
        }
        None => issue::list_all(state.pool(), &IssueFilter::default()).await?,
    };

    Ok(Json(ApiResponse::list(issues, None)))
}

/// GET /api/issues/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<ApiResponse<Issue>>> {
    let found = issue::find_by_id(state.pool(), &id)
        .await?
        .ok_or_else(|| AppError::issue_not_found(&id))?;
    Ok(Json(ApiResponse::success(found)))
}

/// PATCH /api/issues/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    OfficerUser(officer): OfficerUser,
    Path(id): Path<String>,
    Json(payload): Json<IssueStatusUpdate>,
) -> ServiceResult<Json<ApiResponse<Issue>>> {
    let current = issue::status_of(state.pool(), &id)
        .await?
        .ok_or_else(|| AppError::issue_not_found(&id))?;

    let rejected = || {
        AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("Cannot move issue from {} to {}", current, payload.status),
        )
        .with_detail("from", current.as_str())
        .with_detail("to", payload.status.as_str())
    };

    if !current.can_transition_to(payload.status) {
        return Err(rejected().into());
    }
    if !issue::update_status(state.pool(), &id, current, payload.status).await? {
        // another officer moved it first
        return Err(rejected().into());
    }

    let updated = issue::find_by_id(state.pool(), &id)
        .await?
        .ok_or_else(|| AppError::issue_not_found(&id))?;

    tracing::info!(
        issue_id = %id,
        from = %current,
        to = %updated.status,
        officer = %officer.id,
        "Issue status changed"
    );
    state
        .live
        .publish_data(IssueEventType::IssueUpdated, &updated);

    Ok(Json(ApiResponse::success_with_message(
        "Status updated",
        updated,
    )))
}

/// POST /api/issues/{id}/upvote
pub async fn upvote(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<ApiResponse<UpvoteResult>>> {
    let upvotes = upvote_repo::add(state.pool(), &id, &current.id)
        .await
        .map_err(|e| -> ServiceError {
            match e {
                RepoError::Duplicate(_) => AppError::new(ErrorCode::AlreadyUpvoted).into(),
                RepoError::NotFound(_) => AppError::issue_not_found(&id).into(),
                other => other.into(),
            }
        })?;

    let result = UpvoteResult {
        id: id.clone(),
        upvotes,
    };
    state
        .live
        .publish_data(IssueEventType::IssueUpvoted, &result);

    Ok(Json(ApiResponse::success(result)))
}

/// POST /api/issues/{id}/comment
pub async fn comment(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CommentCreate>,
) -> ServiceResult<Json<ApiResponse<Issue>>> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::new(ErrorCode::CommentEmpty).into());
    }

    if issue::status_of(state.pool(), &id).await?.is_none() {
        return Err(AppError::issue_not_found(&id).into());
    }

    let author = UserRef {
        id: current.id.clone(),
        name: current.name.clone(),
    };
    comment_repo::add(state.pool(), &id, &author, text).await?;
    issue::touch(state.pool(), &id).await?;

    let updated = issue::find_by_id(state.pool(), &id)
        .await?
        .ok_or_else(|| AppError::issue_not_found(&id))?;
    Ok(Json(ApiResponse::success_with_message("Comment added", updated)))
}
