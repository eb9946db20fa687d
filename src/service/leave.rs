//! Leave request lifecycle: create, review (approve / reject), withdraw, report.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::access::{Actor, Capability, authorize};
use crate::error::ServiceError;
use crate::model::leave_request::{
    Decision, LeaveRequest, LeaveResponse, LeaveStats, LeaveStatus, NewLeave,
};
use crate::model::user::UserRef;
use crate::service::audit::AuditRecorder;
use crate::store::{LeaveQuery, Store};

const NOT_FOUND: ServiceError = ServiceError::NotFound("Leave request");

fn validate(input: &mut NewLeave) -> Result<(), ServiceError> {
    if input.start_date > input.end_date {
        return Err(ServiceError::validation("startDate cannot be after endDate"));
    }
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(ServiceError::validation("reason is required"));
    }
    input.reason = reason.to_string();
    Ok(())
}

/// Files a new request owned by `actor`. Always starts `Pending`.
pub async fn create(
    store: &Store,
    audit: &AuditRecorder,
    actor: &Actor,
    mut input: NewLeave,
) -> Result<LeaveRequest, ServiceError> {
    validate(&mut input)?;

    let leave = LeaveRequest::new(actor.id, input);
    store.leaves.insert(&leave).await?;

    info!(leave_id = %leave.id, owner = %actor.id, "Leave request created");
    audit
        .record(
            "leave.created",
            actor.id,
            Some(json!({
                "leaveId": leave.id,
                "type": leave.leave_type,
                "startDate": leave.start_date,
                "endDate": leave.end_date,
            })),
        )
        .await;

    Ok(leave)
}

/// Applies a review decision. Only reviewers may call it and only `Pending`
/// requests move; the store write is conditional so a concurrent reviewer
/// that loses the race gets `InvalidState`.
pub async fn transition(
    store: &Store,
    audit: &AuditRecorder,
    actor: &Actor,
    id: Uuid,
    decision: Decision,
) -> Result<LeaveRequest, ServiceError> {
    authorize(actor, Capability::ReviewLeave)?;

    let leave = store.leaves.find_by_id(id).await?.ok_or(NOT_FOUND)?;
    let next = leave.status.decide(decision)?;

    if !store.leaves.transition(id, next, actor.id).await? {
        debug!(leave_id = %id, "Conditional transition lost");
        return Err(match store.leaves.find_by_id(id).await? {
            Some(current) => LeaveStatus::decide(current.status, decision)
                .err()
                .unwrap_or_else(|| ServiceError::InvalidState("Leave request changed concurrently".into())),
            None => NOT_FOUND,
        });
    }

    info!(leave_id = %id, status = %next, reviewer = %actor.id, "Leave request reviewed");
    audit
        .record(
            decision.audit_action(),
            actor.id,
            Some(json!({ "leaveId": id, "owner": leave.owner_id })),
        )
        .await;

    Ok(LeaveRequest {
        status: next,
        approver_id: Some(actor.id),
        updated_at: Utc::now(),
        ..leave
    })
}

/// Withdraws a request. Owner only, and only while `Pending`.
pub async fn delete(
    store: &Store,
    audit: &AuditRecorder,
    actor: &Actor,
    id: Uuid,
) -> Result<(), ServiceError> {
    let leave = store.leaves.find_by_id(id).await?.ok_or(NOT_FOUND)?;

    if leave.owner_id != actor.id {
        return Err(ServiceError::NotAuthorized);
    }
    if leave.status.is_terminal() {
        return Err(ServiceError::InvalidState(format!(
            "Only pending leave requests can be deleted; this one is {}",
            leave.status
        )));
    }
    if !store.leaves.delete_pending(id).await? {
        return Err(ServiceError::InvalidState(
            "Leave request is no longer pending".into(),
        ));
    }

    info!(leave_id = %id, owner = %actor.id, "Leave request deleted");
    audit
        .record("leave.deleted", actor.id, Some(json!({ "leaveId": id })))
        .await;

    Ok(())
}

/// Counts over every request in the system.
pub async fn stats(store: &Store) -> Result<LeaveStats, ServiceError> {
    Ok(store.leaves.stats().await?)
}

/// Reviewers see every request; everyone else sees their own.
pub async fn list(
    store: &Store,
    actor: &Actor,
    status: Option<LeaveStatus>,
) -> Result<Vec<LeaveRequest>, ServiceError> {
    let query = LeaveQuery {
        owner_id: (!actor.can(Capability::ReviewLeave)).then_some(actor.id),
        status,
    };
    Ok(store.leaves.list(&query).await?)
}

pub async fn get(store: &Store, actor: &Actor, id: Uuid) -> Result<LeaveRequest, ServiceError> {
    let leave = store.leaves.find_by_id(id).await?.ok_or(NOT_FOUND)?;
    if leave.owner_id != actor.id && !actor.can(Capability::ReviewLeave) {
        return Err(NOT_FOUND);
    }
    Ok(leave)
}

/// Resolves owner and approver references in one lookup.
pub async fn populate(
    store: &Store,
    leaves: Vec<LeaveRequest>,
) -> Result<Vec<LeaveResponse>, ServiceError> {
    let mut ids: Vec<Uuid> = leaves
        .iter()
        .flat_map(|l| std::iter::once(l.owner_id).chain(l.approver_id))
        .collect();
    ids.sort();
    ids.dedup();

    let users: HashMap<Uuid, UserRef> = store
        .users
        .find_many(&ids)
        .await?
        .iter()
        .map(|u| (u.id, UserRef::from(u)))
        .collect();

    Ok(leaves
        .into_iter()
        .map(|l| LeaveResponse {
            id: l.id,
            owner: users.get(&l.owner_id).cloned(),
            leave_type: l.leave_type,
            start_date: l.start_date,
            end_date: l.end_date,
            reason: l.reason,
            status: l.status,
            approver: l.approver_id.and_then(|a| users.get(&a).cloned()),
            created_at: l.created_at,
            updated_at: l.updated_at,
        })
        .collect())
}

pub async fn populate_one(store: &Store, leave: LeaveRequest) -> Result<LeaveResponse, ServiceError> {
    populate(store, vec![leave])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::internal("populate returned no rows"))
}
