use crate::notification::model::{NewNotification, NotificationSeverity};
use crate::notification::service::Notifier;
use crate::request::model::{
    CreateRequestRequest, FoodRequest, NewFoodRequest, RequestError, RequestListResponse,
    RequestStatus, RequestSummary,
};
use crate::request::repository::RequestRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Drives a request through its lifecycle.
///
/// Status writes are conditional on the status that was read, so a lost race
/// surfaces as [`RequestError::Conflict`] instead of overwriting the winner.
/// Notifications go out after the write and never undo it.
#[derive(Clone)]
pub struct RequestService {
    repository: Arc<dyn RequestRepository>,
    notifier: Arc<dyn Notifier>,
}

impl RequestService {
    pub fn new(repository: Arc<dyn RequestRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    // Create a new pending request for a listing
    pub async fn submit(
        &self,
        requester_id: Uuid,
        body: CreateRequestRequest,
    ) -> Result<FoodRequest, RequestError> {
        let new_request = NewFoodRequest::validate(requester_id, body)?;

        let listing = self
            .repository
            .listing_owner(new_request.listing_id)
            .await?
            .ok_or(RequestError::ListingNotFound)?;

        let request = self.repository.insert(new_request, Utc::now()).await?;
        info!(
            "Request {} submitted by {} for listing {}",
            request.id, requester_id, listing.listing_id
        );

        self.deliver(NewNotification::about_request(
            listing.donor_id,
            request.id,
            NotificationSeverity::Info,
            "New food request",
            format!(
                "{} requested \"{}\"",
                request.requester_name, listing.title
            ),
        ))
        .await;

        Ok(request)
    }

    pub async fn approve(&self, request_id: Uuid, actor: Uuid) -> Result<FoodRequest, RequestError> {
        self.transition(request_id, actor, RequestStatus::Approved)
            .await
    }

    pub async fn decline(&self, request_id: Uuid, actor: Uuid) -> Result<FoodRequest, RequestError> {
        self.transition(request_id, actor, RequestStatus::Declined)
            .await
    }

    pub async fn complete(
        &self,
        request_id: Uuid,
        actor: Uuid,
    ) -> Result<FoodRequest, RequestError> {
        self.transition(request_id, actor, RequestStatus::Completed)
            .await
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<RequestListResponse, RequestError> {
        let sent = self.repository.list_sent(user_id, status).await?;
        let received = self.repository.list_received(user_id, status).await?;

        Ok(RequestListResponse { sent, received })
    }

    async fn transition(
        &self,
        request_id: Uuid,
        actor: Uuid,
        next: RequestStatus,
    ) -> Result<FoodRequest, RequestError> {
        let current = self
            .repository
            .find(request_id)
            .await?
            .ok_or(RequestError::NotFound)?;

        authorize(&current, actor, next)?;

        let from = current.request.status;
        if !from.can_transition_to(next) {
            if from.is_terminal() {
                info!("Request {} is already {}", request_id, from);
            }
            return Err(RequestError::IllegalTransition { from, to: next });
        }

        let updated = self
            .repository
            .update_status_if(request_id, from, next, Utc::now())
            .await?
            .ok_or_else(|| {
                warn!(
                    "Request {} changed while moving {} -> {}",
                    request_id, from, next
                );
                RequestError::Conflict
            })?;

        info!(
            "Request {} moved {} -> {} by {}",
            request_id, from, next, actor
        );

        if let Some(notification) = transition_notification(&current, &updated, actor) {
            self.deliver(notification).await;
        }

        Ok(updated)
    }

    async fn deliver(&self, notification: NewNotification) {
        let recipient = notification.user_id;
        if let Err(e) = self.notifier.notify(notification).await {
            error!("Failed to notify user {}: {}", recipient, e);
        }
    }
}

/// Donors approve and decline; either party may complete.
fn authorize(
    current: &RequestSummary,
    actor: Uuid,
    next: RequestStatus,
) -> Result<(), RequestError> {
    let is_donor = current.donor_id == actor;
    let is_requester = current.request.requester_id == actor;

    let allowed = match next {
        RequestStatus::Approved | RequestStatus::Declined => is_donor,
        RequestStatus::Completed => is_donor || is_requester,
        RequestStatus::Pending => false,
    };

    if allowed {
        Ok(())
    } else {
        warn!(
            "User {} may not move request {} to {}",
            actor, current.request.id, next
        );
        Err(RequestError::Forbidden)
    }
}

fn transition_notification(
    current: &RequestSummary,
    updated: &FoodRequest,
    actor: Uuid,
) -> Option<NewNotification> {
    let title = &current.listing_title;
    let requester = updated.requester_id;

    match updated.status {
        RequestStatus::Approved => Some(NewNotification::about_request(
            requester,
            updated.id,
            NotificationSeverity::Success,
            "Request approved",
            format!(
                "Your request for \"{}\" was approved. Contact the donor to arrange pickup.",
                title
            ),
        )),
        RequestStatus::Declined => Some(NewNotification::about_request(
            requester,
            updated.id,
            NotificationSeverity::Warning,
            "Request declined",
            format!("Your request for \"{}\" was declined.", title),
        )),
        RequestStatus::Completed => {
            let other_party = if actor == current.donor_id {
                requester
            } else {
                current.donor_id
            };
            Some(NewNotification::about_request(
                other_party,
                updated.id,
                NotificationSeverity::Success,
                "Pickup completed",
                format!("The request for \"{}\" was marked as completed.", title),
            ))
        }
        RequestStatus::Pending => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::model::NotificationError;
    use crate::notification::service::MockNotifier;
    use crate::request::model::ListingOwner;
    use crate::request::repository::MockRequestRepository;
    use chrono::{DateTime, Duration};
    use mockall::predicate::eq;
    use std::sync::Mutex;

    struct Fixture {
        donor: Uuid,
        requester: Uuid,
        listing_id: Uuid,
        request_id: Uuid,
        created_at: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                donor: Uuid::new_v4(),
                requester: Uuid::new_v4(),
                listing_id: Uuid::new_v4(),
                request_id: Uuid::new_v4(),
                created_at: Utc::now() - Duration::hours(2),
            }
        }

        fn request(&self, status: RequestStatus) -> FoodRequest {
            FoodRequest {
                id: self.request_id,
                listing_id: self.listing_id,
                requester_id: self.requester,
                requester_name: "Youssef".to_string(),
                requester_contact: "50 000 000".to_string(),
                message: None,
                status,
                created_at: self.created_at,
                updated_at: self.created_at,
            }
        }

        fn summary(&self, status: RequestStatus) -> RequestSummary {
            RequestSummary {
                request: self.request(status),
                listing_title: "Fresh Bread".to_string(),
                donor_id: self.donor,
            }
        }

        fn body(&self) -> CreateRequestRequest {
            CreateRequestRequest {
                listing_id: self.listing_id,
                requester_name: " Youssef ".to_string(),
                requester_contact: "50 000 000".to_string(),
                message: Some("After 6pm".to_string()),
            }
        }
    }

    fn quiet_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().returning(|_| Ok(()));
        notifier
    }

    fn service(repository: MockRequestRepository, notifier: MockNotifier) -> RequestService {
        RequestService::new(Arc::new(repository), Arc::new(notifier))
    }

    /// Repository backed by a single in-memory request, honoring the
    /// conditional update.
    fn stateful_repository(fixture: &Fixture, initial: RequestStatus) -> MockRequestRepository {
        let state = Arc::new(Mutex::new(fixture.request(initial)));
        let mut repository = MockRequestRepository::new();

        let find_state = state.clone();
        let listing_title = "Fresh Bread".to_string();
        let donor = fixture.donor;
        repository.expect_find().returning(move |_| {
            Ok(Some(RequestSummary {
                request: find_state.lock().unwrap().clone(),
                listing_title: listing_title.clone(),
                donor_id: donor,
            }))
        });

        let update_state = state;
        repository
            .expect_update_status_if()
            .returning(move |_, expected, next, now| {
                let mut current = update_state.lock().unwrap();
                if current.status != expected {
                    return Ok(None);
                }
                current.status = next;
                current.updated_at = now;
                Ok(Some(current.clone()))
            });

        repository
    }

    #[tokio::test]
    async fn test_submit_creates_pending_and_notifies_donor() {
        let fixture = Fixture::new();
        let mut repository = MockRequestRepository::new();

        let owner = ListingOwner {
            listing_id: fixture.listing_id,
            donor_id: fixture.donor,
            title: "Fresh Bread".to_string(),
        };
        repository
            .expect_listing_owner()
            .with(eq(fixture.listing_id))
            .times(1)
            .returning(move |_| Ok(Some(owner.clone())));

        let stored = fixture.request(RequestStatus::Pending);
        let requester = fixture.requester;
        repository
            .expect_insert()
            .withf(move |req, _| req.requester_name == "Youssef" && req.requester_id == requester)
            .times(1)
            .returning(move |_, _| Ok(stored.clone()));

        let donor = fixture.donor;
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |n| n.user_id == donor && n.title == "New food request")
            .times(1)
            .returning(|_| Ok(()));

        let request = service(repository, notifier)
            .submit(fixture.requester, fixture.body())
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_blank_name_creates_nothing() {
        let fixture = Fixture::new();
        let mut repository = MockRequestRepository::new();
        repository.expect_listing_owner().times(0);
        repository.expect_insert().times(0);

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let mut body = fixture.body();
        body.requester_name = "".to_string();

        let result = service(repository, notifier)
            .submit(fixture.requester, body)
            .await;
        assert!(matches!(result, Err(RequestError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_unknown_listing() {
        let fixture = Fixture::new();
        let mut repository = MockRequestRepository::new();
        repository.expect_listing_owner().returning(|_| Ok(None));
        repository.expect_insert().times(0);

        let result = service(repository, MockNotifier::new())
            .submit(fixture.requester, fixture.body())
            .await;
        assert!(matches!(result, Err(RequestError::ListingNotFound)));
    }

    #[tokio::test]
    async fn test_submit_succeeds_when_notification_fails() {
        let fixture = Fixture::new();
        let mut repository = MockRequestRepository::new();

        let owner = ListingOwner {
            listing_id: fixture.listing_id,
            donor_id: fixture.donor,
            title: "Fresh Bread".to_string(),
        };
        repository
            .expect_listing_owner()
            .returning(move |_| Ok(Some(owner.clone())));
        let stored = fixture.request(RequestStatus::Pending);
        repository
            .expect_insert()
            .returning(move |_, _| Ok(stored.clone()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_| Err(NotificationError::DatabaseError(sqlx::Error::PoolTimedOut)));

        let result = service(repository, notifier)
            .submit(fixture.requester, fixture.body())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let fixture = Fixture::new();
        let repository = stateful_repository(&fixture, RequestStatus::Pending);
        let service = service(repository, quiet_notifier());

        let approved = service
            .approve(fixture.request_id, fixture.donor)
            .await
            .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert!(approved.updated_at > fixture.created_at);

        let declined = service.decline(fixture.request_id, fixture.donor).await;
        assert!(matches!(
            declined,
            Err(RequestError::IllegalTransition {
                from: RequestStatus::Approved,
                to: RequestStatus::Declined
            })
        ));

        let completed = service
            .complete(fixture.request_id, fixture.requester)
            .await
            .unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);
    }

    #[tokio::test]
    async fn test_approve_rejected_from_terminal_states() {
        for status in [RequestStatus::Declined, RequestStatus::Completed] {
            let fixture = Fixture::new();
            let summary = fixture.summary(status);

            let mut repository = MockRequestRepository::new();
            repository
                .expect_find()
                .returning(move |_| Ok(Some(summary.clone())));
            repository.expect_update_status_if().times(0);

            let mut notifier = MockNotifier::new();
            notifier.expect_notify().times(0);

            let result = service(repository, notifier)
                .approve(fixture.request_id, fixture.donor)
                .await;

            match result {
                Err(RequestError::IllegalTransition { from, to }) => {
                    assert_eq!(from, status);
                    assert_eq!(to, RequestStatus::Approved);
                }
                other => panic!("Expected IllegalTransition, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_complete_requires_approval() {
        let fixture = Fixture::new();
        let repository = stateful_repository(&fixture, RequestStatus::Pending);

        let result = service(repository, quiet_notifier())
            .complete(fixture.request_id, fixture.donor)
            .await;
        assert!(matches!(
            result,
            Err(RequestError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_only_donor_approves_or_declines() {
        let fixture = Fixture::new();
        let repository = stateful_repository(&fixture, RequestStatus::Pending);
        let service = service(repository, quiet_notifier());

        let by_requester = service
            .approve(fixture.request_id, fixture.requester)
            .await;
        assert!(matches!(by_requester, Err(RequestError::Forbidden)));

        let by_stranger = service.decline(fixture.request_id, Uuid::new_v4()).await;
        assert!(matches!(by_stranger, Err(RequestError::Forbidden)));

        // Still pending, so the donor can act.
        let declined = service
            .decline(fixture.request_id, fixture.donor)
            .await
            .unwrap();
        assert_eq!(declined.status, RequestStatus::Declined);
    }

    #[tokio::test]
    async fn test_stranger_cannot_complete() {
        let fixture = Fixture::new();
        let repository = stateful_repository(&fixture, RequestStatus::Approved);

        let result = service(repository, quiet_notifier())
            .complete(fixture.request_id, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(RequestError::Forbidden)));
    }

    #[tokio::test]
    async fn test_lost_race_reports_conflict() {
        let fixture = Fixture::new();
        let summary = fixture.summary(RequestStatus::Pending);

        let mut repository = MockRequestRepository::new();
        repository
            .expect_find()
            .returning(move |_| Ok(Some(summary.clone())));
        repository
            .expect_update_status_if()
            .with(
                eq(fixture.request_id),
                eq(RequestStatus::Pending),
                eq(RequestStatus::Approved),
                mockall::predicate::always(),
            )
            .times(1)
            .returning(|_, _, _, _| Ok(None));

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let result = service(repository, notifier)
            .approve(fixture.request_id, fixture.donor)
            .await;
        assert!(matches!(result, Err(RequestError::Conflict)));
    }

    #[tokio::test]
    async fn test_persistence_failure_surfaces_without_notifying() {
        let fixture = Fixture::new();
        let summary = fixture.summary(RequestStatus::Pending);

        let mut repository = MockRequestRepository::new();
        repository
            .expect_find()
            .returning(move |_| Ok(Some(summary.clone())));
        repository
            .expect_update_status_if()
            .returning(|_, _, _, _| Err(sqlx::Error::PoolTimedOut));

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let result = service(repository, notifier)
            .approve(fixture.request_id, fixture.donor)
            .await;
        assert!(matches!(result, Err(RequestError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_unknown_request_not_found() {
        let mut repository = MockRequestRepository::new();
        repository.expect_find().returning(|_| Ok(None));

        let result = service(repository, MockNotifier::new())
            .approve(Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(RequestError::NotFound)));
    }

    #[tokio::test]
    async fn test_approval_notifies_requester_even_if_delivery_fails() {
        let fixture = Fixture::new();
        let repository = stateful_repository(&fixture, RequestStatus::Pending);

        let requester = fixture.requester;
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |n| {
                n.user_id == requester
                    && n.severity == NotificationSeverity::Success
                    && n.message.contains("Fresh Bread")
            })
            .times(1)
            .returning(|_| Err(NotificationError::NotFound));

        let approved = service(repository, notifier)
            .approve(fixture.request_id, fixture.donor)
            .await
            .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_completion_notifies_other_party() {
        let fixture = Fixture::new();
        let repository = stateful_repository(&fixture, RequestStatus::Approved);

        let donor = fixture.donor;
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |n| n.user_id == donor && n.title == "Pickup completed")
            .times(1)
            .returning(|_| Ok(()));

        service(repository, notifier)
            .complete(fixture.request_id, fixture.requester)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_for_user_splits_sent_and_received() {
        let fixture = Fixture::new();
        let sent = vec![fixture.summary(RequestStatus::Pending)];
        let mut repository = MockRequestRepository::new();
        repository
            .expect_list_sent()
            .with(eq(fixture.requester), eq(Some(RequestStatus::Pending)))
            .returning(move |_, _| Ok(sent.clone()));
        repository
            .expect_list_received()
            .with(eq(fixture.requester), eq(Some(RequestStatus::Pending)))
            .returning(|_, _| Ok(Vec::new()));

        let response = service(repository, MockNotifier::new())
            .list_for_user(fixture.requester, Some(RequestStatus::Pending))
            .await
            .unwrap();

        assert_eq!(response.sent.len(), 1);
        assert!(response.received.is_empty());
    }
}
