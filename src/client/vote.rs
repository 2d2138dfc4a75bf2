//! Optimistic voting.
//!
//! A vote or unvote is applied to the local poll before the request goes out and
//! reverted if it fails. Each poll carries a `VoteStatus`; while it is not `Idle`
//! further vote/unvote calls on that poll are no-ops, so at most one mutation per poll
//! is outstanding.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use super::{lock, Session, VotesApi};
use crate::errors::AppError;
use crate::models::{MyVote, OptionId, View, ViewId};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoteStatus {
    #[default]
    Idle,
    /// Cast request in flight.
    Voting,
    /// Retract request in flight.
    Canceling,
}

/// Broadcast after the server confirms, so other renderings of the same poll can
/// catch up without a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteEvent {
    Voted { view_id: ViewId, option_id: OptionId },
    Unvoted { view_id: ViewId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The server accepted the change.
    Committed,
    /// Nothing was sent: a request is already in flight or the precondition does not
    /// hold (already voted / nothing to retract).
    Skipped,
}

/// One poll as held by a card, plus its in-flight status.
#[derive(Debug, Clone)]
pub struct PollState {
    view: View,
    status: VoteStatus,
    /// Bumped whenever the view is replaced with server data.
    revision: u64,
}

pub type PollHandle = Arc<Mutex<PollState>>;

impl PollState {
    pub fn new(view: View) -> Self {
        Self {
            view,
            status: VoteStatus::Idle,
            revision: 0,
        }
    }

    pub fn shared(view: View) -> PollHandle {
        Arc::new(Mutex::new(Self::new(view)))
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn status(&self) -> VoteStatus {
        self.status
    }

    /// Take server truth (e.g. after a refresh). A request still in flight will not
    /// roll back over it.
    pub fn replace(&mut self, view: View) {
        self.view = view;
        self.revision += 1;
    }
}

/// Exact pre-mutation values, restored on failure.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    revision: u64,
    my_vote: Option<MyVote>,
    option_id: OptionId,
    option_votes: i64,
    total_votes: i64,
}

impl Snapshot {
    fn capture(poll: &PollState, option_id: OptionId) -> Option<Self> {
        let option = poll.view.option(option_id)?;
        Some(Self {
            revision: poll.revision,
            my_vote: poll.view.my_vote,
            option_id,
            option_votes: option.votes_count,
            total_votes: poll.view.total_votes,
        })
    }

    /// Put the captured values back. Skipped when the poll was replaced meanwhile.
    fn restore(self, poll: &mut PollState) -> bool {
        if poll.revision != self.revision {
            return false;
        }
        poll.view.my_vote = self.my_vote;
        poll.view.total_votes = self.total_votes;
        if let Some(option) = poll.view.option_mut(self.option_id) {
            option.votes_count = self.option_votes;
        }
        true
    }
}

pub struct VoteController<A: ?Sized> {
    api: Arc<A>,
    session: Session,
    events: broadcast::Sender<VoteEvent>,
}

impl<A: VotesApi + ?Sized> VoteController<A> {
    pub fn new(api: Arc<A>, session: Session) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            session,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Cast a vote for `option_id`.
    pub async fn vote(
        &self,
        poll: &PollHandle,
        option_id: OptionId,
    ) -> Result<VoteOutcome, AppError> {
        if !self.session.is_authenticated() {
            self.session.require_login("Login required to vote");
            return Err(AppError::login_required());
        }

        let (view_id, snapshot) = {
            let mut state = lock(poll);
            if state.status != VoteStatus::Idle || state.view.my_vote.is_some() {
                return Ok(VoteOutcome::Skipped);
            }
            let snapshot = Snapshot::capture(&state, option_id).ok_or_else(|| {
                AppError::Validation(format!("Unknown option {}", option_id))
            })?;

            state.view.apply_vote(option_id);
            state.status = VoteStatus::Voting;
            (state.view.id, snapshot)
        };

        let result = self.api.cast_vote(view_id, option_id).await;

        let mut state = lock(poll);
        state.status = VoteStatus::Idle;
        match result {
            Ok(()) => {
                drop(state);
                let _ = self.events.send(VoteEvent::Voted { view_id, option_id });
                Ok(VoteOutcome::Committed)
            }
            Err(e) => {
                if snapshot.restore(&mut state) {
                    tracing::warn!("Vote on view {} rolled back: {}", view_id, e);
                } else {
                    tracing::debug!("Vote on view {} failed after a refresh: {}", view_id, e);
                }
                drop(state);
                self.session.report(&e);
                Err(e)
            }
        }
    }

    /// Retract the caller's vote.
    pub async fn unvote(&self, poll: &PollHandle) -> Result<VoteOutcome, AppError> {
        if !self.session.is_authenticated() {
            self.session.require_login("Login required to cancel a vote");
            return Err(AppError::login_required());
        }

        let (view_id, snapshot) = {
            let mut state = lock(poll);
            if state.status != VoteStatus::Idle {
                return Ok(VoteOutcome::Skipped);
            }
            let Some(previous) = state.view.voted_option() else {
                return Ok(VoteOutcome::Skipped);
            };
            let Some(snapshot) = Snapshot::capture(&state, previous) else {
                return Ok(VoteOutcome::Skipped);
            };

            state.view.apply_unvote();
            state.status = VoteStatus::Canceling;
            (state.view.id, snapshot)
        };

        let result = self.api.retract_vote(view_id).await;

        let mut state = lock(poll);
        state.status = VoteStatus::Idle;
        match result {
            Ok(()) => {
                drop(state);
                let _ = self.events.send(VoteEvent::Unvoted { view_id });
                Ok(VoteOutcome::Committed)
            }
            Err(e) => {
                if snapshot.restore(&mut state) {
                    tracing::warn!("Unvote on view {} rolled back: {}", view_id, e);
                }
                drop(state);
                self.session.report(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::MockApi;
    use crate::models::{sample_view, CurrentUser};

    fn scenario_poll() -> PollHandle {
        PollState::shared(sample_view(1, &[(10, 5), (11, 3)]))
    }

    fn signed_in(api: &Arc<MockApi>) -> VoteController<MockApi> {
        VoteController::new(api.clone(), Session::signed_in(CurrentUser { id: 1 }))
    }

    fn counts(poll: &PollHandle) -> (i64, i64, Option<MyVote>) {
        let state = lock(poll);
        (
            state.view().total_votes,
            state.view().option(10).unwrap().votes_count,
            state.view().my_vote,
        )
    }

    #[tokio::test]
    async fn test_happy_path_vote() {
        let api = Arc::new(MockApi::default());
        let gate = api.hold_votes();
        let controller = signed_in(&api);
        let mut events = controller.subscribe();
        let poll = scenario_poll();

        let observe = async {
            // optimistic state is visible while the request is held
            tokio::task::yield_now().await;
            assert_eq!(
                counts(&poll),
                (9, 6, Some(MyVote { option_id: 10 }))
            );
            assert_eq!(lock(&poll).status(), VoteStatus::Voting);
            gate.notify_one();
        };
        let (outcome, ()) = tokio::join!(controller.vote(&poll, 10), observe);

        assert_eq!(outcome, Ok(VoteOutcome::Committed));
        assert_eq!(counts(&poll), (9, 6, Some(MyVote { option_id: 10 })));
        assert_eq!(lock(&poll).status(), VoteStatus::Idle);
        assert_eq!(
            events.try_recv().unwrap(),
            VoteEvent::Voted {
                view_id: 1,
                option_id: 10
            }
        );
        assert_eq!(api.cast_votes(), vec![(1, 10)]);
    }

    #[tokio::test]
    async fn test_failed_vote_rolls_back() {
        let api = Arc::new(MockApi::default());
        api.fail_votes(AppError::Network("offline".to_string()));
        let controller = signed_in(&api);
        let mut events = controller.subscribe();
        let poll = scenario_poll();

        let result = controller.vote(&poll, 10).await;

        assert_eq!(result, Err(AppError::Network("offline".to_string())));
        assert_eq!(counts(&poll), (8, 5, None));
        assert_eq!(lock(&poll).status(), VoteStatus::Idle);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_repeated_failures_do_not_drift() {
        let api = Arc::new(MockApi::default());
        api.fail_votes(AppError::Upstream {
            status: 500,
            message: "boom".to_string(),
        });
        let controller = signed_in(&api);
        let poll = scenario_poll();

        for _ in 0..5 {
            assert!(controller.vote(&poll, 10).await.is_err());
            assert_eq!(counts(&poll), (8, 5, None));
        }
        assert!(lock(&poll).view().is_consistent());
    }

    #[tokio::test]
    async fn test_second_vote_while_in_flight_is_skipped() {
        let api = Arc::new(MockApi::default());
        let gate = api.hold_votes();
        let controller = signed_in(&api);
        let poll = scenario_poll();

        let second = async {
            tokio::task::yield_now().await;
            let outcome = controller.vote(&poll, 11).await;
            let unvote = controller.unvote(&poll).await;
            gate.notify_one();
            (outcome, unvote)
        };
        let (first, (second, unvote)) = tokio::join!(controller.vote(&poll, 10), second);

        assert_eq!(first, Ok(VoteOutcome::Committed));
        assert_eq!(second, Ok(VoteOutcome::Skipped));
        assert_eq!(unvote, Ok(VoteOutcome::Skipped));
        assert_eq!(api.cast_votes(), vec![(1, 10)]);
        assert_eq!(api.retracted_votes(), Vec::<ViewId>::new());
    }

    #[tokio::test]
    async fn test_vote_when_already_voted_is_skipped() {
        let api = Arc::new(MockApi::default());
        let controller = signed_in(&api);
        let poll = scenario_poll();

        controller.vote(&poll, 10).await.unwrap();
        assert_eq!(controller.vote(&poll, 11).await, Ok(VoteOutcome::Skipped));
        assert_eq!(api.cast_votes().len(), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_vote_prompts_login() {
        let api = Arc::new(MockApi::default());
        let session = Session::anonymous();
        let mut prompts = session.subscribe();
        let controller = VoteController::new(api.clone(), session);
        let poll = scenario_poll();

        let result = controller.vote(&poll, 10).await;

        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
        assert!(prompts.try_recv().is_ok());
        assert_eq!(counts(&poll), (8, 5, None));
        assert!(api.cast_votes().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_option_is_rejected_without_request() {
        let api = Arc::new(MockApi::default());
        let controller = signed_in(&api);
        let poll = scenario_poll();

        assert!(matches!(
            controller.vote(&poll, 99).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(counts(&poll), (8, 5, None));
        assert_eq!(lock(&poll).status(), VoteStatus::Idle);
    }

    #[tokio::test]
    async fn test_unvote_commits_and_rolls_back() {
        let api = Arc::new(MockApi::default());
        let controller = signed_in(&api);
        let mut events = controller.subscribe();
        let poll = scenario_poll();
        controller.vote(&poll, 10).await.unwrap();
        let _ = events.try_recv();

        api.fail_retracts(AppError::Network("offline".to_string()));
        assert!(controller.unvote(&poll).await.is_err());
        assert_eq!(counts(&poll), (9, 6, Some(MyVote { option_id: 10 })));

        api.clear_failures();
        assert_eq!(controller.unvote(&poll).await, Ok(VoteOutcome::Committed));
        assert_eq!(counts(&poll), (8, 5, None));
        assert_eq!(
            events.try_recv().unwrap(),
            VoteEvent::Unvoted { view_id: 1 }
        );
        assert_eq!(controller.unvote(&poll).await, Ok(VoteOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_upstream_401_prompts_login() {
        let api = Arc::new(MockApi::default());
        api.fail_votes(AppError::Upstream {
            status: 401,
            message: "Token expired".to_string(),
        });
        let controller = signed_in(&api);
        let mut prompts = controller.session().subscribe();
        let poll = scenario_poll();

        assert!(controller.vote(&poll, 10).await.is_err());
        assert_eq!(counts(&poll), (8, 5, None));
        assert_eq!(prompts.try_recv().unwrap().reason, "Token expired");
        assert!(!controller.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_during_flight_wins_over_rollback() {
        let api = Arc::new(MockApi::default());
        api.fail_votes(AppError::Network("offline".to_string()));
        let gate = api.hold_votes();
        let controller = signed_in(&api);
        let poll = scenario_poll();

        let refresh = async {
            tokio::task::yield_now().await;
            let mut fresh = sample_view(1, &[(10, 20), (11, 3)]);
            fresh.title = "Server copy".to_string();
            lock(&poll).replace(fresh);
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(controller.vote(&poll, 10), refresh);

        assert!(result.is_err());
        assert_eq!(counts(&poll), (23, 20, None));
        assert_eq!(lock(&poll).view().title, "Server copy");
    }
}
