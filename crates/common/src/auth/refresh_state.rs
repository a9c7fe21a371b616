//! Refresh coordination state
//!
//! One [`RefreshState`] belongs to one pipeline. It holds the refresh phase
//! and the ordered list of requests waiting on the current refresh cycle.
//! Every transition happens inside a single `parking_lot` critical section
//! that never spans an `.await`.

use std::collections::VecDeque;

use authpipe_domain::{PipelineError, RequestDescriptor, Response};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;

/// Observable refresh phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PipelineState {
    /// No refresh in flight; requests dispatch directly
    Idle,
    /// A refresh cycle is running; new requests are queued behind it
    RefreshPending { cycle: u64 },
}

impl PipelineState {
    #[must_use]
    pub const fn is_refreshing(self) -> bool {
        matches!(self, Self::RefreshPending { .. })
    }
}

pub(crate) type Completion = oneshot::Sender<Result<Response, PipelineError>>;

/// A caller deferred until the current refresh cycle resolves
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub(crate) id: u64,
    pub(crate) request: RequestDescriptor,
    pub(crate) completion: Completion,
}

/// Handle held by a deferred caller
#[derive(Debug)]
pub(crate) struct Ticket {
    pub(crate) id: u64,
    pub(crate) receiver: oneshot::Receiver<Result<Response, PipelineError>>,
}

/// Result of [`RefreshState::admit`]
#[derive(Debug)]
pub(crate) enum Admission {
    /// No refresh pending; the caller dispatches the request itself.
    /// `generation` is the last cycle started before admission.
    Proceed { request: RequestDescriptor, generation: u64 },
    /// Appended to the waiting list of the running cycle
    Queued(Ticket),
}

/// Result of [`RefreshState::enlist`]
#[derive(Debug)]
pub(crate) enum Enlistment {
    /// This request started `cycle` and is first in its waiting list
    Leader { cycle: u64, ticket: Ticket },
    /// A cycle was already running; appended to its waiting list
    Joined { cycle: u64, ticket: Ticket },
    /// A cycle started and finished after the request was admitted, so the
    /// credential it was sent with has already been replaced
    Superseded(RequestDescriptor),
}

#[derive(Debug)]
struct Inner {
    phase: PipelineState,
    waiting: VecDeque<PendingRequest>,
    next_id: u64,
    cycles: u64,
}

impl Inner {
    fn push(&mut self, request: RequestDescriptor) -> Ticket {
        let id = self.next_id;
        self.next_id += 1;

        let (completion, receiver) = oneshot::channel();
        self.waiting.push_back(PendingRequest { id, request, completion });
        Ticket { id, receiver }
    }
}

/// Per-pipeline refresh phase and waiting list
///
/// Not shared between pipelines. Invariant: at most one refresh cycle is
/// outstanding, and every waiter pushed during a cycle is drained by that
/// cycle's [`complete`](Self::complete).
#[derive(Debug)]
pub struct RefreshState {
    inner: Mutex<Inner>,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: PipelineState::Idle,
                waiting: VecDeque::new(),
                next_id: 0,
                cycles: 0,
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.inner.lock().phase
    }

    /// Number of requests waiting on the current cycle
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.inner.lock().waiting.len()
    }

    /// Queue `request` if a refresh is pending, otherwise hand it back
    pub(crate) fn admit(&self, request: RequestDescriptor) -> Admission {
        let mut inner = self.inner.lock();
        match inner.phase {
            PipelineState::Idle => Admission::Proceed { request, generation: inner.cycles },
            PipelineState::RefreshPending { .. } => Admission::Queued(inner.push(request)),
        }
    }

    /// Register a request that failed authorization on its first attempt
    ///
    /// Starts a new cycle when idle, with `request` first in its waiting
    /// list. Otherwise joins the running cycle. `generation` comes from the
    /// request's [`Admission::Proceed`]; if a cycle has finished since then
    /// no new one is started.
    pub(crate) fn enlist(&self, request: RequestDescriptor, generation: u64) -> Enlistment {
        let mut inner = self.inner.lock();
        match inner.phase {
            PipelineState::Idle if inner.cycles != generation => Enlistment::Superseded(request),
            PipelineState::Idle => {
                inner.cycles += 1;
                let cycle = inner.cycles;
                inner.phase = PipelineState::RefreshPending { cycle };
                let ticket = inner.push(request);
                Enlistment::Leader { cycle, ticket }
            }
            PipelineState::RefreshPending { cycle } => {
                Enlistment::Joined { cycle, ticket: inner.push(request) }
            }
        }
    }

    /// End `cycle`: return to idle and take every waiter in list order
    pub(crate) fn complete(&self, cycle: u64) -> Vec<PendingRequest> {
        let mut inner = self.inner.lock();
        debug_assert_eq!(inner.phase, PipelineState::RefreshPending { cycle });
        inner.phase = PipelineState::Idle;
        inner.waiting.drain(..).collect()
    }

    /// Remove a waiter that is still queued; false once it has been drained
    pub(crate) fn cancel(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        match inner.waiting.iter().position(|pending| pending.id == id) {
            Some(index) => inner.waiting.remove(index).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(waiters: &[PendingRequest]) -> Vec<&str> {
        waiters.iter().map(|pending| pending.request.url.as_str()).collect()
    }

    #[test]
    fn test_admit_proceeds_when_idle() {
        let state = RefreshState::new();
        let admission = state.admit(RequestDescriptor::get("/a"));

        assert!(matches!(
            admission,
            Admission::Proceed { ref request, generation: 0 } if request.url == "/a"
        ));
        assert_eq!(state.waiting(), 0);
    }

    #[test]
    fn test_first_enlist_leads_and_later_ones_join() {
        let state = RefreshState::new();

        let first = state.enlist(RequestDescriptor::get("/a"), 0);
        let second = state.enlist(RequestDescriptor::get("/b"), 0);

        assert!(matches!(first, Enlistment::Leader { cycle: 1, .. }));
        assert!(matches!(second, Enlistment::Joined { cycle: 1, .. }));
        assert_eq!(state.state(), PipelineState::RefreshPending { cycle: 1 });
        assert_eq!(state.waiting(), 2);
    }

    #[test]
    fn test_admit_queues_while_refreshing() {
        let state = RefreshState::new();
        let _leader = state.enlist(RequestDescriptor::get("/trigger"), 0);

        let admission = state.admit(RequestDescriptor::get("/late"));
        assert!(matches!(admission, Admission::Queued(_)));
        assert_eq!(state.waiting(), 2);
    }

    #[test]
    fn test_complete_drains_in_insertion_order_and_goes_idle() {
        let state = RefreshState::new();
        let _a = state.enlist(RequestDescriptor::get("/a"), 0);
        let _b = state.enlist(RequestDescriptor::get("/b"), 0);
        let _c = state.admit(RequestDescriptor::get("/c"));

        let drained = state.complete(1);

        assert_eq!(ids(&drained), vec!["/a", "/b", "/c"]);
        assert_eq!(state.state(), PipelineState::Idle);
        assert_eq!(state.waiting(), 0);
    }

    #[test]
    fn test_cycles_are_numbered() {
        let state = RefreshState::new();
        let _ = state.enlist(RequestDescriptor::get("/a"), 0);
        let _ = state.complete(1);

        let next = state.enlist(RequestDescriptor::get("/b"), 1);
        assert!(matches!(next, Enlistment::Leader { cycle: 2, .. }));
    }

    #[test]
    fn test_enlist_after_finished_cycle_is_superseded() {
        let state = RefreshState::new();
        let Admission::Proceed { generation, .. } = state.admit(RequestDescriptor::get("/late"))
        else {
            panic!("expected proceed");
        };

        let _ = state.enlist(RequestDescriptor::get("/first"), generation);
        let _ = state.complete(1);

        let late = state.enlist(RequestDescriptor::get("/late"), generation);
        assert!(matches!(late, Enlistment::Superseded(ref r) if r.url == "/late"));
        assert_eq!(state.state(), PipelineState::Idle);
        assert_eq!(state.waiting(), 0);

        let Admission::Proceed { generation, .. } = state.admit(RequestDescriptor::get("/next"))
        else {
            panic!("expected proceed");
        };
        assert_eq!(generation, 1);
    }

    #[test]
    fn test_enlist_joins_running_cycle_regardless_of_generation() {
        let state = RefreshState::new();
        let _ = state.enlist(RequestDescriptor::get("/a"), 0);
        let _ = state.complete(1);
        let _ = state.enlist(RequestDescriptor::get("/b"), 1);

        let joined = state.enlist(RequestDescriptor::get("/c"), 0);
        assert!(matches!(joined, Enlistment::Joined { cycle: 2, .. }));
    }

    #[test]
    fn test_cancel_removes_only_queued_waiter() {
        let state = RefreshState::new();
        let _a = state.enlist(RequestDescriptor::get("/a"), 0);
        let Admission::Queued(ticket) = state.admit(RequestDescriptor::get("/b")) else {
            panic!("expected queued admission");
        };

        assert!(state.cancel(ticket.id));
        assert!(!state.cancel(ticket.id));

        let drained = state.complete(1);
        assert_eq!(ids(&drained), vec!["/a"]);
    }

    #[test]
    fn test_cancel_after_drain_is_noop() {
        let state = RefreshState::new();
        let Enlistment::Leader { ticket, .. } = state.enlist(RequestDescriptor::get("/a"), 0) else {
            panic!("expected leader");
        };
        let drained = state.complete(1);

        assert!(!state.cancel(ticket.id));
        assert_eq!(drained.len(), 1);
    }

    #[test]
    fn test_ticket_resolves_only_when_completion_is_sent() {
        use authpipe_domain::Response;
        use tokio_test::{assert_pending, assert_ready_eq, task};

        let state = RefreshState::new();
        let _leader = state.enlist(RequestDescriptor::get("/a"), 0);
        let Admission::Queued(ticket) = state.admit(RequestDescriptor::get("/b")) else {
            panic!("expected queued admission");
        };
        let mut receiver = task::spawn(ticket.receiver);

        assert_pending!(receiver.poll());

        let waiters = state.complete(1);
        assert_pending!(receiver.poll(), "draining alone does not resolve");

        let queued = waiters.into_iter().find(|w| w.id == ticket.id).unwrap();
        let _ = queued.completion.send(Ok(Response::new(204, "")));

        assert!(receiver.is_woken());
        assert_ready_eq!(receiver.poll(), Ok(Ok(Response::new(204, ""))));
    }
}
