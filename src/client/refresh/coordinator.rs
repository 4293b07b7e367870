//! Start-or-join coordination for token refreshes.
//!
//! At most one refresh flight exists per coordinator. Every caller that observes a 401 while a
//! flight is open awaits the same [`OnceCell`]; the first caller to poll it runs the refresh
//! body, and if that caller is dropped mid-refresh another participant picks the body up, so
//! abandoning one request never strands the others. Once settled, the flight is removed and the
//! outcome is remembered together with its generation so requests that were sent before the
//! settlement adopt it instead of refreshing again.

// crates.io
use async_lock::OnceCell;
// self
use crate::{_prelude::*, auth::Credential, error::RefreshFailure};

/// Result shared by every participant of one refresh flight.
pub(crate) type RefreshOutcome = Result<Credential, RefreshFailure>;

/// Refresh generation observed when a request was sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Ticket(u64);

/// Outcome handed to one participant.
#[derive(Debug)]
pub(crate) struct Settlement {
	/// Generation that produced the outcome.
	pub(crate) generation: u64,
	pub(crate) outcome: RefreshOutcome,
	/// `true` when the participant reused a flight it did not open.
	pub(crate) joined: bool,
}

/// What a rejected retry means for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Expiry {
	/// The caller ends the session.
	Teardown,
	/// Another caller already ended the session for this generation.
	Expired,
	/// A newer refresh replaced the generation the retry used.
	Superseded,
}

#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator {
	state: Mutex<FlightState>,
}
impl RefreshCoordinator {
	/// Returns the current generation for a request about to be sent.
	pub(crate) fn ticket(&self) -> Ticket {
		Ticket(self.state.lock().generation)
	}

	/// Returns `true` while a refresh flight is open.
	pub(crate) fn in_flight(&self) -> bool {
		self.state.lock().in_flight.is_some()
	}

	/// Joins the open flight, adopts an outcome settled after `ticket`, or opens a new flight
	/// driven by `refresh`.
	pub(crate) async fn start_or_join<F, Fut>(&self, ticket: Ticket, refresh: F) -> Settlement
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = RefreshOutcome>,
	{
		let (flight, joined) = match self.claim(ticket) {
			Claim::Settled { generation, outcome } =>
				return Settlement { generation, outcome, joined: true },
			Claim::Join(flight) => (flight, true),
			Claim::Lead(flight) => (flight, false),
		};
		let generation = flight.generation;
		let outcome = flight
			.outcome
			.get_or_init(|| async move {
				let outcome = refresh().await;

				self.settle(generation, &outcome);

				outcome
			})
			.await
			.clone();

		Settlement { generation, outcome, joined }
	}

	/// Invalidates a successful generation whose renewed token was rejected on retry.
	///
	/// Only the first caller for the latest generation gets [`Expiry::Teardown`]. A generation
	/// that a newer flight replaced (settled or still running) is left untouched.
	pub(crate) fn expire(&self, generation: u64) -> Expiry {
		let mut state = self.state.lock();

		if state.in_flight.as_ref().is_some_and(|flight| flight.generation > generation) {
			return Expiry::Superseded;
		}

		match state.settled.as_mut() {
			Some(settled) if settled.generation == generation =>
				if settled.expired {
					Expiry::Expired
				} else {
					settled.expired = true;
					settled.outcome = Err(RefreshFailure::RetryRejected);

					Expiry::Teardown
				},
			_ => Expiry::Superseded,
		}
	}

	fn claim(&self, ticket: Ticket) -> Claim {
		let mut state = self.state.lock();

		if let Some(flight) = state.in_flight.as_ref() {
			return Claim::Join(flight.clone());
		}
		if let Some(settled) = state.settled.as_ref().filter(|s| s.generation > ticket.0) {
			return Claim::Settled {
				generation: settled.generation,
				outcome: settled.outcome.clone(),
			};
		}

		let flight =
			Arc::new(Flight { generation: state.generation + 1, outcome: OnceCell::new() });

		state.in_flight = Some(flight.clone());

		Claim::Lead(flight)
	}

	fn settle(&self, generation: u64, outcome: &RefreshOutcome) {
		let mut state = self.state.lock();

		if state.in_flight.as_ref().is_some_and(|flight| flight.generation == generation) {
			state.in_flight = None;
		}

		state.generation = state.generation.max(generation);
		state.settled =
			Some(Settled { generation, outcome: outcome.clone(), expired: outcome.is_err() });
	}
}

#[derive(Debug, Default)]
struct FlightState {
	generation: u64,
	in_flight: Option<Arc<Flight>>,
	settled: Option<Settled>,
}

#[derive(Debug)]
struct Flight {
	generation: u64,
	outcome: OnceCell<RefreshOutcome>,
}

#[derive(Debug)]
struct Settled {
	generation: u64,
	outcome: RefreshOutcome,
	expired: bool,
}

enum Claim {
	Lead(Arc<Flight>),
	Join(Arc<Flight>),
	Settled { generation: u64, outcome: RefreshOutcome },
}
