use navigation::NavigationGraph;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Identifies one tour load started through [`TourSession::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was started after this one; its result was dropped.
    Stale,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("tour failed to load: {0}")]
    LoadFailed(String),
}

/// Holds the tour currently being viewed.
///
/// Loads may complete out of order. Only the most recently started load is
/// applied; anything older is discarded when it finishes.
#[derive(Debug, Default)]
pub struct TourSession {
    latest: u64,
    graph: Option<NavigationGraph>,
}

impl TourSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest += 1;
        LoadTicket(self.latest)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<NavigationGraph, ClientError>,
    ) -> Result<LoadOutcome, SessionError> {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, latest = self.latest, "discarding stale tour load");
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(graph) => {
                debug!(tour_id = graph.tour_id().0, "tour applied to session");
                self.graph = Some(graph);
                Ok(LoadOutcome::Applied)
            }
            Err(error) => {
                warn!(ticket = ticket.0, %error, "tour failed to load");
                self.graph = None;
                Err(SessionError::LoadFailed(error.to_string()))
            }
        }
    }

    pub fn graph(&self) -> Option<&NavigationGraph> {
        self.graph.as_ref()
    }

    pub fn graph_mut(&mut self) -> Option<&mut NavigationGraph> {
        self.graph.as_mut()
    }

    /// Hands the current graph to a viewer, leaving the session empty.
    pub fn take_graph(&mut self) -> Option<NavigationGraph> {
        self.graph.take()
    }

    /// Drops the current tour and invalidates every load still in flight.
    pub fn close(&mut self) {
        self.latest += 1;
        self.graph = None;
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
