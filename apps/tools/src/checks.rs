use std::fmt;

use navigation::{DanglingLink, NavigationGraph};
use shared::domain::{Tour, TourId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkProblem {
    Malformed(String),
    Dangling(DanglingLink),
    Unreachable(String),
}

impl fmt::Display for LinkProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "{reason}"),
            Self::Dangling(link) => write!(f, "{link}"),
            Self::Unreachable(image) => {
                write!(f, "image '{image}' cannot be reached from the first image")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TourReport {
    pub tour_id: TourId,
    pub name: String,
    pub problems: Vec<LinkProblem>,
}

impl TourReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Dangling hotspots and images no walk from the entry image can reach.
/// A tour that does not load at all is reported as a single problem.
pub fn check_tour(tour: &Tour) -> TourReport {
    let problems = match NavigationGraph::load(tour) {
        Ok(graph) => graph
            .dangling_links()
            .into_iter()
            .map(LinkProblem::Dangling)
            .chain(
                graph
                    .unreachable_images()
                    .into_iter()
                    .map(|image| LinkProblem::Unreachable(image.name.clone())),
            )
            .collect(),
        Err(error) => vec![LinkProblem::Malformed(error.to_string())],
    };
    TourReport {
        tour_id: tour.id,
        name: tour.name.clone(),
        problems,
    }
}

#[cfg(test)]
#[path = "tests/checks_tests.rs"]
mod tests;
