//! Navigation over a tour's hotspot graph.
//!
//! Images are nodes and hotspots are directed edges from the image they are
//! placed on to their `targetImage`. Targets are resolved when a hotspot is
//! activated, so a tour with dangling links still loads and only the broken
//! hotspot is inert.

mod error;
pub mod graph;
pub mod links;
pub mod viewer;

pub use error::NavigationError;
pub use graph::NavigationGraph;
pub use links::{find_dangling_links, DanglingLink, LinkPolicy};
pub use viewer::{SceneRenderer, Viewer, ViewerEvent};
