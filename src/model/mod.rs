pub mod hierarchy;
pub mod location;
pub mod result;

pub use hierarchy::{ElementSummary, Hierarchy, SpaceNode, StoreyNode, UNKNOWN_STOREY};
pub use location::{Location, Space, Storey};
pub use result::{ClassificationResult, ClassificationRun, Conversion, Diagnostic};
