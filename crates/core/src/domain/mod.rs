pub mod recommendation;
pub mod sections;
pub mod snapshot;
