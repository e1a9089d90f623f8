mod node;
mod result;
mod seen;

pub use node::{MovePath, SearchNode};
pub use result::SingleAssignmentResult;
pub use seen::SeenSet;

use std::sync::Arc;

pub(crate) type NodeRef<S, M> = Arc<SearchNode<S, M>>;
