pub mod dispatcher;
pub mod engine;
pub mod request;

pub use dispatcher::QueryDispatcher;
pub use engine::{Matches, QueryEngine, QueryLimits};
pub use request::{QueryKind, QueryRequest, QueryResponse};
