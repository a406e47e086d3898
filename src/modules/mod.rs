pub mod access;
pub mod profiles;

pub use self::access::{AccessDecision, PolicyEvaluator, PolicyTable, Predicate};
pub use self::profiles::ProfileService;
