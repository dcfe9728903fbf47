pub mod cli;
pub mod credentials;
pub mod input;
pub mod logging;
pub mod parser;
pub mod product;
pub mod schema;
pub mod writer;

pub use cli::{Cli, Commands};
pub use schema::{
    compute_levels, DependencyLeveler, LevelAssignment, LevelError, LevelFormat, Relation,
    UnknownTablePolicy,
};
