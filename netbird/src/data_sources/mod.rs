//! Data source implementations

pub mod group;
pub mod groups;

pub use group::GroupDataSource;
pub use groups::GroupsDataSource;
