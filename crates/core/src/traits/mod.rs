//! Collaborator traits implemented by the data layer
//!
//! ```text
//! OrgDirectory:  agents, area managers, division heads
//! ActivityStore: activity counts/history, sales totals/history, products
//! SalesRepository: both, as one handle
//! ```

mod activity_store;
mod directory;

pub use activity_store::ActivityStore;
pub use directory::OrgDirectory;

/// Single handle over both collaborator traits
pub trait SalesRepository: OrgDirectory + ActivityStore {}

impl<T: OrgDirectory + ActivityStore> SalesRepository for T {}
