pub mod ids;
pub mod personalization;
pub mod resolver;

pub use ids::IdGenerator;
pub use personalization::PurchaseHistory;
pub use resolver::AuctionResolver;
