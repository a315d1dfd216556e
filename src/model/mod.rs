pub mod auction;
pub mod catalog;
pub mod events;
pub mod status;

pub use auction::{AuctionRequest, AuctionResponse, AuctionResult, AuctionSlotSpec, SlotKind, Winner, WinnerType};
pub use catalog::{Catalog, Product, DEMO_CATALOG};
pub use events::{AckStatus, Click, Event, EventAck, EventBatch, Impression, Purchase, PurchaseItem};
pub use status::{ApiHealth, ErrorKind, ErrorRecord, IntegrationStatus, Operation, PerformanceReport};
