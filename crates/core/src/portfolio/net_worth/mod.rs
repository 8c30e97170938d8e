//! Net worth module - historical capital curve and forward projection.

mod net_worth_model;
mod timeline_builder;


pub use net_worth_model::{
    MilestoneEstimate, NetWorthTimeline, ProjectionSettings, TimelineDomain, TimelinePoint,
};
pub use timeline_builder::build_net_worth_timeline;
