pub mod entities;
pub mod ids;
pub mod snapshot;

pub use entities::{
    ChannelPartner, Meeting, MeetingOutcome, RelationshipManager, RmStatus, Sale, Target,
};
pub use ids::EntityId;
pub use snapshot::CrmSnapshot;
