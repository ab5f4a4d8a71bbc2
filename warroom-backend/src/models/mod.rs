pub mod mission;
pub mod officer;

pub use mission::{
    ManualNote, MissionMetadata, MissionType, NewMission, OfficerMemoryStats,
    OfficerResult,
};
pub use officer::{CapabilityClass, DEFAULT_COLOR, Officer, parse_hex_color};
