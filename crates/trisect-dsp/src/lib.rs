//! Sample-domain building blocks for transient handling: attack/release
//! envelope followers, a dual-envelope onset detector and the transient
//! relocator used when time-stretching the transient stream.

pub mod envelope_follower;
pub mod relocator;

pub use envelope_follower::EnvelopeFollower;
pub use relocator::{
    relocate_transients, OnsetDetector, OverlapPolicy, RelocatorConfig, TransientRelocator,
    TransientSegment,
};
