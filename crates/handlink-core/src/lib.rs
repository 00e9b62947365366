//! Handlink Core - Landmark frames and the hand skeleton model
//!
//! This crate provides the foundational types for the Handlink system:
//! - Landmark frame decoding from the tracker's JSON datagrams
//! - Bone topology for the 21-joint hand
//! - Skeleton model mapping frames to joint positions and bone segments
//! - Proximity capability trait for touch interaction

pub mod contact;
pub mod landmark;
pub mod skeleton;
pub mod topology;

pub use contact::ProximityListener;
pub use landmark::{decode_frame, DecodeError, FrameError, LandmarkFrame, LANDMARK_COUNT, VALUE_COUNT};
pub use skeleton::{Bone, Joint, ScalingError, ScalingFactor, SkeletonModel};
pub use topology::{is_fingertip, BoneSpec, BoneTopology, TopologyError, FINGERTIPS};
