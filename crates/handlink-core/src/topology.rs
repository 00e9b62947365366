//! Bone topology: the fixed parent/child joint pairs of the hand skeleton

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmark::LANDMARK_COUNT;

/// Root joint every finger chain starts from
pub const WRIST: usize = 0;
/// Thumb fingertip
pub const THUMB_TIP: usize = 4;
/// Index fingertip
pub const INDEX_TIP: usize = 8;
/// Middle fingertip
pub const MIDDLE_TIP: usize = 12;
/// Ring fingertip
pub const RING_TIP: usize = 16;
/// Little fingertip
pub const PINKY_TIP: usize = 20;

/// Joints that act as contact points for touch interaction
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Joints per finger chain, wrist excluded
const CHAIN_LENGTH: usize = 4;

/// Number of bones in the hand skeleton
pub const HAND_BONE_COUNT: usize = FINGERTIPS.len() * CHAIN_LENGTH;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Bone {bone} references joint {joint}, valid joints are 0..{joint_count}")]
    JointOutOfRange {
        bone: usize,
        joint: usize,
        joint_count: usize,
    },
    #[error("Bone {bone} connects joint {joint} to itself")]
    SelfLoop { bone: usize, joint: usize },
}

/// A static pairing of two joints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoneSpec {
    /// Joint closer to the wrist
    pub parent: usize,
    /// Joint further along the finger
    pub child: usize,
}

impl BoneSpec {
    pub const fn new(parent: usize, child: usize) -> Self {
        Self { parent, child }
    }

    /// Stable name for scene objects, e.g. `Bone_0_1`
    pub fn name(&self) -> String {
        format!("Bone_{}_{}", self.parent, self.child)
    }
}

/// Validated, immutable list of bones
///
/// Every index is checked against the joint count once at construction, so
/// per-frame updates can index joints directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneTopology {
    bones: Vec<BoneSpec>,
}

impl BoneTopology {
    /// Build a topology over [`LANDMARK_COUNT`] joints
    pub fn new(bones: Vec<BoneSpec>) -> Result<Self, TopologyError> {
        for (i, bone) in bones.iter().enumerate() {
            for joint in [bone.parent, bone.child] {
                if joint >= LANDMARK_COUNT {
                    return Err(TopologyError::JointOutOfRange {
                        bone: i,
                        joint,
                        joint_count: LANDMARK_COUNT,
                    });
                }
            }
            if bone.parent == bone.child {
                return Err(TopologyError::SelfLoop {
                    bone: i,
                    joint: bone.parent,
                });
            }
        }
        Ok(Self { bones })
    }

    /// The standard hand: five four-bone chains rooted at the wrist
    ///
    /// Thumb, index, middle, ring, little finger in that order, each running
    /// `0 → base → ... → tip`.
    pub fn hand() -> Self {
        let mut bones = Vec::with_capacity(HAND_BONE_COUNT);
        for finger in 0..FINGERTIPS.len() {
            let base = finger * CHAIN_LENGTH + 1;
            bones.push(BoneSpec::new(WRIST, base));
            for joint in base..base + CHAIN_LENGTH - 1 {
                bones.push(BoneSpec::new(joint, joint + 1));
            }
        }
        Self { bones }
    }

    pub fn bones(&self) -> &[BoneSpec] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Position of the bone connecting `parent` to `child`, if any
    pub fn index_of(&self, parent: usize, child: usize) -> Option<usize> {
        self.bones
            .iter()
            .position(|b| b.parent == parent && b.child == child)
    }
}

impl Default for BoneTopology {
    fn default() -> Self {
        Self::hand()
    }
}

/// Whether `joint` is one of the contact-sensitive fingertips
pub fn is_fingertip(joint: usize) -> bool {
    FINGERTIPS.contains(&joint)
}
