//! Live hand skeleton driven by landmark frames
//!
//! Landmarks arrive in the tracker's normalized image space: x and y in
//! `[0, 1]` with y growing downward, z growing away from the viewer. The
//! scene expects a right-handed, Y-up space centered on the origin, so each
//! landmark `(x, y, z)` maps to
//!
//! ```text
//! ((x - 0.5) * s, -(y - 0.5) * s, -z * s)
//! ```
//!
//! where `s` is the [`ScalingFactor`]. Renderers depend on this mapping, so
//! it must not change without updating the sender.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{trace, warn};

use crate::landmark::{FrameError, LandmarkFrame, LANDMARK_COUNT};
use crate::topology::{is_fingertip, BoneSpec, BoneTopology};

/// Joint sphere diameter at unit scale
pub const JOINT_DIAMETER: f32 = 0.01;

/// Bone cylinder thickness at unit scale
pub const BONE_THICKNESS: f32 = 0.005;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScalingError {
    #[error("Scaling factor must be finite and positive, got {0}")]
    Invalid(f32),
}

/// Uniform scale applied to joint positions and bone thickness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct ScalingFactor(f32);

impl ScalingFactor {
    pub fn new(value: f32) -> Result<Self, ScalingError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(ScalingError::Invalid(value))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for ScalingFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

impl TryFrom<f32> for ScalingFactor {
    type Error = ScalingError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScalingFactor> for f32 {
    fn from(scale: ScalingFactor) -> Self {
        scale.0
    }
}

/// Map a normalized landmark into scene space
pub fn landmark_to_scene(landmark: Vec3, scale: ScalingFactor) -> Vec3 {
    let s = scale.get();
    Vec3::new(
        (landmark.x - 0.5) * s,
        -(landmark.y - 0.5) * s,
        -landmark.z * s,
    )
}

/// A tracked joint and its current scene position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub index: usize,
    pub position: Vec3,
}

impl Joint {
    /// Whether this joint is a touch contact point
    pub fn is_fingertip(&self) -> bool {
        is_fingertip(self.index)
    }

    /// Stable name for scene objects, e.g. `Joint_4`
    pub fn name(&self) -> String {
        format!("Joint_{}", self.index)
    }
}

/// Segment between two joints, recomputed from their positions every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    pub spec: BoneSpec,
    /// Halfway point between the two joints
    pub midpoint: Vec3,
    /// Unit vector from parent to child joint
    ///
    /// Keeps its last value while the joints coincide.
    pub direction: Vec3,
    /// Distance between the two joints
    pub length: f32,
    /// Cylinder thickness in scene units
    pub thickness: f32,
}

impl Bone {
    fn rest(spec: BoneSpec, thickness: f32) -> Self {
        Self {
            spec,
            midpoint: Vec3::ZERO,
            direction: Vec3::Y,
            length: 0.0,
            thickness,
        }
    }

    /// Rotation taking the cylinder's local +Y axis onto the bone direction
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_arc(Vec3::Y, self.direction)
    }

    /// Scale for a unit cylinder (height 2 along Y) spanning the bone
    pub fn scale(&self) -> Vec3 {
        Vec3::new(self.thickness, self.length / 2.0, self.thickness)
    }

    fn update(&mut self, start: Vec3, end: Vec3) {
        let delta = end - start;
        self.midpoint = (start + end) / 2.0;
        self.length = delta.length();
        match delta.try_normalize() {
            Some(direction) => self.direction = direction,
            None => trace!(bone = %self.spec.name(), "Coincident joints, keeping bone direction"),
        }
    }
}

/// Joint positions and derived bones for one hand
pub struct SkeletonModel {
    scale: ScalingFactor,
    topology: BoneTopology,
    joints: [Joint; LANDMARK_COUNT],
    bones: Vec<Bone>,
    frames_applied: u64,
}

impl SkeletonModel {
    /// Create a hand skeleton at rest with the standard bone layout
    pub fn new(scale: ScalingFactor) -> Self {
        Self::with_topology(BoneTopology::hand(), scale)
    }

    /// Create a skeleton with a custom bone layout
    pub fn with_topology(topology: BoneTopology, scale: ScalingFactor) -> Self {
        let mut joints = [Joint {
            index: 0,
            position: Vec3::ZERO,
        }; LANDMARK_COUNT];
        for (i, joint) in joints.iter_mut().enumerate() {
            joint.index = i;
        }

        let thickness = BONE_THICKNESS * scale.get();
        let bones = topology
            .bones()
            .iter()
            .map(|&spec| Bone::rest(spec, thickness))
            .collect();

        Self {
            scale,
            topology,
            joints,
            bones,
            frames_applied: 0,
        }
    }

    /// Update every joint and bone from one frame
    pub fn apply_frame(&mut self, frame: &LandmarkFrame) {
        for (joint, landmark) in self.joints.iter_mut().zip(frame.landmarks()) {
            joint.position = landmark_to_scene(landmark, self.scale);
        }

        for bone in &mut self.bones {
            let start = self.joints[bone.spec.parent].position;
            let end = self.joints[bone.spec.child].position;
            bone.update(start, end);
        }

        self.frames_applied += 1;
    }

    /// Update from a raw coordinate array
    ///
    /// Arrays of the wrong length are rejected and leave the model untouched.
    pub fn apply_values(&mut self, values: &[f32]) -> Result<(), FrameError> {
        match LandmarkFrame::from_slice(values) {
            Ok(frame) => {
                self.apply_frame(&frame);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Invalid landmark data received");
                Err(e)
            }
        }
    }

    pub fn scale(&self) -> ScalingFactor {
        self.scale
    }

    pub fn topology(&self) -> &BoneTopology {
        &self.topology
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn joints(&self) -> &[Joint; LANDMARK_COUNT] {
        &self.joints
    }

    /// Current position of joint `index`
    pub fn joint_position(&self, index: usize) -> Option<Vec3> {
        self.joints.get(index).map(|j| j.position)
    }

    /// Joints that act as touch contact points
    pub fn fingertips(&self) -> impl Iterator<Item = &Joint> {
        self.joints.iter().filter(|j| j.is_fingertip())
    }

    /// Rendered joint sphere diameter
    pub fn joint_diameter(&self) -> f32 {
        JOINT_DIAMETER * self.scale.get()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// The bone connecting `parent` to `child`, if the topology has one
    pub fn bone(&self, parent: usize, child: usize) -> Option<&Bone> {
        self.topology
            .index_of(parent, child)
            .map(|i| &self.bones[i])
    }

    /// Number of frames applied since creation
    pub fn frames_applied(&self) -> u64 {
        self.frames_applied
    }
}

impl Default for SkeletonModel {
    fn default() -> Self {
        Self::new(ScalingFactor::default())
    }
}
