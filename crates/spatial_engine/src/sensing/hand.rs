//! Hand anchors and skeletons

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foundation::math::Mat4;
use super::anchor::AnchorId;

/// Which hand a pose belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Chirality {
    /// Left hand
    Left,
    /// Right hand
    Right,
}

impl Chirality {
    /// Both hands, left first
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];
}

/// Skeleton joints reported by hand tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandJointName {
    /// Wrist
    Wrist,
    /// Thumb tip
    ThumbTip,
    /// Index finger knuckle
    IndexFingerKnuckle,
    /// Index finger tip
    IndexFingerTip,
    /// Middle finger tip
    MiddleFingerTip,
    /// Ring finger tip
    RingFingerTip,
    /// Little finger tip
    LittleFingerTip,
}

/// One skeleton joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandJoint {
    /// Whether the estimate is current
    pub is_tracked: bool,
    /// Joint pose relative to the hand anchor
    pub anchor_from_joint: Mat4,
}

/// Joint poses of one hand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandSkeleton {
    joints: HashMap<HandJointName, HandJoint>,
}

impl HandSkeleton {
    /// Create a skeleton from joints
    pub fn new(joints: impl IntoIterator<Item = (HandJointName, HandJoint)>) -> Self {
        Self { joints: joints.into_iter().collect() }
    }

    /// Look up a joint
    pub fn joint(&self, name: HandJointName) -> Option<&HandJoint> {
        self.joints.get(&name)
    }
}

/// Tracked hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandAnchor {
    /// Anchor identifier
    pub id: AnchorId,
    /// Which hand
    pub chirality: Chirality,
    /// Whether the hand is currently tracked
    pub is_tracked: bool,
    /// Pose of the hand (wrist) in the session origin
    pub origin_from_anchor: Mat4,
    /// Joint poses, absent when the runtime has no estimate
    pub skeleton: Option<HandSkeleton>,
}

impl HandAnchor {
    /// Session-space pose of a joint, if the hand and the joint are both tracked
    pub fn origin_from_joint(&self, name: HandJointName) -> Option<Mat4> {
        if !self.is_tracked {
            return None;
        }
        let joint = self.skeleton.as_ref()?.joint(name)?;
        joint.is_tracked.then(|| self.origin_from_anchor * joint.anchor_from_joint)
    }
}
