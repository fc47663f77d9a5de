// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::landmark::PoseLandmark;
use crate::landmark::PoseLandmark::{
    LeftAnkle, LeftEar, LeftElbow, LeftEye, LeftEyeInner, LeftEyeOuter, LeftFootIndex, LeftHeel,
    LeftHip, LeftIndex, LeftKnee, LeftPinky, LeftShoulder, LeftThumb, LeftWrist, MouthLeft,
    MouthRight, Nose, RightAnkle, RightEar, RightElbow, RightEye, RightEyeInner, RightEyeOuter,
    RightFootIndex, RightHeel, RightHip, RightIndex, RightKnee, RightPinky, RightShoulder,
    RightThumb, RightWrist,
};

/// BlazePose skeleton: pairs of landmarks joined by a limb.
pub const SKELETON: [(PoseLandmark, PoseLandmark); 35] = [
    // face
    (Nose, LeftEyeInner),
    (LeftEyeInner, LeftEye),
    (LeftEye, LeftEyeOuter),
    (LeftEyeOuter, LeftEar),
    (Nose, RightEyeInner),
    (RightEyeInner, RightEye),
    (RightEye, RightEyeOuter),
    (RightEyeOuter, RightEar),
    (MouthLeft, MouthRight),
    // torso
    (LeftShoulder, RightShoulder),
    (LeftShoulder, LeftHip),
    (RightShoulder, RightHip),
    (LeftHip, RightHip),
    // left arm
    (LeftShoulder, LeftElbow),
    (LeftElbow, LeftWrist),
    (LeftWrist, LeftPinky),
    (LeftWrist, LeftIndex),
    (LeftWrist, LeftThumb),
    (LeftPinky, LeftIndex),
    // right arm
    (RightShoulder, RightElbow),
    (RightElbow, RightWrist),
    (RightWrist, RightPinky),
    (RightWrist, RightIndex),
    (RightWrist, RightThumb),
    (RightPinky, RightIndex),
    // left leg
    (LeftHip, LeftKnee),
    (LeftKnee, LeftAnkle),
    (LeftAnkle, LeftHeel),
    (LeftHeel, LeftFootIndex),
    (LeftAnkle, LeftFootIndex),
    // right leg
    (RightHip, RightKnee),
    (RightKnee, RightAnkle),
    (RightAnkle, RightHeel),
    (RightHeel, RightFootIndex),
    (RightAnkle, RightFootIndex),
];

/// Body region of a landmark, used to pick limb and keypoint colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRegion {
    /// Eyes, ears, nose and mouth.
    Face,
    /// Left arm and leg, left shoulder and hip.
    Left,
    /// Right arm and leg, right shoulder and hip.
    Right,
}

impl BodyRegion {
    /// Region a landmark belongs to.
    #[must_use]
    pub const fn of(landmark: PoseLandmark) -> Self {
        let index = landmark.index();
        if index <= MouthRight.index() {
            Self::Face
        } else if index % 2 == 1 {
            Self::Left
        } else {
            Self::Right
        }
    }
}
