// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Body landmarks produced by a keypoint provider.
//!
//! Landmark identity follows the 33-point BlazePose topology. A [`LandmarkSet`]
//! holds the landmarks of at most one body for one frame; "no body detected"
//! is represented by the absence of the whole set (`Option<LandmarkSet>`),
//! never by an empty set.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{PostureError, Result};

/// Anatomical landmark identity (BlazePose / `MediaPipe` Pose topology).
///
/// The discriminant is the landmark's index in the provider's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    /// Number of landmarks in the topology.
    pub const COUNT: usize = 33;

    /// All landmarks in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Index of this landmark in the provider output.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Landmark for a provider index, if the index is part of the topology.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Upper snake case name as used by `MediaPipe` (e.g. `LEFT_HIP`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "NOSE",
            Self::LeftEyeInner => "LEFT_EYE_INNER",
            Self::LeftEye => "LEFT_EYE",
            Self::LeftEyeOuter => "LEFT_EYE_OUTER",
            Self::RightEyeInner => "RIGHT_EYE_INNER",
            Self::RightEye => "RIGHT_EYE",
            Self::RightEyeOuter => "RIGHT_EYE_OUTER",
            Self::LeftEar => "LEFT_EAR",
            Self::RightEar => "RIGHT_EAR",
            Self::MouthLeft => "MOUTH_LEFT",
            Self::MouthRight => "MOUTH_RIGHT",
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftWrist => "LEFT_WRIST",
            Self::RightWrist => "RIGHT_WRIST",
            Self::LeftPinky => "LEFT_PINKY",
            Self::RightPinky => "RIGHT_PINKY",
            Self::LeftIndex => "LEFT_INDEX",
            Self::RightIndex => "RIGHT_INDEX",
            Self::LeftThumb => "LEFT_THUMB",
            Self::RightThumb => "RIGHT_THUMB",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftAnkle => "LEFT_ANKLE",
            Self::RightAnkle => "RIGHT_ANKLE",
            Self::LeftHeel => "LEFT_HEEL",
            Self::RightHeel => "RIGHT_HEEL",
            Self::LeftFootIndex => "LEFT_FOOT_INDEX",
            Self::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }
}

// The table above must stay in index order.
const _: () = {
    let mut i = 0;
    while i < PoseLandmark::COUNT {
        assert!(PoseLandmark::ALL[i] as usize == i);
        i += 1;
    }
};

impl fmt::Display for PoseLandmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single body landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0.0 = left edge, 1.0 = right edge.
    pub x: f32,
    /// Vertical position, 0.0 = top edge, 1.0 = bottom edge.
    pub y: f32,
    /// Relative depth (smaller is closer to the camera), roughly on the scale of `x`.
    #[serde(default)]
    pub z: f32,
    /// Likelihood in [0, 1] that the landmark is visible.
    #[serde(default = "default_visibility")]
    pub visibility: f32,
}

const fn default_visibility() -> f32 {
    1.0
}

impl Landmark {
    /// Create a landmark.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// Position as a 3D vector.
    #[must_use]
    pub const fn xyz(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Landmarks of one detected body in one frame, indexed by [`PoseLandmark`].
///
/// Providers normally emit the full topology. A set built from a shorter
/// output reports the missing tail as absent through [`LandmarkSet::get`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct LandmarkSet {
    landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    /// Build a set from landmarks in provider index order.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::LandmarkError`] if the input is empty or has more
    /// entries than the topology defines.
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self> {
        if landmarks.is_empty() {
            return Err(PostureError::LandmarkError(
                "landmark set is empty; use None for 'no body detected'".to_string(),
            ));
        }
        if landmarks.len() > PoseLandmark::COUNT {
            return Err(PostureError::LandmarkError(format!(
                "expected at most {} landmarks, got {}",
                PoseLandmark::COUNT,
                landmarks.len()
            )));
        }
        Ok(Self { landmarks })
    }

    /// Build a fully populated set.
    #[must_use]
    pub fn from_array(landmarks: [Landmark; PoseLandmark::COUNT]) -> Self {
        Self {
            landmarks: landmarks.to_vec(),
        }
    }

    /// Look up a landmark; `None` if the provider did not emit it.
    #[must_use]
    pub fn get(&self, id: PoseLandmark) -> Option<&Landmark> {
        self.landmarks.get(id.index())
    }

    /// Whether every landmark of the topology is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() == PoseLandmark::COUNT
    }

    /// Number of landmarks present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// Always `false`: an empty set cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Iterate over `(identity, landmark)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (PoseLandmark, &Landmark)> {
        PoseLandmark::ALL.iter().copied().zip(self.landmarks.iter())
    }

    /// Landmarks as a slice in index order.
    #[must_use]
    pub fn as_slice(&self) -> &[Landmark] {
        &self.landmarks
    }
}

impl Index<PoseLandmark> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, id: PoseLandmark) -> &Self::Output {
        &self.landmarks[id.index()]
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = PostureError;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self> {
        Self::new(landmarks)
    }
}

impl From<LandmarkSet> for Vec<Landmark> {
    fn from(set: LandmarkSet) -> Self {
        set.landmarks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_indices() {
        assert_eq!(PoseLandmark::Nose.index(), 0);
        assert_eq!(PoseLandmark::LeftEar.index(), 7);
        assert_eq!(PoseLandmark::LeftShoulder.index(), 11);
        assert_eq!(PoseLandmark::LeftHip.index(), 23);
        assert_eq!(PoseLandmark::LeftKnee.index(), 25);
        assert_eq!(PoseLandmark::LeftAnkle.index(), 27);
        assert_eq!(PoseLandmark::RightFootIndex.index(), 32);
        assert_eq!(PoseLandmark::from_index(25), Some(PoseLandmark::LeftKnee));
        assert_eq!(PoseLandmark::from_index(33), None);
        assert_eq!(PoseLandmark::LeftHip.to_string(), "LEFT_HIP");
    }

    #[test]
    fn test_set_rejects_empty_and_oversized() {
        assert!(LandmarkSet::new(Vec::new()).is_err());
        let too_many = vec![Landmark::default(); PoseLandmark::COUNT + 6];
        assert!(matches!(
            LandmarkSet::new(too_many),
            Err(PostureError::LandmarkError(_))
        ));
    }

    #[test]
    fn test_partial_set_reports_missing() {
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 0.0, 0.9); 12]).unwrap();
        assert!(!set.is_complete());
        assert!(set.get(PoseLandmark::LeftShoulder).is_some());
        assert!(set.get(PoseLandmark::LeftHip).is_none());
    }

    #[test]
    fn test_set_json_roundtrip_defaults() {
        let json = r#"[{"x": 0.25, "y": 0.75}]"#;
        let set: LandmarkSet = serde_json::from_str(json).unwrap();
        let nose = set[PoseLandmark::Nose];
        assert!((nose.x - 0.25).abs() < f32::EPSILON);
        assert!((nose.visibility - 1.0).abs() < f32::EPSILON);
        assert!(nose.z.abs() < f32::EPSILON);

        assert!(serde_json::from_str::<LandmarkSet>("[]").is_err());
    }
}
