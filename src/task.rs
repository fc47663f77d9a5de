// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Activity definitions for posture evaluation.
//!
//! Each activity owns one ruleset. The evaluator runs every ruleset on the
//! same frame and keeps the first bad verdict in [`Activity::PRIORITY`] order;
//! there is no activity classifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::landmark::PoseLandmark;

/// Activities with a posture ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Squatting, observed from the subject's left side.
    Squat,
    /// Sitting at a desk, observed from the subject's left side.
    Desk,
}

impl Activity {
    /// Merge priority: the first activity whose ruleset flags bad posture wins.
    pub const PRIORITY: [Self; 2] = [Self::Squat, Self::Desk];

    /// Returns the string representation used on the CLI and in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Squat => "squat",
            Self::Desk => "desk",
        }
    }

    /// Landmarks that must be present for the ruleset to give a verdict.
    ///
    /// The squat list includes the nose although no squat rule measures it.
    #[must_use]
    pub const fn required_landmarks(&self) -> &'static [PoseLandmark] {
        match self {
            Self::Squat => &[
                PoseLandmark::LeftHip,
                PoseLandmark::LeftKnee,
                PoseLandmark::LeftAnkle,
                PoseLandmark::LeftShoulder,
                PoseLandmark::LeftEar,
                PoseLandmark::Nose,
            ],
            Self::Desk => &[
                PoseLandmark::LeftShoulder,
                PoseLandmark::LeftEar,
                PoseLandmark::Nose,
                PoseLandmark::LeftHip,
            ],
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Activity {
    type Err = ActivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "squat" | "squats" | "squatting" => Ok(Self::Squat),
            "desk" | "sitting" | "desk-sitting" | "desk_sitting" => Ok(Self::Desk),
            _ => Err(ActivityParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid activity string.
#[derive(Debug, Clone)]
pub struct ActivityParseError(String);

impl fmt::Display for ActivityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid activity '{}', expected one of: squat, desk",
            self.0
        )
    }
}

impl std::error::Error for ActivityParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_from_str() {
        assert_eq!("squat".parse::<Activity>().unwrap(), Activity::Squat);
        assert_eq!("Desk".parse::<Activity>().unwrap(), Activity::Desk);
        assert_eq!("desk-sitting".parse::<Activity>().unwrap(), Activity::Desk);
        assert!("yoga".parse::<Activity>().is_err());
    }

    #[test]
    fn test_activity_display() {
        assert_eq!(Activity::Squat.to_string(), "squat");
        assert_eq!(Activity::Desk.to_string(), "desk");
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(Activity::PRIORITY, [Activity::Squat, Activity::Desk]);
    }

    #[test]
    fn test_required_landmarks() {
        let squat = Activity::Squat.required_landmarks();
        assert!(squat.contains(&PoseLandmark::LeftKnee));
        assert!(squat.contains(&PoseLandmark::Nose));
        let desk = Activity::Desk.required_landmarks();
        assert_eq!(desk.len(), 4);
        assert!(!desk.contains(&PoseLandmark::LeftAnkle));
    }
}
