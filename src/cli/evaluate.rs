// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::Path;
use std::process;

use posture_inference::{
    Activity, LandmarkSet, PostureError, PostureEvaluator, PostureVerdict, RuleThresholds,
    RuleVerdict,
};

use crate::cli::args::EvaluateArgs;
use crate::{error, info, section, verbose, verdict};

/// Evaluate a landmark file and print the verdict.
pub fn run_evaluation(args: &EvaluateArgs) {
    let landmarks = match read_landmarks(&args.landmarks) {
        Ok(set) => set,
        Err(e) => {
            error!("{}: {e}", args.landmarks.display());
            process::exit(1);
        }
    };

    let mut thresholds = RuleThresholds::new();
    if let Some(min) = args.min_visibility {
        thresholds = thresholds.with_min_visibility(min);
    }
    let evaluator = PostureEvaluator::with_thresholds(thresholds);

    let verdict = evaluator.frame_verdict(Some(&landmarks), args.width, args.height);

    if args.json {
        match serde_json::to_string(&verdict) {
            Ok(line) => info!("{line}"),
            Err(e) => {
                error!("Failed to serialize verdict: {e}");
                process::exit(1);
            }
        }
        return;
    }

    section!("Rulesets");
    for activity in Activity::PRIORITY {
        let outcome = if evaluator.has_required(activity, &landmarks) {
            describe_outcome(&evaluator.evaluate_activity(activity, &landmarks, args.width, args.height))
        } else {
            "abstained (missing landmarks)".to_string()
        };
        verbose!("  {:<6} {outcome}", activity.as_str());
    }
    verbose!("");

    verdict!(verdict.is_bad_posture, "{}", headline(&verdict));
}

/// Read a JSON array of landmarks.
fn read_landmarks(path: &Path) -> Result<LandmarkSet, PostureError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn describe_outcome(outcome: &RuleVerdict) -> String {
    if outcome.is_bad_posture {
        outcome.message.clone()
    } else {
        "ok".to_string()
    }
}

fn headline(verdict: &PostureVerdict) -> String {
    if verdict.is_bad_posture {
        format!("Bad posture: {}", verdict.message)
    } else {
        verdict.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_landmarks_file() {
        let path = std::env::temp_dir().join(format!("posture_lm_{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"x": 0.5, "y": 0.1, "z": 0.0, "visibility": 0.9}]"#).unwrap();
        let set = read_landmarks(&path).unwrap();
        assert_eq!(set.len(), 1);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(read_landmarks(Path::new("missing.json")), Err(PostureError::Io(_))));
    }

    #[test]
    fn test_read_landmarks_rejects_empty() {
        let path = std::env::temp_dir().join(format!("posture_lm_empty_{}.json", std::process::id()));
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(read_landmarks(&path), Err(PostureError::LandmarkError(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_headline() {
        let bad = PostureVerdict::new(RuleVerdict::from_violations(&["Neck bent (120°)".to_string()]), Vec::new());
        assert_eq!(headline(&bad), "Bad posture: Neck bent (120°)");
        assert_eq!(headline(&PostureVerdict::new(RuleVerdict::good(), Vec::new())), "Good Posture");
    }

    #[test]
    fn test_describe_outcome() {
        assert_eq!(describe_outcome(&RuleVerdict::abstain()), "ok");
        let bad = RuleVerdict::from_violations(&["Knee over toe".to_string(), "Hunched back (140°)".to_string()]);
        assert_eq!(describe_outcome(&bad), "Knee over toe, Hunched back (140°)");
    }
}
