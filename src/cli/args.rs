// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default pose landmark model.
pub const DEFAULT_MODEL: &str = "pose_landmark_full.onnx";

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Examples:
    posture-inference predict --model pose_landmark_full.onnx --source frame.jpg
    posture-inference predict -m pose_landmark_full.onnx -s frames/ --save
    posture-inference predict -s "frames/*.png" --json
    posture-inference predict -s workout.mp4 --conf 0.6
    posture-inference evaluate --landmarks pose.json --width 640 --height 480"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check posture on an image, directory, glob or video
    Predict(PredictArgs),
    /// Check posture for landmarks stored as JSON
    Evaluate(EvaluateArgs),
}

/// Arguments for the predict command.
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct PredictArgs {
    /// Path to ONNX pose landmark model
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Input source (image, directory, glob or video)
    #[arg(short, long)]
    pub source: String,

    /// Minimum pose-presence score
    #[arg(long, default_value_t = 0.5)]
    pub conf: f32,

    /// Model input size
    #[arg(long)]
    pub imgsz: Option<usize>,

    /// Model takes NCHW input instead of NHWC
    #[arg(long, default_value_t = false)]
    pub nchw: bool,

    /// Presence output is a logit rather than a probability
    #[arg(long, default_value_t = false)]
    pub flag_logit: bool,

    /// Number of inference threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Ignore required landmarks below this visibility
    #[arg(long)]
    pub min_visibility: Option<f32>,

    /// Save annotated images to runs/posture/predict
    #[arg(long, default_value_t = false)]
    pub save: bool,

    /// Print one JSON verdict per frame
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

/// Arguments for the evaluate command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// JSON file holding an array of {x, y, z, visibility} landmarks
    #[arg(short, long)]
    pub landmarks: PathBuf,

    /// Image width in pixels
    #[arg(long)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long)]
    pub height: u32,

    /// Ignore required landmarks below this visibility
    #[arg(long)]
    pub min_visibility: Option<f32>,

    /// Print the verdict as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_predict_args_defaults() {
        let args = Cli::parse_from(["app", "predict", "--source", "frame.jpg"]);
        match args.command {
            Commands::Predict(predict_args) => {
                assert_eq!(predict_args.model, DEFAULT_MODEL);
                assert_eq!(predict_args.source, "frame.jpg");
                assert!((predict_args.conf - 0.5).abs() < f32::EPSILON);
                assert!(predict_args.imgsz.is_none());
                assert!(!predict_args.nchw);
                assert!(!predict_args.flag_logit);
                assert!(!predict_args.save);
                assert!(!predict_args.json);
                assert!(predict_args.verbose);
            }
            Commands::Evaluate(_) => panic!("expected predict"),
        }
    }

    #[test]
    fn test_predict_args_custom() {
        let args = Cli::parse_from([
            "app",
            "predict",
            "-m",
            "custom.onnx",
            "-s",
            "frames/",
            "--conf",
            "0.8",
            "--imgsz",
            "224",
            "--flag-logit",
            "--save",
            "--verbose",
            "false",
        ]);
        match args.command {
            Commands::Predict(predict_args) => {
                assert_eq!(predict_args.model, "custom.onnx");
                assert!((predict_args.conf - 0.8).abs() < f32::EPSILON);
                assert_eq!(predict_args.imgsz, Some(224));
                assert!(predict_args.flag_logit);
                assert!(predict_args.save);
                assert!(!predict_args.verbose);
            }
            Commands::Evaluate(_) => panic!("expected predict"),
        }
    }

    #[test]
    fn test_predict_requires_source() {
        assert!(Cli::try_parse_from(["app", "predict"]).is_err());
    }

    #[test]
    fn test_evaluate_args() {
        let args = Cli::parse_from([
            "app",
            "evaluate",
            "--landmarks",
            "pose.json",
            "--width",
            "640",
            "--height",
            "480",
            "--json",
        ]);
        match args.command {
            Commands::Evaluate(eval_args) => {
                assert_eq!(eval_args.landmarks, PathBuf::from("pose.json"));
                assert_eq!((eval_args.width, eval_args.height), (640, 480));
                assert!(eval_args.json);
                assert!(eval_args.min_visibility.is_none());
            }
            Commands::Predict(_) => panic!("expected evaluate"),
        }
    }
}
