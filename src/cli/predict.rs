// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#[cfg(feature = "annotate")]
use std::path::Path;
use std::process;

use image::GenericImageView;
use serde::Serialize;

#[cfg(feature = "annotate")]
use posture_inference::annotate::{annotate_image, find_next_run_dir, load_font};
use posture_inference::io::SaveResults;
use posture_inference::{
    InferenceConfig, PoseModel, PostureDetector, PostureEvaluator, PostureVerdict, RuleThresholds,
    Source, SourceIterator, SourceMeta, VERSION,
};

use crate::cli::args::PredictArgs;
use crate::{error, section, success, verbose, warn};

/// Directory annotated runs are written under.
#[cfg(feature = "annotate")]
const RUNS_DIR: &str = "runs/posture";

/// One line of `--json` output.
#[derive(Serialize)]
struct FrameRecord<'a> {
    source: &'a str,
    frame: usize,
    #[serde(flatten)]
    verdict: &'a PostureVerdict,
}

/// Run posture checks over a source.
#[allow(clippy::too_many_lines, clippy::cast_precision_loss)]
pub fn run_prediction(args: &PredictArgs) {
    let mut config = InferenceConfig::new()
        .with_confidence(args.conf)
        .with_channels_last(!args.nchw)
        .with_flag_logit(args.flag_logit)
        .with_threads(args.threads);
    if let Some(sz) = args.imgsz {
        config = config.with_imgsz(sz, sz);
    }

    let mut thresholds = RuleThresholds::new();
    if let Some(min) = args.min_visibility {
        thresholds = thresholds.with_min_visibility(min);
    }

    let model = match PoseModel::load_with_config(&args.model, config) {
        Ok(m) => m,
        Err(e) => {
            error!("Error loading model: {e}");
            process::exit(1);
        }
    };

    let imgsz = model.imgsz();
    verbose!("Posture Inference {VERSION} 🚀 Rust ONNX");
    verbose!("{} summary: imgsz=({}, {}), outputs={:?}", args.model, imgsz.0, imgsz.1, model.output_names());

    let mut detector = PostureDetector::with_evaluator(model, PostureEvaluator::with_thresholds(thresholds));

    let source = Source::from(args.source.as_str());
    let is_video = source.is_video();
    #[cfg(not(feature = "video"))]
    if is_video {
        warn!("Video source detected but the 'video' feature is not enabled. Please compile with '--features video'");
        process::exit(1);
    }

    let saver = if args.save { prepare_saver() } else { None };
    #[cfg(feature = "annotate")]
    let font = saver.as_ref().and_then(|_| load_font(None));
    #[cfg(feature = "annotate")]
    if saver.is_some() && font.is_none() {
        warn!("No font found, annotated frames will have no banner text. Set POSTURE_FONT to a .ttf file.");
    }

    // Decode frames on a separate thread while the main thread runs inference.
    let (sender, receiver) = std::sync::mpsc::sync_channel(4);
    let source_clone = source.clone();
    std::thread::spawn(move || {
        let iter = match SourceIterator::new(source_clone) {
            Ok(iter) => iter,
            Err(e) => {
                error!("Error opening source: {e}");
                return;
            }
        };
        for item in iter {
            if sender.send(item).is_err() {
                break;
            }
        }
    });

    let mut frames = 0usize;
    let mut bad_frames = 0usize;
    let mut no_body_frames = 0usize;
    let mut total_inference = 0.0;
    let mut total_evaluation = 0.0;

    for item in receiver {
        let (img, meta) = match item {
            Ok(val) => val,
            Err(e) => {
                error!("Error reading source: {e}");
                continue;
            }
        };

        let (verdict, speed) = match detector.process_frame_timed(&img) {
            Ok(result) => result,
            Err(e) => {
                error!("{}: {e}", meta.name);
                continue;
            }
        };

        frames += 1;
        if verdict.is_bad_posture {
            bad_frames += 1;
        }
        if !verdict.has_body() {
            no_body_frames += 1;
        }
        total_inference += speed.inference.unwrap_or(0.0);
        total_evaluation += speed.evaluation.unwrap_or(0.0);

        let (width, height) = img.dimensions();
        verbose!(
            "{} {}: {}x{} {}, {:.1}ms",
            frame_label(is_video, &meta),
            meta.name,
            width,
            height,
            format_verdict_summary(&verdict),
            speed.total()
        );

        if args.json {
            let record = FrameRecord {
                source: &meta.name,
                frame: meta.index,
                verdict: &verdict,
            };
            match serde_json::to_string(&record) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("Failed to serialize verdict: {e}"),
            }
        }

        #[cfg(feature = "annotate")]
        if let Some(saver) = &saver {
            let annotated = annotate_image(&img, &verdict, font.as_ref());
            if let Err(e) = saver.save(is_video, &meta, &annotated) {
                error!("Failed to save result: {e}");
            }
        }
    }

    let n = frames.max(1) as f64;
    section!("Summary");
    verbose!(
        "{frames} frames: {bad_frames} bad posture, {} good, {no_body_frames} without a body",
        frames.saturating_sub(bad_frames + no_body_frames)
    );
    verbose!(
        "Speed: {:.1}ms inference, {:.2}ms evaluation per frame",
        total_inference / n,
        total_evaluation / n
    );
    if let Some(saver) = &saver {
        success!("Results saved to {}", saver.save_dir().display());
    }
}

/// Pick the next run directory for `--save`.
#[cfg(feature = "annotate")]
fn prepare_saver() -> Option<SaveResults> {
    let dir = find_next_run_dir(Path::new(RUNS_DIR), "predict");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        error!("Failed to create {}: {e}", dir.display());
        process::exit(1);
    }
    Some(SaveResults::new(dir))
}

#[cfg(not(feature = "annotate"))]
fn prepare_saver() -> Option<SaveResults> {
    warn!("--save requires the 'annotate' feature. Compile with --features annotate to enable saving.");
    None
}

/// Progress label such as `image 2/5` or `video 1/1 (frame 12/300)`.
fn frame_label(is_video: bool, meta: &SourceMeta) -> String {
    let total = meta
        .total
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    if is_video {
        format!("video 1/1 (frame {}/{total})", meta.index + 1)
    } else {
        format!("image {}/{total}", meta.index + 1)
    }
}

/// One-word-or-so verdict summary for progress lines.
fn format_verdict_summary(verdict: &PostureVerdict) -> String {
    if !verdict.has_body() {
        "(no body)".to_string()
    } else if verdict.is_bad_posture {
        format!("BAD: {}", verdict.message)
    } else {
        verdict.message.clone()
    }
}
