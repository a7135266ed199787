use clap::Parser;
use face_follow::{draw_track_marker, CascadeDetector, TrackState, Tracker};
use opencv::prelude::*;
use opencv::{highgui, videoio};
use tracing::info;

#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Camera index to capture from.
    #[clap(short, long, default_value_t = 0)]
    camera: i32,

    /// Frontal face cascade model.
    #[clap(long, default_value = "haarcascades/haarcascade_frontalface_alt.xml")]
    face_model: String,

    /// Eye cascade model.
    #[clap(
        long,
        default_value = "haarcascades/haarcascade_eye_tree_eyeglasses.xml"
    )]
    eye_model: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = Args::parse();

    let display_window = "Display";
    let face_window = "Face View";
    highgui::named_window_def(display_window)?;
    highgui::named_window(
        face_window,
        highgui::WINDOW_AUTOSIZE | highgui::WINDOW_FREERATIO | highgui::WINDOW_GUI_EXPANDED,
    )?;

    // minimum neighbor count 2 keeps the detectors permissive while tracking
    let face_detector = CascadeDetector::from_file(&args.face_model, 2)?;
    let eye_detector = CascadeDetector::from_file(&args.eye_model, 2)?;
    let mut tracker = Tracker::new(face_detector, eye_detector);
    let mut state = TrackState::new();

    let mut cam = videoio::VideoCapture::new(args.camera, videoio::CAP_ANY)?;
    if !videoio::VideoCapture::is_opened(&cam)? {
        anyhow::bail!("unable to open camera {}", args.camera);
    }

    loop {
        let mut frame = Mat::default();
        if !cam.read(&mut frame)? || frame.size()?.width == 0 {
            info!("camera stream ended");
            break;
        }

        let report = tracker.track(&frame, &mut state)?;

        if let Some(crop) = report.crop {
            let face_view = Mat::roi(&frame, crop)?;
            highgui::imshow(face_window, &face_view)?;
            draw_track_marker(&mut frame, &state)?;
        } else {
            // nothing to isolate this frame, show the whole thing
            highgui::imshow(face_window, &frame)?;
        }

        highgui::imshow(display_window, &frame)?;
        if highgui::wait_key(30)? >= 0 {
            break;
        }
    }
    Ok(())
}
