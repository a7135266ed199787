use clap::Parser;
use face_follow::{prepare_frame, CascadeDetector};
use opencv::core::{Point, Scalar, Size};
use opencv::prelude::*;
use opencv::{highgui, imgproc, videoio};
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
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = Args::parse();

    let window = "Face Detection";
    highgui::named_window_def(window)?;

    // minimum neighbor count 3 for single-shot detection
    let mut detector = CascadeDetector::from_file(&args.face_model, 3)?;

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

        let gray = prepare_frame(&frame)?;
        let faces = detector.detect(&gray)?;

        for face in &faces {
            let center = Point::new(face.x + face.width / 2, face.y + face.height / 2);
            imgproc::ellipse(
                &mut frame,
                center,
                Size::new(face.width / 2, face.height / 2),
                0.0,
                0.0,
                360.0,
                Scalar::new(255.0, 0.0, 255.0, 0.0),
                4,
                imgproc::LINE_8,
                0,
            )?;
        }

        highgui::imshow(window, &frame)?;
        if highgui::wait_key(30)? >= 0 {
            break;
        }
    }
    Ok(())
}
