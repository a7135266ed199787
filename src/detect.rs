use opencv::prelude::*;
use opencv::types::VectorOfRect;
use opencv::{core, imgproc, objdetect, types};
use tracing::info;

use crate::CascadeError;

/// Wrapper around a pretrained Haar cascade classifier.
///
/// The classifier is resolved through OpenCV's data path search, so the
/// standard `haarcascades/...` names work without copying the model files.
pub struct CascadeDetector {
    classifier: objdetect::CascadeClassifier,
    min_neighbors: i32,
}

impl CascadeDetector {
    /// Loads a cascade model, failing fast when the file is missing or the
    /// model loads empty.
    pub fn from_file(path: &str, min_neighbors: i32) -> anyhow::Result<Self> {
        let xml = core::find_file_def(path)
            .map_err(|_| CascadeError::ModelNotFound(path.to_owned()))?;
        let classifier = objdetect::CascadeClassifier::new(&xml)?;
        if classifier.empty()? {
            return Err(CascadeError::EmptyModel(xml).into());
        }
        info!("loaded cascade model from {xml}");
        Ok(Self {
            classifier,
            min_neighbors,
        })
    }

    pub fn detect(&mut self, image: &Mat) -> anyhow::Result<VectorOfRect> {
        let mut hits = types::VectorOfRect::new();

        self.classifier.detect_multi_scale(
            &image,
            &mut hits,
            1.1,
            self.min_neighbors,
            objdetect::CASCADE_SCALE_IMAGE,
            core::Size {
                width: 30,
                height: 30,
            },
            core::Size {
                width: 0,
                height: 0,
            },
        )?;
        Ok(hits)
    }
}

/// Converts a frame to grayscale and equalizes its histogram, the
/// pre-processing the cascade classifiers expect.
pub fn prepare_frame(frame: &Mat) -> anyhow::Result<Mat> {
    let mut gray: Mat = Mat::default();
    imgproc::cvt_color_def(&frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    let mut equalized: Mat = Mat::default();
    imgproc::equalize_hist(&gray, &mut equalized)?;
    Ok(equalized)
}
