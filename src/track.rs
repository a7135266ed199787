use opencv::core::{Point, Rect, Scalar, Size};
use opencv::prelude::*;
use opencv::imgproc;
use tracing::debug;

use crate::detect::{prepare_frame, CascadeDetector};

/// Movement below this threshold on both axes is ignored to suppress jitter.
const DEAD_ZONE_PX: i32 = 7;
/// A candidate counts as the same subject when both deltas from the prior
/// center are under frame dimension divided by this.
const SAME_SUBJECT_DIVISOR: i32 = 6;

/// Per-subject tracking memory carried between frames.
///
/// `center` is `None` until the first face candidate is adopted; after that
/// the state stays locked on the subject for the life of the process. The
/// crop dimensions always belong to the last accepted candidate, so the
/// eye-recovery search window keeps its size while the face detector misses.
#[derive(Debug, Clone, Copy)]
pub struct TrackState {
    center: Option<Point>,
    crop_width: i32,
    crop_height: i32,
}

/// What one frame's worth of face candidates did to the estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceStep {
    /// First candidate adopted as the tracked subject.
    Acquired(Point),
    /// A nearby candidate was folded into the estimate.
    Updated(Point),
    /// Every candidate was rejected, or none were detected; eye recovery
    /// may re-center the estimate.
    Lost,
    /// Nothing detected and no subject acquired yet.
    Idle,
}

impl TrackState {
    pub fn new() -> Self {
        Self {
            center: None,
            crop_width: 0,
            crop_height: 0,
        }
    }

    pub fn center(&self) -> Option<Point> {
        self.center
    }

    pub fn crop_size(&self) -> Size {
        Size::new(self.crop_width, self.crop_height)
    }

    /// Folds one frame's face candidates into the estimate.
    ///
    /// Candidates are scanned in detector output order and the first match
    /// wins. Before a subject is acquired the first candidate is adopted
    /// outright. Afterwards a candidate is accepted only when it lands close
    /// enough to the prior center to plausibly be the same subject; accepted
    /// movement inside the dead-zone is dropped entirely, anything larger is
    /// blended at 1/3 weight against the prior estimate.
    pub fn update_from_faces(
        &mut self,
        frame: Size,
        faces: impl IntoIterator<Item = Rect>,
    ) -> FaceStep {
        for face in faces {
            let center = rect_center(face);
            let h = round_up(face.height, frame.height / 4);
            let w = 3 * h / 5;

            let prior = match self.center {
                None => {
                    self.center = Some(center);
                    self.crop_width = w;
                    self.crop_height = h;
                    return FaceStep::Acquired(center);
                }
                Some(prior) => prior,
            };

            let dx = (center.x - prior.x).abs();
            let dy = (center.y - prior.y).abs();
            if dx >= frame.width / SAME_SUBJECT_DIVISOR || dy >= frame.height / SAME_SUBJECT_DIVISOR
            {
                // probably someone else's face, keep scanning
                continue;
            }

            let next = if dx < DEAD_ZONE_PX && dy < DEAD_ZONE_PX {
                prior
            } else {
                Point::new(
                    (center.x + 2 * prior.x) / 3,
                    (center.y + 2 * prior.y) / 3,
                )
            };
            self.center = Some(next);
            self.crop_width = w;
            self.crop_height = h;
            return FaceStep::Updated(next);
        }

        match self.center {
            Some(_) => FaceStep::Lost,
            None => FaceStep::Idle,
        }
    }

    /// Window to search for eyes when the face detector misses.
    ///
    /// Recovery is only attempted while the window still lies fully inside
    /// the frame, since the eye detector needs a valid sub-image to run on.
    pub fn eye_search_rect(&self, frame: Size) -> Option<Rect> {
        let prior = self.center?;
        if self.crop_width <= 0 || self.crop_height <= 0 {
            return None;
        }
        let rect = Rect::new(prior.x, prior.y, self.crop_width, self.crop_height);
        if rect.x >= 0
            && rect.y >= 0
            && rect.x + rect.width <= frame.width
            && rect.y + rect.height <= frame.height
        {
            Some(rect)
        } else {
            None
        }
    }

    /// Re-centers on the arithmetic mean of the eye candidates found inside
    /// `search`. Eye rectangles are relative to the search window origin.
    /// Returns the new center, or `None` when no eyes were found.
    pub fn reacquire_from_eyes(
        &mut self,
        search: Rect,
        eyes: impl IntoIterator<Item = Rect>,
    ) -> Option<Point> {
        let mut sum = Point::new(0, 0);
        let mut count = 0;
        for eye in eyes {
            let eye_center = rect_center(eye);
            sum.x += search.x + eye_center.x;
            sum.y += search.y + eye_center.y;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let center = Point::new(sum.x / count, sum.y / count);
        self.center = Some(center);
        Some(center)
    }

    /// Crop window around the tracked center, biased upward so the forehead
    /// stays in view. Falls back to a fixed 10x10 patch when the window
    /// would leave the frame.
    pub fn crop_rect(&self, frame: Size) -> Option<Rect> {
        let center = self.center?;
        Some(crop_around(center, self.crop_width, self.crop_height, frame))
    }
}

impl Default for TrackState {
    fn default() -> Self {
        Self::new()
    }
}

fn rect_center(rect: Rect) -> Point {
    Point::new(rect.x + rect.width / 2, rect.y + rect.height / 2)
}

/// Rounds away from zero to the next multiple, preserving sign.
/// A zero multiple leaves the number unchanged.
pub fn round_up(num: i32, multiple: i32) -> i32 {
    if multiple == 0 {
        return num;
    }
    let remainder = num.abs() % multiple;
    if remainder == 0 {
        return num;
    }
    if num < 0 {
        return num - (multiple - remainder);
    }
    num + multiple - remainder
}

fn crop_around(center: Point, w: i32, h: i32, frame: Size) -> Rect {
    let x = center.x - w / 2;
    let y = center.y - 3 * h / 5;

    if x < 0 || y < 0 || x + w > frame.width - 2 || y + h > frame.height - 2 {
        Rect::new(5, 5, 10, 10)
    } else {
        Rect::new(x, y, w, h)
    }
}

/// Result of running one frame through [`Tracker::track`].
#[derive(Debug, Clone, Copy)]
pub struct TrackReport {
    /// Current estimate, if a subject has ever been acquired.
    pub center: Option<Point>,
    /// Crop window isolating the subject, when one was produced this frame.
    pub crop: Option<Rect>,
    /// Whether the face detector produced an accepted candidate this frame.
    pub face_found: bool,
}

/// Smoothed single-subject tracker over cascade face and eye detectors.
pub struct Tracker {
    faces: CascadeDetector,
    eyes: CascadeDetector,
}

impl Tracker {
    pub fn new(faces: CascadeDetector, eyes: CascadeDetector) -> Self {
        Self { faces, eyes }
    }

    /// Runs one frame through detection, smoothing and eye recovery.
    pub fn track(&mut self, frame: &Mat, state: &mut TrackState) -> anyhow::Result<TrackReport> {
        let frame_size = frame.size()?;
        let gray = prepare_frame(frame)?;
        let faces = self.faces.detect(&gray)?;

        let step = state.update_from_faces(frame_size, faces.iter());
        let face_found = matches!(step, FaceStep::Acquired(_) | FaceStep::Updated(_));

        let mut recovered = false;
        if step == FaceStep::Lost {
            if let Some(search) = state.eye_search_rect(frame_size) {
                let region = Mat::roi(&gray, search)?;
                let eyes = self.eyes.detect(&region)?;
                recovered = state.reacquire_from_eyes(search, eyes.iter()).is_some();
                debug!("face lost, eye recovery {}", if recovered { "hit" } else { "missed" });
            }
        }

        let crop = if face_found || recovered {
            state.crop_rect(frame_size)
        } else {
            None
        };

        Ok(TrackReport {
            center: state.center(),
            crop,
            face_found,
        })
    }
}

/// Draws the tracking ellipse around the current estimate.
pub fn draw_track_marker(frame: &mut Mat, state: &TrackState) -> anyhow::Result<()> {
    if let Some(center) = state.center() {
        let crop = state.crop_size();
        imgproc::ellipse(
            frame,
            center,
            Size::new(crop.width / 2, crop.height / 2),
            0.0,
            0.0,
            360.0,
            Scalar::new(255.0, 0.0, 255.0, 0.0),
            4,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(())
}
