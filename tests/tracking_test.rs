use face_follow::{FaceStep, TrackState};
use opencv::core::{Point, Rect, Size};

#[test]
fn tracks_across_jitter_and_detector_dropout() {
    let frame = Size::new(640, 480);
    let mut state = TrackState::new();

    // Frame 1: fresh subject, candidate centered at (200, 150)
    let step = state.update_from_faces(frame, [Rect::new(170, 120, 60, 60)]);
    assert_eq!(step, FaceStep::Acquired(Point::new(200, 150)));

    // Frame 2: the same candidate shifted by (3, 2), inside the dead-zone
    let step = state.update_from_faces(frame, [Rect::new(173, 122, 60, 60)]);
    assert_eq!(step, FaceStep::Updated(Point::new(200, 150)));
    assert_eq!(state.center(), Some(Point::new(200, 150)));

    // Frame 3: the face detector comes up empty
    let step = state.update_from_faces(frame, []);
    assert_eq!(step, FaceStep::Lost);

    let search = state
        .eye_search_rect(frame)
        .expect("search window should still be inside the frame");
    assert_eq!(search, Rect::new(200, 150, 72, 120));

    // two eyes inside the window, absolute centers (202, 151) and (208, 153)
    let eyes = [Rect::new(0, 0, 4, 2), Rect::new(6, 2, 4, 2)];
    let center = state.reacquire_from_eyes(search, eyes);
    assert_eq!(center, Some(Point::new(205, 152)));

    // the crop window follows the recovered center
    let crop = state.crop_rect(frame).expect("recovered subject has a crop");
    assert_eq!(crop, Rect::new(169, 80, 72, 120));
}

#[test]
fn dropout_near_the_frame_edge_skips_recovery() {
    let frame = Size::new(640, 480);
    let mut state = TrackState::new();

    // subject close to the bottom-right corner
    state.update_from_faces(frame, [Rect::new(560, 400, 60, 60)]);
    assert_eq!(state.center(), Some(Point::new(590, 430)));

    assert_eq!(state.update_from_faces(frame, []), FaceStep::Lost);

    // the search window would hang past the frame, so no eye recovery
    assert_eq!(state.eye_search_rect(frame), None);
    assert_eq!(state.center(), Some(Point::new(590, 430)));
}
