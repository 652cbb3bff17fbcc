use framepipe::filter::{Blur, Grayscale, HorizontalFlip, Resize};
use framepipe::{Filter, FilterError, Pipeline, PixelFormat, VideoFrame};

/// 4x4 RGB frame where every pixel has a distinct value.
fn gradient_frame() -> VideoFrame {
    let mut data = Vec::with_capacity(48);
    for y in 0..4u8 {
        for x in 0..4u8 {
            data.extend_from_slice(&[x * 60, y * 60, 255 - x * 30 - y * 30]);
        }
    }
    VideoFrame::from_data(4, 4, PixelFormat::Rgb, data).with_timestamp(1_000)
}

fn frames() -> Vec<VideoFrame> {
    vec![
        gradient_frame(),
        VideoFrame::filled(4, 4, PixelFormat::Rgb, &[200, 100, 50]),
        VideoFrame::filled(7, 3, PixelFormat::Gray, &[17]),
        VideoFrame::new(5, 9, PixelFormat::Rgba),
    ]
}

#[test]
fn empty_pipeline_is_identity() {
    let pipeline = Pipeline::new();
    for frame in frames() {
        assert_eq!(pipeline.process(frame.clone()).unwrap(), frame);
    }
}

#[test]
fn pipeline_equals_nested_application() {
    let f1 = Grayscale;
    let f2 = HorizontalFlip;
    let f3 = Resize::new(3, 2).unwrap();
    let pipeline = Pipeline::new()
        .with_filter(f1)
        .with_filter(f2)
        .with_filter(f3);

    for frame in frames() {
        let manual = f3
            .process(f2.process(f1.process(frame.clone()).unwrap()).unwrap())
            .unwrap();
        assert_eq!(pipeline.process(frame).unwrap(), manual);
    }
}

#[test]
fn shape_invariants() {
    let blur = Blur::new(3, 5).unwrap();
    let resize = Resize::new(6, 2).unwrap();
    for frame in frames() {
        let shape = (frame.width, frame.height, frame.format);

        let flipped = HorizontalFlip.process(frame.clone()).unwrap();
        assert_eq!((flipped.width, flipped.height, flipped.format), shape);

        let blurred = blur.process(frame.clone()).unwrap();
        assert_eq!((blurred.width, blurred.height, blurred.format), shape);

        let gray = Grayscale.process(frame.clone()).unwrap();
        assert_eq!((gray.width, gray.height, gray.format), (shape.0, shape.1, PixelFormat::Gray));

        let resized = resize.process(frame).unwrap();
        assert_eq!((resized.width, resized.height, resized.format), (6, 2, shape.2));
    }
}

#[test]
fn flip_is_an_involution() {
    for frame in frames() {
        let twice = HorizontalFlip
            .process(HorizontalFlip.process(frame.clone()).unwrap())
            .unwrap();
        assert_eq!(twice, frame);
    }
}

#[test]
fn construction_validation() {
    assert!(matches!(
        Blur::new(4, 15),
        Err(FilterError::InvalidParameter { .. })
    ));
    assert!(matches!(
        Resize::new(0, 4),
        Err(FilterError::InvalidParameter { .. })
    ));
}

#[test]
fn grayscale_flip_resize_on_solid_frame() {
    let pipeline = Pipeline::new()
        .with_filter(Grayscale)
        .with_filter(HorizontalFlip)
        .with_filter(Resize::new(2, 2).unwrap());

    // (50, 150, 250) -> (4899*50 + 9617*150 + 1868*250 + 8192) >> 14 = 132
    let frame = VideoFrame::filled(4, 4, PixelFormat::Rgb, &[50, 150, 250]);
    let out = pipeline.process(frame).unwrap();

    assert_eq!(out, VideoFrame::filled(2, 2, PixelFormat::Gray, &[132]));
}

#[test]
fn grayscale_flip_resize_on_split_frame() {
    let pipeline = Pipeline::new()
        .with_filter(Grayscale)
        .with_filter(HorizontalFlip)
        .with_filter(Resize::new(2, 2).unwrap());

    // 4x4 neutral gray, columns 0-1 are 0 and columns 2-3 are 200.
    let mut data = Vec::new();
    for _ in 0..4 {
        for v in [0u8, 0, 200, 200] {
            data.extend_from_slice(&[v, v, v]);
        }
    }
    let frame = VideoFrame::from_data(4, 4, PixelFormat::Rgb, data);
    let out = pipeline.process(frame).unwrap();

    // Luma keeps neutral values and the flip gives rows [200, 200, 0, 0].
    // Shrinking 4 -> 2 scales the triangle support to 2 source pixels.
    // Output x = 0 sits between columns 0 and 1. Their centres and that of
    // column 2 lie 0.5, 0.5 and 1.5 away, which is 0.25, 0.25 and 0.75 of the
    // support, giving triangle weights 0.75, 0.75 and 0.25, so
    // (0.75 * 200 + 0.75 * 200 + 0.25 * 0) / 1.75 = 171.4 -> 171.
    // Output x = 1 mirrors it: (0.25 * 200) / 1.75 = 28.6 -> 29.
    // Rows are uniform, so the vertical pass keeps these values.
    assert_eq!(out.width, 2);
    assert_eq!(out.height, 2);
    assert_eq!(out.format, PixelFormat::Gray);
    assert_eq!(out.data, vec![171, 29, 171, 29]);
}

#[test]
fn grayscale_then_flip_on_known_grid() {
    let pipeline = Pipeline::new().with_filter(Grayscale).with_filter(HorizontalFlip);

    // Neutral pixels keep their value through the luma mapping.
    let mut data = Vec::new();
    for v in [10u8, 20, 30, 40, 50, 60, 70, 80] {
        data.extend_from_slice(&[v, v, v]);
    }
    let frame = VideoFrame::from_data(4, 2, PixelFormat::Rgb, data);
    let out = pipeline.process(frame).unwrap();

    assert_eq!(out.format, PixelFormat::Gray);
    assert_eq!(out.data, vec![40, 30, 20, 10, 80, 70, 60, 50]);
}

#[test]
fn invalid_stage_never_reaches_process() {
    let built: Result<Pipeline, FilterError> =
        Resize::new(0, 4).map(|resize| Pipeline::new().with_filter(resize));
    assert!(matches!(built, Err(FilterError::InvalidParameter { filter: "resize", .. })));
}

#[test]
fn incompatible_frame_propagates_out_of_pipeline() {
    let pipeline = Pipeline::new()
        .with_filter(HorizontalFlip)
        .with_filter(Resize::new(2, 2).unwrap());
    let err = pipeline
        .process(VideoFrame::new(0, 0, PixelFormat::Rgb))
        .unwrap_err();
    assert!(matches!(err, FilterError::IncompatibleFrame { .. }));
}
