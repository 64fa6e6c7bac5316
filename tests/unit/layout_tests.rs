/*!
 * Tests for the line layout engine and render descriptors
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use clipcaps::errors::{AppError, ConfigurationError, MeasurementError};
use clipcaps::geometry::FrameSize;
use clipcaps::layout::{max_line_width, rotation_bound, LineLayoutEngine, MAX_ROTATION_DEGREE, ROW_GAP};
use clipcaps::render::{render_lines, render_lines_json, TimeWindow};
use crate::common::{self, FailingMeasurer, FixedMeasurer};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// "hi" fits on the first row, "there" wraps to the second
#[test]
fn test_layout_withNarrowFrame_shouldWrapSecondWord() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0)
        .with_width("hi", 20.0)
        .with_width(" ", 5.0)
        .with_width("there", 90.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("hi", 0.0, 0.3), ("there", 0.3, 0.6)]);

    let descriptor = engine.layout(&line, FrameSize::new(100, 200), &mut StdRng::seed_from_u64(1)).unwrap();

    let hi = &descriptor.words[0];
    assert_eq!((hi.x, hi.y, hi.row), (0.0, 0.0, 0));
    assert_eq!((hi.width, hi.height), (20.0, 20.0));

    let there = &descriptor.words[1];
    assert_eq!(there.x, 0.0);
    assert_eq!(there.row, 1);
    assert_eq!(there.y, 20.0 + ROW_GAP);
}

/// The usable row width keeps a tenth of the frame on each side
#[test]
fn test_max_line_width_withVariousFrames_shouldSubtractMargins() {
    assert!(approx(max_line_width(100), 80.0));
    assert!(approx(max_line_width(1080), 864.0));
}

/// Every word that shares a row with an earlier word stays inside the row width
#[test]
fn test_layout_withLongLine_shouldRespectRowWidth() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(12.0, 30.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[
        ("Welcome", 0.0, 0.4),
        ("back", 0.4, 0.7),
        ("to", 0.7, 0.8),
        ("the", 0.8, 0.9),
        ("channel", 0.9, 1.4),
        ("today", 1.5, 1.9),
    ]);
    let frame = FrameSize::new(300, 600);
    let max_width = max_line_width(frame.width);
    let space = 12.0;

    let descriptor = engine.layout(&line, frame, &mut StdRng::seed_from_u64(3)).unwrap();

    assert!(descriptor.words.iter().any(|w| w.row > 0), "the line should wrap");
    for word in &descriptor.words {
        assert!(
            word.x + word.width + space <= max_width + 1e-9,
            "'{}' overflows its row: x={} width={}",
            word.word,
            word.x,
            word.width
        );
    }
}

/// Rows go top to bottom and every new row starts at x = 0
#[test]
fn test_layout_withManyWords_shouldNeverMoveUp() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(15.0, 25.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[
        ("we", 1.9, 2.0),
        ("are", 2.0, 2.2),
        ("building", 2.2, 2.7),
        ("something", 2.7, 3.2),
        ("new", 5.0, 5.3),
    ]);

    let descriptor = engine.layout(&line, FrameSize::new(200, 400), &mut StdRng::seed_from_u64(3)).unwrap();

    for pair in descriptor.words.windows(2) {
        assert!(pair[1].y >= pair[0].y);
        assert!(pair[1].row >= pair[0].row);
        if pair[1].row > pair[0].row {
            assert_eq!(pair[1].x, 0.0);
            assert_eq!(pair[1].y, pair[0].y + pair[0].height + ROW_GAP);
        } else {
            assert!(pair[1].x > pair[0].x);
        }
    }
}

/// A word wider than the row is placed alone on its own row
#[test]
fn test_layout_withOversizedWord_shouldPlaceItAlone() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0)
        .with_width(" ", 5.0)
        .with_width("enormous", 200.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("a", 0.0, 0.1), ("enormous", 0.1, 0.5), ("b", 0.5, 0.6)]);

    let descriptor = engine.layout(&line, FrameSize::new(100, 200), &mut StdRng::seed_from_u64(0)).unwrap();
    let rows: Vec<usize> = descriptor.words.iter().map(|w| w.row).collect();

    assert_eq!(rows, vec![0, 1, 2]);
    assert_eq!(descriptor.words[1].x, 0.0);
    assert_eq!(descriptor.words[1].width, 200.0);
    assert_eq!(descriptor.words[2].x, 0.0);
    assert!(descriptor.max_width > max_line_width(100));
}

/// An oversized first word opens a new row and leaves the first one empty
#[test]
fn test_layout_withOversizedFirstWord_shouldSkipFirstRow() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0).with_width("enormous", 200.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("enormous", 0.0, 0.5), ("b", 0.5, 0.6)]);

    let descriptor = engine.layout(&line, FrameSize::new(100, 200), &mut StdRng::seed_from_u64(0)).unwrap();
    let first = &descriptor.words[0];
    let second = &descriptor.words[1];

    assert_eq!((first.row, first.x, first.y), (1, 0.0, 20.0 + ROW_GAP));
    assert_eq!((second.row, second.x, second.y), (2, 0.0, first.y + first.height + ROW_GAP));
    assert_eq!(descriptor.max_height, 80.0);
    // floor(80 * 1.1)
    assert_eq!(descriptor.background.height, 88.0);
}

/// Positioned words keep their own timestamps
#[test]
fn test_layout_withAnyMode_shouldKeepWordTimestamps() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("one", 1.0, 1.25), ("two", 1.5, 2.0)]);

    let descriptor = engine.layout(&line, FrameSize::new(1000, 1000), &mut StdRng::seed_from_u64(0)).unwrap();

    assert_eq!((descriptor.words[1].start, descriptor.words[1].end), (1.5, 2.0));
    assert!(approx(descriptor.words[0].duration, 0.25));
    assert_eq!(descriptor.window, TimeWindow::new(1.0, 2.0));
    assert_eq!(descriptor.window.duration(), 1.0);
}

/// Without progressive reveal every word shares the line window
#[test]
fn test_layout_with_mode_withFullLineMode_shouldShareLineWindow() {
    let font = common::font_config_with(0.0, true);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("one", 1.0, 1.25), ("two", 1.5, 2.0)]);

    let descriptor = engine
        .layout_with_mode(&line, FrameSize::new(1000, 1000), false, &mut StdRng::seed_from_u64(0))
        .unwrap();

    for (word, highlight) in descriptor.words.iter().zip(&descriptor.highlights) {
        assert_eq!(word.visible, TimeWindow::new(1.0, 2.0));
        assert_eq!(highlight.window, TimeWindow::new(1.0, 2.0));
        assert_eq!(highlight.spoken, TimeWindow::new(word.start, word.end));
    }
}

/// With progressive reveal each word shows from its own start until the line ends
#[test]
fn test_layout_withWordsOnTheGo_shouldRevealWordsProgressively() {
    let font = common::font_config_with(0.0, true);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("one", 1.0, 1.25), ("two", 1.5, 2.0)]);

    let descriptor = engine.layout(&line, FrameSize::new(1000, 1000), &mut StdRng::seed_from_u64(0)).unwrap();

    assert_eq!(descriptor.highlights[0].window, TimeWindow::new(1.0, 2.0));
    assert_eq!(descriptor.highlights[1].window, TimeWindow::new(1.5, 2.0));
    assert_eq!(descriptor.words[1].visible, TimeWindow::new(1.5, 2.0));
}

/// Highlight boxes are padded and scaled by the highlighted style, text centered inside
#[test]
fn test_layout_withHighlightStyle_shouldSizeAndCenterBoxes() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0).with_width("word", 40.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("word", 0.0, 0.5)]);

    let descriptor = engine.layout(&line, FrameSize::new(1000, 1000), &mut StdRng::seed_from_u64(0)).unwrap();
    let highlight = &descriptor.highlights[0];

    // floor(40 * 1.1 * 1.2) and floor(20 * 1.1 * 1.2)
    assert_eq!(highlight.box_width, 52.0);
    assert_eq!(highlight.box_height, 26.0);
    assert_eq!(highlight.text_offset_x, 6.0);
    assert_eq!(highlight.text_offset_y, 3.0);
    assert_eq!(highlight.corner_radius, 12.0);
    assert_eq!(highlight.fill, [255, 0, 128]);
    assert_eq!(highlight.opacity, 0.8);
    assert_eq!(highlight.text_style.color, "yellow");
}

/// Zero jitter gives zero rotation and leaves the random source untouched
#[test]
fn test_layout_withZeroRotation_shouldNotDrawFromRng() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("one", 0.0, 0.2), ("two", 0.2, 0.4), ("three", 0.4, 0.6)]);

    let mut rng = StdRng::seed_from_u64(42);
    let descriptor = engine.layout(&line, FrameSize::new(1000, 1000), &mut rng).unwrap();

    assert!(descriptor.highlights.iter().all(|h| h.rotation_degrees == 0.0));
    let mut fresh = StdRng::seed_from_u64(42);
    assert_eq!(rng.random::<u64>(), fresh.random::<u64>());
}

/// Rotations stay within the configured jitter
#[test]
fn test_layout_withRotationJitter_shouldStayInRange() {
    let font = common::font_config_with(5.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("one", 0.0, 0.2), ("two", 0.2, 0.4), ("three", 0.4, 0.6), ("four", 0.6, 0.8)]);

    let descriptor = engine.layout(&line, FrameSize::new(1000, 1000), &mut StdRng::seed_from_u64(9)).unwrap();

    assert!(descriptor.highlights.iter().all(|h| h.rotation_degrees.abs() <= 5.0));
}

/// Same seed, same input, same serialized descriptors
#[test]
fn test_render_lines_withFixedSeed_shouldBeReproducible() {
    let font = common::font_config_with(8.0, true);
    let measurer = FixedMeasurer::new(11.0, 24.0);
    let lines = vec![
        common::line(&[("Welcome", 0.0, 0.4), ("back", 0.4, 0.7), ("everyone", 0.7, 1.2)]),
        common::line(&[("today", 1.5, 1.9), ("we", 1.9, 2.0), ("build", 2.0, 2.4)]),
    ];
    let frame = FrameSize::new(606, 1080);

    let first = render_lines(&lines, frame, &font, &measurer, &mut StdRng::seed_from_u64(2024)).unwrap();
    let second = render_lines(&lines, frame, &font, &measurer, &mut StdRng::seed_from_u64(2024)).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert!(first.iter().flat_map(|d| &d.highlights).any(|h| h.rotation_degrees != 0.0));
}

/// Background and overlay origin follow the bounding box of the line
#[test]
fn test_render_lines_withTwoWords_shouldPlaceBackgroundAtBottomCenter() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let lines = vec![common::line(&[("hello", 0.0, 0.5), ("world", 0.5, 1.0)])];

    let descriptors = render_lines(&lines, FrameSize::new(1000, 1000), &font, &measurer, &mut StdRng::seed_from_u64(0)).unwrap();
    let descriptor = &descriptors[0];

    // "hello" (50) + space (10) + "world" (50)
    assert_eq!(descriptor.max_width, 110.0);
    assert_eq!(descriptor.max_height, 20.0);
    assert_eq!(descriptor.background.width, 121.0);
    assert_eq!(descriptor.background.height, 22.0);
    assert_eq!(descriptor.background.color, [0, 0, 0]);
    assert!(approx(descriptor.origin_x, 439.5));
    assert!(approx(descriptor.origin_y, 880.0));
    assert_eq!(descriptor.background.window, descriptor.window);
}

/// Line indices follow the input order
#[test]
fn test_render_lines_withSeveralLines_shouldNumberDescriptors() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let lines = vec![
        common::line(&[("first", 0.0, 0.5)]),
        common::line(&[("second", 0.6, 1.0)]),
        common::line(&[("third", 1.1, 1.5)]),
    ];

    let descriptors = render_lines(&lines, FrameSize::new(500, 500), &font, &measurer, &mut StdRng::seed_from_u64(0)).unwrap();

    let indices: Vec<usize> = descriptors.iter().map(|d| d.line_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(descriptors[1].text, "second");
    assert_eq!(descriptors[2].font, &font);
}

/// A measurement failure aborts layout of the line
#[test]
fn test_layout_withFailingMeasurer_shouldPropagateError() {
    let font = common::font_config_with(0.0, false);
    let measurer = FailingMeasurer {
        fail_on: "there".to_string(),
        inner: FixedMeasurer::new(10.0, 20.0),
    };
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("hi", 0.0, 0.3), ("there", 0.3, 0.6)]);

    let result = engine.layout(&line, FrameSize::new(100, 200), &mut StdRng::seed_from_u64(0));

    assert!(matches!(result, Err(MeasurementError::Failed { ref text, .. }) if text == "there"));
}

/// Negative extents from a measurer are rejected
#[test]
fn test_layout_withNegativeExtent_shouldReturnInvalidExtent() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0).with_width("bad", -1.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("bad", 0.0, 0.3)]);

    let result = engine.layout(&line, FrameSize::new(100, 200), &mut StdRng::seed_from_u64(0));

    assert!(matches!(result, Err(MeasurementError::InvalidExtent { .. })));
}

/// An empty line list renders nothing
#[test]
fn test_render_lines_withNoLines_shouldReturnEmpty() {
    let font = common::sample_font_config();
    let measurer = FixedMeasurer::new(10.0, 20.0);

    let descriptors = render_lines(&[], FrameSize::new(100, 200), &font, &measurer, &mut StdRng::seed_from_u64(0)).unwrap();

    assert!(descriptors.is_empty());
}

/// Unusable rotation bounds disable the jitter instead of aborting the layout
#[test]
fn test_layout_withNonFiniteRotation_shouldNotRotate() {
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let line = common::line(&[("one", 0.0, 0.5), ("two", 0.5, 1.0)]);

    for degree in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -5.0] {
        let font = common::font_config_with(degree, false);
        let engine = LineLayoutEngine::new(&font, &measurer);

        let descriptor = engine.layout(&line, FrameSize::new(1000, 1000), &mut StdRng::seed_from_u64(4)).unwrap();

        assert!(descriptor.highlights.iter().all(|h| h.rotation_degrees == 0.0), "bound {}", degree);
    }
}

/// Huge bounds are clamped to a full turn
#[test]
fn test_rotation_bound_withHugeValue_shouldClampToFullTurn() {
    assert_eq!(rotation_bound(f64::MAX), MAX_ROTATION_DEGREE);
    assert_eq!(rotation_bound(12.5), 12.5);
    assert_eq!(rotation_bound(0.0), 0.0);

    let font = common::font_config_with(f64::MAX, false);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let engine = LineLayoutEngine::new(&font, &measurer);
    let line = common::line(&[("spin", 0.0, 0.5)]);

    let descriptor = engine.layout(&line, FrameSize::new(1000, 1000), &mut StdRng::seed_from_u64(4)).unwrap();

    assert!(descriptor.highlights[0].rotation_degrees.abs() <= MAX_ROTATION_DEGREE);
}

/// Serialized descriptors list every line in order
#[test]
fn test_render_lines_json_withTwoLines_shouldSerializeDescriptors() {
    let font = common::font_config_with(0.0, false);
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let lines = vec![
        common::line(&[("hello", 0.0, 0.5)]),
        common::line(&[("world", 0.6, 1.0)]),
    ];

    let json = render_lines_json(&lines, FrameSize::new(500, 500), &font, &measurer, &mut StdRng::seed_from_u64(0)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value.as_array().map(Vec::len), Some(2));
    assert_eq!(value[1]["text"], "world");
    assert_eq!(value[0]["font"]["highlighted"]["back_ground_color_clip"]["radius"], 12.0);
}

/// Each failure stage surfaces as its own application error
#[test]
fn test_render_lines_json_withBadInputs_shouldReturnStageErrors() {
    let lines = vec![common::line(&[("hi", 0.0, 0.3), ("there", 0.3, 0.6)])];
    let measurer = FixedMeasurer::new(10.0, 20.0);
    let font = common::font_config_with(0.0, false);

    let zero_frame = render_lines_json(&lines, FrameSize::new(0, 200), &font, &measurer, &mut StdRng::seed_from_u64(0));
    assert!(matches!(
        zero_frame,
        Err(AppError::Configuration(ConfigurationError::InvalidValue { ref field, .. })) if field == "frame"
    ));

    let mut faded = common::font_config_with(0.0, false);
    faded.background.opacity = 2.0;
    let bad_font = render_lines_json(&lines, FrameSize::new(100, 200), &faded, &measurer, &mut StdRng::seed_from_u64(0));
    assert!(matches!(
        bad_font,
        Err(AppError::Configuration(ConfigurationError::InvalidValue { ref field, .. })) if field == "background.opacity"
    ));

    let failing = FailingMeasurer {
        fail_on: "there".to_string(),
        inner: FixedMeasurer::new(10.0, 20.0),
    };
    let measure_failure = render_lines_json(&lines, FrameSize::new(100, 200), &font, &failing, &mut StdRng::seed_from_u64(0));
    assert!(matches!(measure_failure, Err(AppError::Measurement(MeasurementError::Failed { .. }))));
}
