// SPDX: CC0-1.0

//! Samples the view window through the expression store and strokes the
//! resulting polyline onto a drawing surface, once per frame.

use crate::{store::ExpressionStore, Number, Point, SurfaceSize, ViewWindow, SAMPLE_COUNT};

/// Minimal drawing surface: a fixed pixel size, a clear, and a single
/// polyline stroke. What happens to out-of-range or non-finite coordinates
/// is up to the implementation.
pub trait Surface {
    fn size(&self) -> SurfaceSize;
    fn clear(&mut self);
    fn stroke(&mut self, path: &[Point<Number>]);
}

/// Math-space x position of sample `i`, spread evenly across the window so
/// that sample 0 lands on the left edge and sample `SAMPLE_COUNT - 1` on
/// the right.
pub fn sample_x(i: usize, window: &ViewWindow) -> Number {
    let percent = i as Number / (SAMPLE_COUNT - 1) as Number;
    percent * (window.x.end - window.x.start) + window.x.start
}

/// Projects a math-space point into pixel space. Pixel y grows downward,
/// so the vertical percentage is flipped.
pub fn project(math: Point<Number>, window: &ViewWindow, size: SurfaceSize) -> Point<Number> {
    let percent_x = (math.x - window.x.start) / (window.x.end - window.x.start);
    let percent_y = 1.0 - (math.y - window.y.start) / (window.y.end - window.y.start);
    Point {
        x: percent_x * Number::from(size.width),
        y: percent_y * Number::from(size.height),
    }
}

#[derive(Debug, Default)]
pub struct CurveRenderer {
    path: Vec<Point<Number>>, // pixel vertices, reused across frames
}

impl CurveRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the surface, evaluates all samples at the given time, and
    /// strokes them as one connected path. Always produces exactly
    /// `SAMPLE_COUNT` vertices: evaluation failures become NaN and
    /// non-finite values pass through the projection unchanged, so a
    /// singular sample cannot abort the frame.
    pub fn render(
        &mut self,
        store: &mut ExpressionStore,
        time: Number,
        window: &ViewWindow,
        surface: &mut dyn Surface,
    ) {
        let size = surface.size();
        surface.clear();

        self.path.clear();
        for i in 0..SAMPLE_COUNT {
            let x = sample_x(i, window);
            let y = store.evaluate(x, time).unwrap_or(Number::NAN);
            self.path.push(project(Point { x, y }, window, size));
        }
        surface.stroke(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct RecordingSurface {
        size: SurfaceSize,
        clears: usize,
        strokes: Vec<Vec<Point<Number>>>,
    }

    impl RecordingSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: SurfaceSize { width, height },
                clears: 0,
                strokes: Vec::new(),
            }
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> SurfaceSize {
            self.size
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn stroke(&mut self, path: &[Point<Number>]) {
            self.strokes.push(path.to_vec());
        }
    }

    fn window() -> ViewWindow {
        ViewWindow::default()
    }

    fn size() -> SurfaceSize {
        SurfaceSize {
            width: 200,
            height: 100,
        }
    }

    // P3: the corners and center of the mapping for the documented window
    // and a 200x100 surface
    #[test]
    fn first_and_last_samples_span_the_surface() {
        assert_relative_eq!(
            project(
                Point {
                    x: sample_x(0, &window()),
                    y: 0.0
                },
                &window(),
                size()
            )
            .x,
            0.0
        );
        assert_relative_eq!(
            project(
                Point {
                    x: sample_x(SAMPLE_COUNT - 1, &window()),
                    y: 0.0
                },
                &window(),
                size()
            )
            .x,
            200.0
        );
    }

    #[test]
    fn vertical_mapping_is_flipped() {
        let at = |y: Number| project(Point { x: 0.0, y }, &window(), size()).y;
        assert_relative_eq!(at(0.0), 50.0);
        assert_relative_eq!(at(10.0), 0.0);
        assert_relative_eq!(at(-10.0), 100.0);
    }

    // P2: exactly SAMPLE_COUNT vertices in one stroke, whatever the
    // expression does
    #[test]
    fn one_stroke_of_exactly_n_points() {
        let mut store = ExpressionStore::new();
        let mut renderer = CurveRenderer::new();
        let mut surface = RecordingSurface::new(200, 100);

        renderer.render(&mut store, 0.0, &window(), &mut surface);
        assert_eq!(surface.clears, 1);
        assert_eq!(surface.strokes.len(), 1);
        assert_eq!(surface.strokes[0].len(), SAMPLE_COUNT);
    }

    #[test]
    fn singular_samples_still_produce_n_points() {
        let mut store = ExpressionStore::new();
        store.set_expression("1/x").unwrap();
        let mut renderer = CurveRenderer::new();
        let mut surface = RecordingSurface::new(200, 100);

        renderer.render(&mut store, 0.0, &window(), &mut surface);
        assert_eq!(surface.strokes[0].len(), SAMPLE_COUNT);
    }

    #[test]
    fn evaluation_errors_become_nan_vertices() {
        let mut store = ExpressionStore::new();
        // parses fine, fails at evaluation
        store.set_expression("nope(x)").unwrap();
        let mut renderer = CurveRenderer::new();
        let mut surface = RecordingSurface::new(200, 100);

        renderer.render(&mut store, 0.0, &window(), &mut surface);
        let path = &surface.strokes[0];
        assert_eq!(path.len(), SAMPLE_COUNT);
        assert!(path.iter().all(|p| p.y.is_nan()));
    }
}
