// SPDX: CC0-1.0

//! Mediates between the three expression surfaces (fragment store, text
//! input, expression store) and drives the animation clock.
//!
//! Each handler writes only to the surfaces it did not read from, never
//! back to its own trigger source: the text-edit handler writes the store
//! and the fragment but not the widget, the fragment-change handler writes
//! the store and the widget but not the fragment. This asymmetry is what
//! keeps navigation and typing from re-triggering each other forever.

use crate::{
    parse::ParseErr,
    render::{CurveRenderer, Surface},
    store::ExpressionStore,
    Number, ViewWindow, DEFAULT_EXPR, TIME_INCREMENT,
};

/// The bookmarkable location of the page: one implicit key holding the
/// expression text verbatim. `get` returning `None` and returning an empty
/// string are equivalent.
pub trait FragmentStore {
    fn get(&self) -> Option<String>;
    fn set(&mut self, value: &str);
}

/// The single text field the user types expressions into.
pub trait TextInput {
    fn value(&self) -> String;
    fn set_value(&mut self, text: &str);
}

#[derive(Debug)]
pub struct SyncController {
    store: ExpressionStore,
    renderer: CurveRenderer,
    window: ViewWindow,
    clock: Number,
}

impl SyncController {
    pub fn new() -> Self {
        Self {
            store: ExpressionStore::new(),
            renderer: CurveRenderer::new(),
            window: ViewWindow::default(),
            clock: 0.0,
        }
    }

    pub fn expression(&self) -> &str {
        self.store.text()
    }

    pub fn clock(&self) -> Number {
        self.clock
    }

    pub fn window(&self) -> &ViewWindow {
        &self.window
    }

    pub fn store(&self) -> &ExpressionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ExpressionStore {
        &mut self.store
    }

    /// Reads the fragment, seeds the store and the widget from it (or from
    /// the built-in default, writing that back so the fragment is never
    /// empty afterwards), and performs the first render.
    pub fn startup(
        &mut self,
        fragment: &mut dyn FragmentStore,
        input: &mut dyn TextInput,
        surface: &mut dyn Surface,
    ) {
        let text = match fragment.get().filter(|text| !text.is_empty()) {
            Some(text) => text,
            None => {
                fragment.set(DEFAULT_EXPR);
                DEFAULT_EXPR.to_string()
            }
        };
        if let Err(err) = self.store.set_expression(&text) {
            // a hand-edited fragment may hold garbage; keep the default
            log::warn!("ignoring invalid expression in fragment: {err}");
        }
        input.set_value(&text);
        self.renderer
            .render(&mut self.store, self.clock, &self.window, surface);
    }

    /// Keystroke-level change of the text widget. The fragment mirrors the
    /// widget even when the store rejects the text; the widget itself is
    /// never written, so this can not re-fire. No render happens here; the
    /// animation loop picks up the store's state on the next tick.
    pub fn text_edited(
        &mut self,
        input: &dyn TextInput,
        fragment: &mut dyn FragmentStore,
    ) -> Result<(), ParseErr> {
        let text = input.value();
        let parsed = self.store.set_expression(&text);
        fragment.set(&text);
        parsed
    }

    /// External navigation changed the fragment. The fragment is taken
    /// read-only on purpose: writing it back would fire this handler again.
    pub fn fragment_changed(
        &mut self,
        fragment: &dyn FragmentStore,
        input: &mut dyn TextInput,
    ) -> Result<(), ParseErr> {
        let text = fragment
            .get()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| DEFAULT_EXPR.to_string());
        let parsed = self.store.set_expression(&text);
        input.set_value(&text);
        parsed
    }

    /// One animation step: advance the clock by the fixed increment, then
    /// render. The caller is the frame scheduler and reinvokes this at its
    /// own cadence.
    pub fn tick(&mut self, surface: &mut dyn Surface) {
        self.clock += TIME_INCREMENT;
        self.renderer
            .render(&mut self.store, self.clock, &self.window, surface);
    }
}

impl Default for SyncController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, SurfaceSize, SAMPLE_COUNT};
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct MemFragment {
        value: Option<String>,
        writes: usize,
    }

    impl FragmentStore for MemFragment {
        fn get(&self) -> Option<String> {
            self.value.clone()
        }

        fn set(&mut self, value: &str) {
            self.value = Some(value.to_string());
            self.writes += 1;
        }
    }

    #[derive(Default)]
    struct FakeInput {
        text: String,
        writes: usize,
    }

    impl TextInput for FakeInput {
        fn value(&self) -> String {
            self.text.clone()
        }

        fn set_value(&mut self, text: &str) {
            self.text = text.to_string();
            self.writes += 1;
        }
    }

    struct RecordingSurface {
        strokes: Vec<Vec<Point<Number>>>,
    }

    impl RecordingSurface {
        fn new() -> Self {
            Self {
                strokes: Vec::new(),
            }
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> SurfaceSize {
            SurfaceSize {
                width: 200,
                height: 100,
            }
        }

        fn clear(&mut self) {}

        fn stroke(&mut self, path: &[Point<Number>]) {
            self.strokes.push(path.to_vec());
        }
    }

    // E2E: startup with an empty fragment seeds everything from the
    // default and renders once
    #[test]
    fn startup_with_empty_fragment() {
        let mut fragment = MemFragment::default();
        let mut input = FakeInput::default();
        let mut surface = RecordingSurface::new();
        let mut controller = SyncController::new();

        controller.startup(&mut fragment, &mut input, &mut surface);

        assert_eq!(controller.expression(), DEFAULT_EXPR);
        assert_eq!(fragment.value.as_deref(), Some(DEFAULT_EXPR));
        assert_eq!(input.text, DEFAULT_EXPR);
        assert_eq!(surface.strokes.len(), 1);
        let path = &surface.strokes[0];
        assert_eq!(path.len(), SAMPLE_COUNT);
        assert_relative_eq!(path[0].x, 0.0);
        assert_relative_eq!(path[SAMPLE_COUNT - 1].x, 200.0);
    }

    #[test]
    fn startup_with_non_empty_fragment() {
        let mut fragment = MemFragment {
            value: Some("x^2".to_string()),
            writes: 0,
        };
        let mut input = FakeInput::default();
        let mut surface = RecordingSurface::new();
        let mut controller = SyncController::new();

        controller.startup(&mut fragment, &mut input, &mut surface);

        assert_eq!(controller.expression(), "x^2");
        assert_eq!(input.text, "x^2");
        // the fragment already had a value; startup must not rewrite it
        assert_eq!(fragment.writes, 0);
    }

    #[test]
    fn startup_with_invalid_fragment_keeps_the_default() {
        let mut fragment = MemFragment {
            value: Some("x+".to_string()),
            writes: 0,
        };
        let mut input = FakeInput::default();
        let mut surface = RecordingSurface::new();
        let mut controller = SyncController::new();

        controller.startup(&mut fragment, &mut input, &mut surface);

        assert_eq!(controller.expression(), DEFAULT_EXPR);
        // the widget still shows what the fragment said
        assert_eq!(input.text, "x+");
    }

    // P4, first half: an edit flows from the widget into the fragment
    #[test]
    fn edit_round_trips_through_the_fragment() {
        let mut fragment = MemFragment::default();
        let mut input = FakeInput::default();
        let mut controller = SyncController::new();

        input.text = "x^2".to_string();
        controller.text_edited(&input, &mut fragment).unwrap();

        assert_eq!(fragment.value.as_deref(), Some("x^2"));
        assert_eq!(controller.expression(), "x^2");
    }

    // P4, second half: navigation flows from the fragment into the widget
    // and the store
    #[test]
    fn navigation_updates_widget_and_store() {
        let mut fragment = MemFragment::default();
        let mut input = FakeInput::default();
        let mut controller = SyncController::new();

        fragment.value = Some("cos(x)".to_string());
        let writes_before = fragment.writes;
        controller.fragment_changed(&fragment, &mut input).unwrap();

        assert_eq!(input.text, "cos(x)");
        assert_eq!(fragment.writes, writes_before);
        assert_relative_eq!(controller.store_mut().evaluate(0.0, 0.0).unwrap(), 1.0);
    }

    // P5: one text edit causes exactly one fragment write and zero widget
    // writes
    #[test]
    fn text_edit_never_writes_back_to_the_widget() {
        let mut fragment = MemFragment::default();
        let mut input = FakeInput::default();
        let mut controller = SyncController::new();

        input.text = "x".to_string();
        controller.text_edited(&input, &mut fragment).unwrap();

        assert_eq!(fragment.writes, 1);
        assert_eq!(input.writes, 0);
    }

    #[test]
    fn rejected_edit_still_mirrors_the_fragment() {
        let mut fragment = MemFragment::default();
        let mut input = FakeInput::default();
        let mut controller = SyncController::new();

        input.text = "x+".to_string();
        controller.text_edited(&input, &mut fragment).unwrap_err();

        // store keeps the old expression, fragment mirrors the widget
        assert_eq!(controller.expression(), DEFAULT_EXPR);
        assert_eq!(fragment.value.as_deref(), Some("x+"));
    }

    // P6: the clock is a fixed multiple of the tick count, and the default
    // expression stays 0 at x = 0
    #[test]
    fn clock_advances_by_a_fixed_increment() {
        let mut surface = RecordingSurface::new();
        let mut controller = SyncController::new();

        for k in 1..=50 {
            controller.tick(&mut surface);
            assert_relative_eq!(
                controller.clock(),
                TIME_INCREMENT * k as Number,
                epsilon = 1e-12
            );
            let clock = controller.clock();
            assert_relative_eq!(controller.store_mut().evaluate(0.0, clock).unwrap(), 0.0);
        }
        assert_eq!(surface.strokes.len(), 50);
    }
}
