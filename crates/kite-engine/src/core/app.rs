use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by the runtime.
pub trait App {
    /// Raw window events, after the input layer has seen them.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// The window's container size or device pixel ratio changed.
    ///
    /// `container` is in logical units; multiply by `scale_factor` for the
    /// backing buffer size.
    fn on_resize(&mut self, container: crate::coords::Viewport, scale_factor: f32) {
        let _ = (container, scale_factor);
    }

    /// Called once per redraw per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
