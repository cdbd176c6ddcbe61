use crate::compile::LoadedShader;
use crate::constants::ViewerConstants;
use crate::dispatch::{DispatchMode, TileDispatcher};
use crate::framebuffer::Framebuffer;
use crate::runtime::TimeSample;
use crate::shader::CompiledShader;
use crate::surface::SurfaceEvent;

/// Shadertoy-style mouse state in bottom-left-origin pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MouseState {
    cursor: [f32; 2],
    click: [f32; 2],
    pressed: bool,
}

impl MouseState {
    /// `iMouse`: xy follows the cursor while pressed, zw holds the last click
    /// and turns negative once the button is released.
    fn packed(&self) -> [f32; 4] {
        let sign = if self.pressed { 1.0 } else { -1.0 };
        [
            self.cursor[0],
            self.cursor[1],
            self.click[0] * sign,
            self.click[1] * sign,
        ]
    }
}

/// Everything a frame needs: the active shader, its constants and the
/// framebuffer it renders into.
#[derive(Debug)]
pub struct ViewerContext {
    constants: ViewerConstants,
    framebuffer: Framebuffer,
    shader: CompiledShader,
    mouse: MouseState,
    hover: [f32; 2],
}

impl ViewerContext {
    pub fn new(shader: CompiledShader) -> Self {
        Self {
            constants: ViewerConstants::default(),
            framebuffer: Framebuffer::default(),
            shader,
            mouse: MouseState::default(),
            hover: [0.0; 2],
        }
    }

    /// Makes a freshly loaded shader the active one.
    pub fn install(&mut self, loaded: LoadedShader) {
        self.shader = loaded.shader;
    }

    pub fn shader(&self) -> &CompiledShader {
        &self.shader
    }

    pub fn constants(&self) -> &ViewerConstants {
        &self.constants
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Matches the framebuffer and `iResolution` to the surface size.
    pub fn set_output_size(&mut self, width: u32, height: u32) {
        self.framebuffer.resize(width, height);
        self.constants
            .set_output(width, height, self.framebuffer.pitch());
    }

    /// Restarts `iFrame` at zero.
    pub fn reset_frames(&mut self) {
        self.constants.frame = 0;
    }

    pub fn begin_frame(&mut self, time: TimeSample) {
        self.constants.time = time.seconds;
        self.constants.mouse = self.mouse.packed();
    }

    pub fn end_frame(&mut self) {
        self.constants.frame = self.constants.frame.wrapping_add(1);
    }

    /// Runs the active shader over the whole output.
    pub fn render(&mut self, dispatcher: &TileDispatcher, mode: DispatchMode) {
        let (width, height) = (self.framebuffer.width(), self.framebuffer.height());
        dispatcher.dispatch(
            &self.shader,
            &self.constants,
            &mut self.framebuffer,
            width,
            height,
            mode,
        );
    }

    /// Applies pointer input. Other events are ignored.
    pub fn handle_pointer(&mut self, event: &SurfaceEvent) {
        match *event {
            SurfaceEvent::CursorMoved { x, y } => {
                let height = self.framebuffer.height() as f32;
                self.hover = [x, height - y];
                if self.mouse.pressed {
                    self.mouse.cursor = self.hover;
                }
            }
            SurfaceEvent::MouseButton { pressed } => {
                if pressed {
                    self.mouse.cursor = self.hover;
                    self.mouse.click = self.hover;
                }
                self.mouse.pressed = pressed;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{solid_fill, PixelKernel};

    fn sample(seconds: f32) -> TimeSample {
        TimeSample {
            seconds,
            delta: 0.0,
        }
    }

    #[test]
    fn output_size_updates_constants() {
        let mut ctx = ViewerContext::new(solid_fill("red", [1.0, 0.0, 0.0, 1.0]));
        ctx.set_output_size(20, 10);
        assert_eq!(ctx.constants().resolution, [20.0, 10.0, 1.0]);
        assert_eq!(ctx.constants().pitch, ctx.framebuffer().pitch());
        assert_eq!(ctx.framebuffer().pitch(), 24);
    }

    #[test]
    fn frame_counter_advances_and_resets() {
        let mut ctx = ViewerContext::new(solid_fill("red", [1.0, 0.0, 0.0, 1.0]));
        for _ in 0..3 {
            ctx.begin_frame(sample(0.0));
            ctx.end_frame();
        }
        assert_eq!(ctx.constants().frame, 3);
        ctx.reset_frames();
        assert_eq!(ctx.constants().frame, 0);
    }

    #[test]
    fn shader_sees_time_and_frame() {
        let shader = CompiledShader::new(
            "time",
            PixelKernel::new(|constants: &ViewerConstants, _| {
                [constants.time, constants.frame as f32 * 0.5, 0.0, 1.0]
            }),
        );
        let mut ctx = ViewerContext::new(shader);
        let dispatcher = TileDispatcher::new(2).unwrap();
        ctx.set_output_size(8, 8);
        ctx.begin_frame(sample(1.0));
        ctx.end_frame();
        ctx.begin_frame(sample(1.0));
        ctx.render(&dispatcher, DispatchMode::Parallel);
        assert_eq!(ctx.framebuffer().pixel(3, 3), Some(0xff00_7fff));
    }

    #[test]
    fn mouse_flips_y_and_tracks_clicks() {
        let mut ctx = ViewerContext::new(solid_fill("red", [1.0, 0.0, 0.0, 1.0]));
        ctx.set_output_size(100, 50);
        ctx.handle_pointer(&SurfaceEvent::CursorMoved { x: 10.0, y: 5.0 });
        ctx.begin_frame(sample(0.0));
        assert_eq!(ctx.constants().mouse, [0.0, 0.0, 0.0, 0.0]);

        ctx.handle_pointer(&SurfaceEvent::MouseButton { pressed: true });
        ctx.handle_pointer(&SurfaceEvent::CursorMoved { x: 20.0, y: 10.0 });
        ctx.begin_frame(sample(0.0));
        assert_eq!(ctx.constants().mouse, [20.0, 40.0, 10.0, 45.0]);

        ctx.handle_pointer(&SurfaceEvent::MouseButton { pressed: false });
        ctx.begin_frame(sample(0.0));
        assert_eq!(ctx.constants().mouse, [20.0, 40.0, -10.0, -45.0]);
    }
}
