use std::fmt;

use crate::constants::{GlobalParams, ViewerConstants, TILE_SIZE};
use crate::dispatch::Tile;
use crate::framebuffer::{pack_rgba, Framebuffer};

/// Capability to render one tile of the output grid.
///
/// Implemented by natively compiled modules and by in-process Rust kernels.
pub trait TileKernel: Send + Sync {
    /// Renders the `TILE_SIZE x TILE_SIZE` pixel group `group = [x, y, 0]`.
    ///
    /// # Safety
    ///
    /// `params` must describe a framebuffer whose pitch and row count cover
    /// the tile, and no other invocation may render the same group while
    /// this one runs.
    unsafe fn run_group(&self, group: [i32; 3], params: &GlobalParams<'_>);
}

/// A loaded shader ready for dispatch.
///
/// Replaced wholesale whenever a new shader (or the fallback) is loaded.
pub struct CompiledShader {
    label: String,
    kernel: Box<dyn TileKernel>,
}

impl CompiledShader {
    pub fn new(label: impl Into<String>, kernel: impl TileKernel + 'static) -> Self {
        Self {
            label: label.into(),
            kernel: Box::new(kernel),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Renders a single tile into `framebuffer`.
    pub fn invoke(
        &self,
        tile_x: i32,
        tile_y: i32,
        constants: &ViewerConstants,
        framebuffer: &mut Framebuffer,
    ) {
        let columns = framebuffer.pitch() / TILE_SIZE;
        let rows = framebuffer.rows() / TILE_SIZE;
        if tile_x < 0 || tile_y < 0 || tile_x as u32 >= columns || tile_y as u32 >= rows {
            return;
        }
        let mut constants = *constants;
        constants.pitch = framebuffer.pitch();
        let params = GlobalParams::new(&constants, framebuffer.pixels_mut());
        self.run_tile(Tile { x: tile_x, y: tile_y }, &params);
    }

    /// Callers must not run the same tile concurrently.
    pub(crate) fn run_tile(&self, tile: Tile, params: &GlobalParams<'_>) {
        // SAFETY: the dispatcher hands every tile to exactly one invocation
        // and sizes the framebuffer to whole tiles.
        unsafe { self.kernel.run_group([tile.x, tile.y, 0], params) }
    }
}

impl fmt::Debug for CompiledShader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledShader")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// In-process kernel evaluating a Rust closure per pixel.
///
/// Follows the same contract as the generated `renderRunner` entry point:
/// the closure receives the pixel centre with a bottom-left origin and
/// returns a colour that is clamped and packed before being stored.
pub struct PixelKernel<F> {
    shade: F,
}

impl<F> PixelKernel<F>
where
    F: Fn(&ViewerConstants, [f32; 2]) -> [f32; 4] + Send + Sync,
{
    pub fn new(shade: F) -> Self {
        Self { shade }
    }
}

impl<F> TileKernel for PixelKernel<F>
where
    F: Fn(&ViewerConstants, [f32; 2]) -> [f32; 4] + Send + Sync,
{
    unsafe fn run_group(&self, group: [i32; 3], params: &GlobalParams<'_>) {
        let constants = params.constants();
        let pitch = constants.pitch as usize;
        let base_x = group[0] as u32 * TILE_SIZE;
        let base_y = group[1] as u32 * TILE_SIZE;
        for dy in 0..TILE_SIZE {
            for dx in 0..TILE_SIZE {
                let (x, y) = (base_x + dx, base_y + dy);
                let frag_coord = [
                    x as f32 + 0.5,
                    constants.resolution[1] - (y as f32 + 0.5),
                ];
                let color = (self.shade)(constants, frag_coord);
                params.store(x as usize + y as usize * pitch, pack_rgba(color));
            }
        }
    }
}

/// Native stand-in used when not even the fallback source compiles.
pub fn solid_fill(label: &str, color: [f32; 4]) -> CompiledShader {
    CompiledShader::new(label, PixelKernel::new(move |_, _| color))
}
