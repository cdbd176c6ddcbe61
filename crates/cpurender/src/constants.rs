use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

/// Edge length of the square pixel group one kernel invocation renders.
pub const TILE_SIZE: u32 = 8;

/// Per-frame values visible to shader code as `iTime`, `iFrame`, `iMouse`
/// and `iResolution`.
///
/// The layout is shared with compiled shaders, which read the fields by
/// offset. It must match the `ShaderViewerConstants` struct emitted by
/// [`crate::wrap_shader`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ViewerConstants {
    /// Seconds since the (resettable) epoch.
    pub time: f32,
    pub frame: i32,
    /// Pixels per framebuffer row.
    pub pitch: u32,
    /// Cursor x, cursor y, last click x, last click y.
    pub mouse: [f32; 4],
    /// Width, height, depth (always 1).
    pub resolution: [f32; 3],
}

impl ViewerConstants {
    pub fn set_output(&mut self, width: u32, height: u32, pitch: u32) {
        self.pitch = pitch;
        self.resolution = [width as f32, height as f32, 1.0];
    }
}

/// Global parameter block handed to every kernel invocation.
///
/// Mirrors the compiled module's globals: the constant buffer pointer
/// followed by the output buffer pointer and its length in pixels.
#[repr(C)]
pub struct GlobalParams<'a> {
    constants: *const ViewerConstants,
    pixels: *mut u32,
    pixel_count: usize,
    _borrow: PhantomData<(&'a ViewerConstants, &'a mut [u32])>,
}

// Kernel invocations running in parallel only ever write disjoint tiles.
unsafe impl Send for GlobalParams<'_> {}
unsafe impl Sync for GlobalParams<'_> {}

impl<'a> GlobalParams<'a> {
    pub(crate) fn new(constants: &'a ViewerConstants, pixels: &'a mut [u32]) -> Self {
        Self {
            constants,
            pixel_count: pixels.len(),
            pixels: pixels.as_mut_ptr(),
            _borrow: PhantomData,
        }
    }

    pub fn constants(&self) -> &'a ViewerConstants {
        // SAFETY: built from a shared borrow that outlives `'a`.
        unsafe { &*self.constants }
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Writes one packed pixel. Out-of-range indices are ignored.
    ///
    /// # Safety
    ///
    /// No other thread may access `index` while this call runs. The tile
    /// dispatcher guarantees this as long as kernels only write pixels of the
    /// tile they were invoked for.
    pub unsafe fn store(&self, index: usize, pixel: u32) {
        if index < self.pixel_count {
            self.pixels.add(index).write(pixel);
        }
    }
}
