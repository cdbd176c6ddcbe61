use crate::constants::TILE_SIZE;

/// Packed RGBA8 pixels (red in the lowest byte).
///
/// Storage is padded to whole tiles: `pitch` and `rows` are the visible
/// width and height rounded up to [`TILE_SIZE`], so boundary tiles never
/// address memory outside the allocation or inside a neighbouring row.
#[derive(Debug, Default)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pitch: u32,
    rows: u32,
    pixels: Vec<u32>,
}

impl Clone for Framebuffer {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            rows: self.rows,
            pixels: self.pixels.clone(),
        }
    }

    // Reuses the pixel allocation.
    fn clone_from(&mut self, source: &Self) {
        self.width = source.width;
        self.height = source.height;
        self.pitch = source.pitch;
        self.rows = source.rows;
        self.pixels.clone_from(&source.pixels);
    }
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let mut framebuffer = Self::default();
        framebuffer.resize(width, height);
        framebuffer
    }

    /// Reallocates for new visible dimensions. Returns `false` when the size
    /// is unchanged and the pixels were kept.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height && !self.pixels.is_empty() {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pitch = width.div_ceil(TILE_SIZE) * TILE_SIZE;
        self.rows = height.div_ceil(TILE_SIZE) * TILE_SIZE;
        self.pixels.clear();
        self.pixels
            .resize(self.pitch as usize * self.rows as usize, 0);
        true
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Pixel at visible coordinates, row 0 being the top of the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(x as usize + y as usize * self.pitch as usize)
            .copied()
    }

    /// Raw bytes in R, G, B, A order, `pitch * 4` bytes per row.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Clamps `color` to `[0, 1]` and packs it as little-endian RGBA8.
pub fn pack_rgba(color: [f32; 4]) -> u32 {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0) as u32;
    channel(color[0]) | channel(color[1]) << 8 | channel(color[2]) << 16 | channel(color[3]) << 24
}
