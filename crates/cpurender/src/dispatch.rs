use rayon::prelude::*;

use crate::constants::{GlobalParams, ViewerConstants, TILE_SIZE};
use crate::framebuffer::Framebuffer;
use crate::shader::CompiledShader;

/// Coordinates of one `TILE_SIZE x TILE_SIZE` pixel group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    /// Pixel rectangle `(x0, y0, x1, y1)` covered by the tile, end exclusive.
    pub fn footprint(&self) -> (u32, u32, u32, u32) {
        let x0 = self.x as u32 * TILE_SIZE;
        let y0 = self.y as u32 * TILE_SIZE;
        (x0, y0, x0 + TILE_SIZE, y0 + TILE_SIZE)
    }
}

/// Tiles covering a `width x height` image, ceil-divided by the tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            columns: width.div_ceil(TILE_SIZE),
            rows: height.div_ceil(TILE_SIZE),
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile at a row-major flattened index.
    pub fn tile(&self, index: usize) -> Tile {
        let columns = self.columns as usize;
        Tile {
            x: (index % columns) as i32,
            y: (index / columns) as i32,
        }
    }

    /// Row-major iteration order used by sequential dispatch.
    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.len()).map(|index| self.tile(index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    Sequential,
    #[default]
    Parallel,
}

impl DispatchMode {
    pub fn from_parallel(parallel: bool) -> Self {
        if parallel {
            Self::Parallel
        } else {
            Self::Sequential
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to start tile worker pool: {0}")]
pub struct DispatchError(#[from] rayon::ThreadPoolBuildError);

/// Runs a compiled shader over every tile of the output.
pub struct TileDispatcher {
    pool: rayon::ThreadPool,
}

impl TileDispatcher {
    /// `threads == 0` sizes the pool to the available parallelism.
    pub fn new(threads: usize) -> Result<Self, DispatchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("tileshade-tile-{index}"))
            .build()?;
        tracing::debug!(threads = pool.current_num_threads(), "tile worker pool ready");
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Invokes `shader` once per tile of a `width x height` grid.
    ///
    /// The grid never extends past the framebuffer, and the kernel always
    /// sees the framebuffer's own pitch. Parallel mode returns only after
    /// every tile has finished.
    pub fn dispatch(
        &self,
        shader: &CompiledShader,
        constants: &ViewerConstants,
        framebuffer: &mut Framebuffer,
        width: u32,
        height: u32,
        mode: DispatchMode,
    ) {
        let grid = TileGrid::new(width.min(framebuffer.width()), height.min(framebuffer.height()));
        if grid.is_empty() {
            return;
        }

        let mut constants = *constants;
        constants.pitch = framebuffer.pitch();
        let params = GlobalParams::new(&constants, framebuffer.pixels_mut());

        match mode {
            DispatchMode::Sequential => {
                for tile in grid.iter() {
                    shader.run_tile(tile, &params);
                }
            }
            DispatchMode::Parallel => self.pool.install(|| {
                (0..grid.len())
                    .into_par_iter()
                    .for_each(|index| shader.run_tile(grid.tile(index), &params));
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::shader::{solid_fill, PixelKernel, TileKernel};

    #[test]
    fn grid_size_is_ceil_divided() {
        for (width, height) in [(1, 1), (8, 8), (9, 8), (17, 31), (640, 360), (0, 5)] {
            let grid = TileGrid::new(width, height);
            assert_eq!(
                grid.len() as u32,
                width.div_ceil(8) * height.div_ceil(8),
                "{width}x{height}"
            );
        }
    }

    #[test]
    fn grid_covers_every_pixel() {
        let (width, height) = (21, 13);
        let grid = TileGrid::new(width, height);
        let mut covered = HashSet::new();
        for tile in grid.iter() {
            let (x0, y0, x1, y1) = tile.footprint();
            for y in y0..y1 {
                for x in x0..x1 {
                    covered.insert((x, y));
                }
            }
        }
        for y in 0..height {
            for x in 0..width {
                assert!(covered.contains(&(x, y)), "pixel {x},{y} not covered");
            }
        }
    }

    #[test]
    fn sequential_order_is_row_major() {
        let grid = TileGrid::new(24, 16);
        let order: Vec<(i32, i32)> = grid.iter().map(|tile| (tile.x, tile.y)).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    struct Counting(Arc<AtomicUsize>);

    impl TileKernel for Counting {
        unsafe fn run_group(&self, _group: [i32; 3], _params: &GlobalParams<'_>) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn invokes_once_per_tile() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shader = CompiledShader::new("count", Counting(calls.clone()));
        let dispatcher = TileDispatcher::new(4).unwrap();
        let mut framebuffer = Framebuffer::new(100, 50);
        for mode in [DispatchMode::Sequential, DispatchMode::Parallel] {
            calls.store(0, Ordering::Relaxed);
            dispatcher.dispatch(
                &shader,
                &ViewerConstants::default(),
                &mut framebuffer,
                100,
                50,
                mode,
            );
            assert_eq!(calls.load(Ordering::Relaxed), 13 * 7);
        }
    }

    #[test]
    fn parallel_and_sequential_output_match() {
        let shader = CompiledShader::new(
            "uv",
            PixelKernel::new(|constants: &ViewerConstants, coord: [f32; 2]| {
                [
                    coord[0] / constants.resolution[0],
                    coord[1] / constants.resolution[1],
                    0.25,
                    1.0,
                ]
            }),
        );
        let dispatcher = TileDispatcher::new(0).unwrap();
        let mut constants = ViewerConstants::default();
        constants.set_output(37, 29, 37);

        let mut sequential = Framebuffer::new(37, 29);
        let mut parallel = Framebuffer::new(37, 29);
        dispatcher.dispatch(&shader, &constants, &mut sequential, 37, 29, DispatchMode::Sequential);
        dispatcher.dispatch(&shader, &constants, &mut parallel, 37, 29, DispatchMode::Parallel);

        assert_eq!(sequential.pixels(), parallel.pixels());
        assert_ne!(sequential.pixel(36, 28), Some(0));
    }

    #[test]
    fn grid_is_clamped_to_the_framebuffer() {
        let shader = solid_fill("red", [1.0, 0.0, 0.0, 1.0]);
        let dispatcher = TileDispatcher::new(1).unwrap();
        let mut framebuffer = Framebuffer::new(8, 8);
        dispatcher.dispatch(
            &shader,
            &ViewerConstants::default(),
            &mut framebuffer,
            64,
            64,
            DispatchMode::Parallel,
        );
        assert_eq!(framebuffer.pixels().len(), 64);
        assert!(framebuffer.pixels().iter().all(|&pixel| pixel == 0xff00_00ff));
    }
}
