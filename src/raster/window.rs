/// Square window tiling of a raster, row-major, clipped at the image edges

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Image coordinates of the pixel at `offset` in row-major window order
    pub fn pixel_at(&self, offset: usize) -> (u32, u32) {
        let width = self.width as usize;
        (self.x + (offset % width) as u32, self.y + (offset / width) as u32)
    }
}

/// Iterator over the windows covering a `width` x `height` image.
///
/// Windows advance left to right by `side`; past the last column the origin
/// wraps to column 0 of the next band. Edge windows shrink to whatever is
/// left of the image, so no window is ever empty.
#[derive(Debug, Clone)]
pub struct WindowGrid {
    width: u32,
    height: u32,
    side: u32,
    next_x: u32,
    next_y: u32,
}

impl WindowGrid {
    pub fn new(width: u32, height: u32, side: u32) -> Self {
        Self {
            width,
            height,
            side: side.max(1),
            next_x: 0,
            next_y: 0,
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Total number of windows, including those already yielded
    pub fn window_count(&self) -> usize {
        self.width.div_ceil(self.side) as usize * self.height.div_ceil(self.side) as usize
    }
}

impl Iterator for WindowGrid {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.width == 0 || self.next_y >= self.height {
            return None;
        }

        let window = Window {
            x: self.next_x,
            y: self.next_y,
            width: self.side.min(self.width - self.next_x),
            height: self.side.min(self.height - self.next_y),
        };

        self.next_x = self.next_x.saturating_add(self.side);
        if self.next_x >= self.width {
            self.next_x = 0;
            self.next_y = self.next_y.saturating_add(self.side);
        }
        Some(window)
    }
}
