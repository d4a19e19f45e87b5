//! Frame buffers and the command renderer.

use rayon::prelude::*;

use super::color::Rgba;
use crate::schema::{ConfigError, validate_dimensions};
use crate::script::Command;

/// One frame of `width * height` cells in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    cells: Vec<Rgba>,
}

impl FrameBuffer {
    /// A fully transparent black frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Rgba::TRANSPARENT; width as usize * height as usize],
        }
    }

    /// Wrap existing cells. Returns `None` if the cell count does not match.
    pub fn from_cells(width: u32, height: u32, cells: Vec<Rgba>) -> Option<Self> {
        (cells.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn cells(&self) -> &[Rgba] {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Rgba] {
        &mut self.cells
    }

    /// Raw `r g b a` bytes, row-major.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Cell at 0-indexed `(x, y)`, if inside the frame.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y as usize * self.width as usize + x as usize])
    }

    /// Number of cells that are not transparent black.
    pub fn painted_cells(&self) -> usize {
        self.cells.iter().filter(|c| **c != Rgba::TRANSPARENT).count()
    }
}

/// Counters gathered while rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Cell writes across all frames.
    pub pixels_drawn: u64,
    /// Command pixels outside the canvas (counted once per command).
    pub pixels_out_of_bounds: u64,
    /// Frame numbers named by commands but outside `1..=total_frames`.
    pub frames_out_of_range: u64,
}

/// A command reduced to what the per-frame loop needs.
struct Prepared {
    first: u32,
    last: u32,
    color: Rgba,
    cells: Vec<usize>,
}

impl Prepared {
    #[inline]
    fn covers(&self, frame: u32) -> bool {
        self.first <= frame && frame <= self.last
    }
}

/// Render every frame. Equivalent to [`render_with_stats`] without counters.
pub fn render(
    commands: &[Command],
    width: u32,
    height: u32,
    total_frames: u32,
) -> Result<Vec<FrameBuffer>, ConfigError> {
    render_with_stats(commands, width, height, total_frames).map(|(frames, _)| frames)
}

/// Render `total_frames` frames of `width x height` from `commands`.
///
/// Commands are composited in list order. Frame numbers and pixel
/// coordinates are 1-indexed; anything outside the animation or canvas is
/// skipped.
pub fn render_with_stats(
    commands: &[Command],
    width: u32,
    height: u32,
    total_frames: u32,
) -> Result<(Vec<FrameBuffer>, RenderStats), ConfigError> {
    validate_dimensions(width, height)?;

    let mut stats = RenderStats::default();
    let mut prepared = Vec::with_capacity(commands.len());

    for command in commands {
        let named = u64::from(command.end_frame).saturating_sub(u64::from(command.start_frame));
        let named = if command.end_frame >= command.start_frame {
            named + 1
        } else {
            0
        };

        let first = command.start_frame.max(1);
        let last = command.end_frame.min(total_frames);
        let covered = if first <= last {
            u64::from(last - first) + 1
        } else {
            0
        };
        stats.frames_out_of_range += named - covered;
        if covered == 0 {
            log::warn!(
                "command {} F{}-{} touches no frame of {}",
                command.color,
                command.start_frame,
                command.end_frame,
                total_frames
            );
            continue;
        }

        let mut cells = Vec::with_capacity(command.pixels.len());
        for pixel in &command.pixels {
            let (x, y) = (pixel.x.wrapping_sub(1), pixel.y.wrapping_sub(1));
            if x < width && y < height {
                cells.push(y as usize * width as usize + x as usize);
            } else {
                stats.pixels_out_of_bounds += 1;
            }
        }
        stats.pixels_drawn += cells.len() as u64 * covered;

        prepared.push(Prepared {
            first,
            last,
            color: command.rgba(),
            cells,
        });
    }

    let mut frames = vec![FrameBuffer::new(width, height); total_frames as usize];
    frames.par_iter_mut().enumerate().for_each(|(index, frame)| {
        let number = index as u32 + 1;
        for command in prepared.iter().filter(|c| c.covers(number)) {
            for &cell in &command.cells {
                frame.cells[cell].blend(command.color);
            }
        }
    });

    log::debug!(
        "rendered {} frames ({}x{}): {} pixels drawn, {} out of bounds, {} frame hits out of range",
        total_frames,
        width,
        height,
        stats.pixels_drawn,
        stats.pixels_out_of_bounds,
        stats.frames_out_of_range
    );

    Ok((frames, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Pixel, parse};
    use proptest::prelude::*;

    fn command(start: u32, end: u32, color: &str, pixels: &[(u32, u32)]) -> Command {
        Command {
            start_frame: start,
            end_frame: end,
            color: color.to_string(),
            pixels: pixels.iter().map(|&(x, y)| Pixel::new(x, y)).collect(),
        }
    }

    #[test]
    fn test_basic_scenario() {
        let script = parse("info{DISPLAY=2x2\nF=2\n} F1-2{ #FF0000 { P=1x1,2x2 } }");
        let frames = render(&script.commands, 2, 2, 2).unwrap();
        assert_eq!(frames.len(), 2);

        let red = Rgba::opaque(255, 0, 0);
        for frame in &frames {
            assert_eq!(
                frame.cells(),
                &[red, Rgba::TRANSPARENT, Rgba::TRANSPARENT, red]
            );
        }
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn test_top_left_and_out_of_bounds() {
        let commands = [command(1, 1, "#FFFFFF", &[(1, 1), (6, 1), (0, 3)])];
        let (frames, stats) = render_with_stats(&commands, 5, 5, 1).unwrap();
        assert_eq!(frames[0].get(0, 0), Some(Rgba::WHITE));
        assert_eq!(frames[0].painted_cells(), 1);
        assert_eq!(stats.pixels_out_of_bounds, 2);
        assert_eq!(stats.pixels_drawn, 1);
    }

    #[test]
    fn test_frame_range_is_clamped() {
        let commands = [command(0, 9, "#00FF00", &[(1, 1)])];
        let (frames, stats) = render_with_stats(&commands, 1, 1, 3).unwrap();
        assert!(frames.iter().all(|f| f.get(0, 0) == Some(Rgba::opaque(0, 255, 0))));
        // Frames 0 and 4..=9 are outside the animation.
        assert_eq!(stats.frames_out_of_range, 7);
    }

    #[test]
    fn test_command_outside_animation_is_skipped() {
        let commands = [command(5, 6, "#00FF00", &[(1, 1)]), command(3, 2, "#FFFFFF", &[(1, 1)])];
        let frames = render(&commands, 1, 1, 2).unwrap();
        assert!(frames.iter().all(|f| f.painted_cells() == 0));
    }

    #[test]
    fn test_later_commands_composite_on_top() {
        let commands = [
            command(1, 1, "#0000FF", &[(1, 1)]),
            command(1, 1, "rgba(255,0,0,128)", &[(1, 1)]),
        ];
        let frames = render(&commands, 1, 1, 1).unwrap();
        // 255 * 0.502 = 128, 255 * 0.498 = 126.99 -> 126
        assert_eq!(frames[0].get(0, 0), Some(Rgba::new(128, 0, 126, 255)));

        let reversed = [commands[1].clone(), commands[0].clone()];
        let frames = render(&reversed, 1, 1, 1).unwrap();
        assert_eq!(frames[0].get(0, 0), Some(Rgba::opaque(0, 0, 255)));
    }

    #[test]
    fn test_commands_only_touch_their_frames() {
        let commands = [command(2, 2, "#FFFFFF", &[(1, 1)])];
        let frames = render(&commands, 2, 1, 3).unwrap();
        assert_eq!(frames[0].painted_cells(), 0);
        assert_eq!(frames[1].painted_cells(), 1);
        assert_eq!(frames[2].painted_cells(), 0);
    }

    #[test]
    fn test_zero_frames() {
        let frames = render(&[command(1, 1, "#FFFFFF", &[(1, 1)])], 4, 4, 0).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            render(&[], 0, 4, 1),
            Err(ConfigError::InvalidDimensions { width: 0, height: 4 })
        ));
        assert!(render(&[], 4, 10_001, 1).is_err());
        assert!(render(&[], 10_000, 1, 0).is_ok());
    }

    #[test]
    fn test_as_bytes_is_row_major() {
        let commands = [command(1, 1, "rgb(1,2,3)", &[(2, 1)])];
        let frames = render(&commands, 2, 1, 1).unwrap();
        assert_eq!(frames[0].as_bytes(), &[0, 0, 0, 0, 1, 2, 3, 255]);
    }

    proptest! {
        #[test]
        fn prop_render_is_deterministic(
            pixels in prop::collection::vec((0u32..10, 0u32..10, 0u8..=255), 1..40),
            frames in 0u32..6,
        ) {
            let commands: Vec<_> = pixels
                .iter()
                .enumerate()
                .map(|(i, &(x, y, a))| {
                    let start = i as u32 % 4;
                    command(start, start + 2, &format!("rgba({},{},{},{a})", i * 7, i * 3, i), &[(x, y)])
                })
                .collect();
            let first = render(&commands, 8, 8, frames).unwrap();
            let second = render(&commands, 8, 8, frames).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
