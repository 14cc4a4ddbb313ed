use emu8_core::{FrameBuffer, DISPLAY_WIDTH};

/// Renders a FrameBuffer as text, one line per row: `#` for lit pixels and `.` for dark ones
pub fn frame_to_text(frame: &FrameBuffer) -> String {
    let mut text = String::with_capacity(frame.len() * (DISPLAY_WIDTH + 1));
    for row in frame.iter() {
        text.extend(row.iter().map(|&lit| if lit { '#' } else { '.' }));
        text.push('\n');
    }
    text
}

#[cfg(feature = "sdl")]
pub use window::Display;

#[cfg(feature = "sdl")]
mod window {
    use anyhow::Context;
    use sdl2::pixels::PixelFormatEnum;

    use emu8_core::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};

    const SCALE: usize = 10;

    /// # Display
    /// The Chip-8 display is composed of 64x32 black/white pixels.
    /// The display only gets a call to `render` when the Chip-8 FrameBuffer is updated.
    pub struct Display {
        canvas: sdl2::render::WindowCanvas,
    }

    impl Display {
        /// Opens a window bound to an sdl2 context, each Chip-8 pixel drawn `SCALE` wide.
        pub fn new(sdl: &sdl2::Sdl) -> anyhow::Result<Self> {
            let video_subsystem = sdl.video().map_err(anyhow::Error::msg)?;
            let window = video_subsystem
                .window(
                    "Emu-8",
                    (DISPLAY_WIDTH * SCALE) as u32,
                    (DISPLAY_HEIGHT * SCALE) as u32,
                )
                .position_centered()
                .opengl()
                .build()
                .context("unable to open window")?;
            let canvas = window
                .into_canvas()
                .build()
                .context("unable to create canvas")?;

            Ok(Display { canvas })
        }

        /// Formats a Chip-8 FrameBuffer as concatenated rows of RGB24 pixels,
        /// white where lit and black elsewhere.
        pub(super) fn frame_to_rgb(frame: &FrameBuffer) -> Vec<u8> {
            frame
                .iter()
                .flat_map(|row| row.iter())
                .flat_map(|&lit| std::iter::repeat(u8::from(lit) * 255).take(3))
                .collect()
        }

        pub fn render(&mut self, frame: &FrameBuffer) -> anyhow::Result<()> {
            let texture_creator = self.canvas.texture_creator();
            let mut texture = texture_creator.create_texture_streaming(
                PixelFormatEnum::RGB24,
                DISPLAY_WIDTH as u32,
                DISPLAY_HEIGHT as u32,
            )?;

            let pixels = Display::frame_to_rgb(frame);
            texture
                .with_lock(None, |buffer: &mut [u8], _pitch: usize| {
                    buffer[..pixels.len()].copy_from_slice(&pixels);
                })
                .map_err(anyhow::Error::msg)?;

            self.canvas
                .copy(&texture, None, None)
                .map_err(anyhow::Error::msg)?;
            self.canvas.present();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu8_core::DISPLAY_HEIGHT;

    fn frame_with_corners() -> FrameBuffer {
        let mut frame = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        frame[0][1] = true;
        frame[1][0] = true;
        frame
    }

    #[test]
    fn test_frame_to_text() {
        let text = frame_to_text(&frame_with_corners());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), DISPLAY_HEIGHT);
        assert!(lines.iter().all(|line| line.len() == DISPLAY_WIDTH));
        assert!(lines[0].starts_with(".#.."));
        assert!(lines[1].starts_with("#..."));
        assert_eq!(text.matches('#').count(), 2);
    }

    #[cfg(feature = "sdl")]
    #[test]
    fn test_frame_to_rgb() {
        let rgb = Display::frame_to_rgb(&frame_with_corners());

        let mut expected: Vec<u8> = vec![0; 6144];
        expected[0..6].copy_from_slice(&[0, 0, 0, 255, 255, 255]);
        expected[192..198].copy_from_slice(&[255, 255, 255, 0, 0, 0]);

        assert_eq!(rgb, expected);
    }
}
