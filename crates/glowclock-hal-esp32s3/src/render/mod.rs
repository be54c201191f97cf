mod glyph;
mod text;

use glowclock_core::render::{Frame, Rendered};
use hub75::FrameBuffer;

use text::draw_text_centered;

const CLOCK_ROWS: [usize; 3] = [1, 12, 23];
const LABEL_ROW: usize = 2;
const COUNTDOWN_ROW: usize = 14;
const COUNTDOWN_SCALE: usize = 2;

pub trait FrameRenderer {
    /// `None` blanks the panel.
    fn render(&mut self, rendered: Option<&Rendered>, frame: &mut FrameBuffer);
}

/// Lays core frames out on the 64x32 matrix with the 5x7 font.
#[derive(Debug, Default)]
pub struct MatrixRenderer;

impl MatrixRenderer {
    pub const fn new() -> Self {
        Self
    }
}

impl FrameRenderer for MatrixRenderer {
    fn render(&mut self, rendered: Option<&Rendered>, frame: &mut FrameBuffer) {
        frame.clear(0);

        let Some(rendered) = rendered else {
            return;
        };
        let color = rendered.appearance.color565;

        match &rendered.frame {
            Frame::Clock {
                weekday,
                date,
                time,
            } => {
                draw_text_centered(frame, CLOCK_ROWS[0], weekday, 1, color);
                draw_text_centered(frame, CLOCK_ROWS[1], date, 1, color);
                draw_text_centered(frame, CLOCK_ROWS[2], time, 1, color);
            }
            Frame::Pomodoro { label, countdown } => {
                draw_text_centered(frame, LABEL_ROW, label, 1, color);
                draw_text_centered(frame, COUNTDOWN_ROW, countdown, COUNTDOWN_SCALE, color);
            }
            Frame::Blink { lit } => {
                if *lit {
                    frame.clear(color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glowclock_core::{clock::LocalDateTime, pomodoro::countdown_text, render::Appearance};

    use super::*;

    fn lit_pixels(frame: &FrameBuffer) -> usize {
        frame.pixels().iter().filter(|&&p| p != 0).count()
    }

    fn appearance(color565: u16) -> Appearance {
        Appearance {
            color565,
            ..Appearance::FLASH
        }
    }

    #[test]
    fn blink_fills_or_clears_the_panel() {
        let mut renderer = MatrixRenderer::new();
        let mut frame = FrameBuffer::new();

        let lit = Rendered {
            frame: Frame::Blink { lit: true },
            appearance: Appearance::FLASH,
        };
        renderer.render(Some(&lit), &mut frame);
        assert!(frame.pixels().iter().all(|&p| p == 0xFFFF));

        let dark = Rendered {
            frame: Frame::Blink { lit: false },
            appearance: Appearance::FLASH,
        };
        renderer.render(Some(&dark), &mut frame);
        assert_eq!(lit_pixels(&frame), 0);
    }

    #[test]
    fn none_blanks_previous_content() {
        let mut renderer = MatrixRenderer::new();
        let mut frame = FrameBuffer::new();
        frame.clear(0x1234);

        renderer.render(None, &mut frame);

        assert_eq!(lit_pixels(&frame), 0);
    }

    #[test]
    fn countdown_is_centred_at_double_scale() {
        let mut renderer = MatrixRenderer::new();
        let mut frame = FrameBuffer::new();
        let rendered = Rendered {
            frame: Frame::Pomodoro {
                label: "WORK!",
                countdown: countdown_text(25 * 60),
            },
            appearance: appearance(0xF800),
        };

        renderer.render(Some(&rendered), &mut frame);

        // "25:00" is 58px wide at scale 2, so it starts at x=3. The first column
        // of '2' has its second row set.
        assert_eq!(frame.pixel(3, COUNTDOWN_ROW + 2), Some(0xF800));
        assert_eq!(frame.pixel(2, COUNTDOWN_ROW + 2), Some(0));
        assert!(frame.pixels().iter().all(|&p| p == 0 || p == 0xF800));
    }

    #[test]
    fn clock_draws_three_lines_in_setting_color() {
        let mut renderer = MatrixRenderer::new();
        let mut frame = FrameBuffer::new();
        let rendered = Rendered {
            frame: LocalDateTime::from_unix(1_792_400_823, 0).clock_frame(),
            appearance: appearance(0x07E0),
        };

        renderer.render(Some(&rendered), &mut frame);

        for top in CLOCK_ROWS {
            let band_lit = (top..top + 7)
                .flat_map(|y| frame.row(y).unwrap().iter())
                .any(|&p| p == 0x07E0);
            assert!(band_lit, "row band at y={top} is empty");
        }
    }
}
