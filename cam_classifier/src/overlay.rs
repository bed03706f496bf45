//! Label overlay on displayed frames.
//!
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use lazy_static::lazy_static;

const TEXT_X: i32 = 10;
/// Baseline of the text, the glyphs extend upwards by about the font size.
const TEXT_BASELINE: i32 = 30;
const FONT_SIZE: f32 = 24.0;

/// Draw the predicted class name onto the frame.
pub fn annotate(frame: &mut RgbImage, label: &str) {
    let color = Rgb::from([0, 255, 0]);
    let top = TEXT_BASELINE - FONT_SIZE as i32;

    draw_text_mut(
        frame,
        color,
        TEXT_X,
        top,
        rusttype::Scale::uniform(FONT_SIZE),
        &DEJAVU_MONO,
        &format!("Detectado: {label}"),
    );
}

lazy_static! {
    static ref DEJAVU_MONO: rusttype::Font<'static> = {
        let font_data: &[u8] = include_bytes!("../../resources/DejaVuSansMono.ttf");
        let font: rusttype::Font<'static> =
            rusttype::Font::try_from_bytes(font_data).expect("failed to load font");
        font
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_label_is_drawn_in_green() {
        let mut frame = RgbImage::new(320, 60);
        annotate(&mut frame, "Vaca");

        let drawn: Vec<_> = frame.pixels().filter(|px| px.0 != [0, 0, 0]).collect();
        assert!(!drawn.is_empty());
        assert!(drawn.iter().all(|px| px.0[0] == 0 && px.0[2] == 0));
    }

    #[test]
    fn test_small_frames_do_not_panic() {
        let mut frame = RgbImage::new(8, 8);
        annotate(&mut frame, "Ningún animal");
    }
}
