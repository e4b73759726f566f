//! `embedded-graphics` backend for the status screens.
//!
//! [`OledCanvas`] turns the core's [`RenderTarget`] calls into primitives on
//! any monochrome [`DrawTarget`]. The SSD1306 driver runs in buffered mode,
//! so nothing reaches the glass until [`Flush::flush`] pushes the frame out.

use core::fmt;
use core::fmt::Write as _;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;
use switch_core::display::{Font, GLYPH_BASE, RenderTarget};

/// Outer diameter of the slot badge.
const BADGE_DIAMETER: u32 = 15;

/// Frame buffer that can be pushed to the panel.
pub trait Flush {
    fn flush(&mut self) -> Result<(), GraphicsError>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GraphicsError {
    /// Drawing into the frame buffer failed.
    Draw,
    /// Transferring the frame buffer to the panel failed.
    Flush,
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::Draw => f.write_str("frame buffer draw failed"),
            GraphicsError::Flush => f.write_str("panel flush failed"),
        }
    }
}

/// [`RenderTarget`] over a monochrome draw target.
pub struct OledCanvas<D> {
    display: D,
    font: Font,
}

impl<D> OledCanvas<D>
where
    D: DrawTarget<Color = BinaryColor> + Flush,
{
    pub const fn new(display: D) -> Self {
        Self {
            display,
            font: Font::Large,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn mono_font(&self) -> &'static MonoFont<'static> {
        match self.font {
            Font::Large => &FONT_10X20,
            Font::Symbols => &FONT_6X10,
        }
    }
}

impl<D> RenderTarget for OledCanvas<D>
where
    D: DrawTarget<Color = BinaryColor> + Flush,
{
    type Error = GraphicsError;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.display
            .clear(BinaryColor::Off)
            .map_err(|_| GraphicsError::Draw)
    }

    fn select_font(&mut self, font: Font) {
        self.font = font;
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<(), Self::Error> {
        let style = MonoTextStyle::new(self.mono_font(), BinaryColor::On);
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Alphabetic)
            .draw(&mut self.display)
            .map(|_| ())
            .map_err(|_| GraphicsError::Draw)
    }

    /// Renders the circled-digit glyphs as a ring with the digit inside;
    /// (`x`, `y`) is the bottom-left corner of the badge.
    fn draw_glyph(&mut self, x: i32, y: i32, codepoint: u32) -> Result<(), Self::Error> {
        let top_left = Point::new(x, y + 1 - BADGE_DIAMETER.cast_signed());
        let badge = Circle::new(top_left, BADGE_DIAMETER);
        badge
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.display)
            .map_err(|_| GraphicsError::Draw)?;

        let mut label: String<4> = String::new();
        match codepoint.checked_sub(GLYPH_BASE) {
            Some(digit @ 1..=9) => write!(label, "{digit}"),
            _ => label.write_char('?'),
        }
        .map_err(|_| GraphicsError::Draw)?;

        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_text_style(&label, badge.center(), style, centered)
            .draw(&mut self.display)
            .map(|_| ())
            .map_err(|_| GraphicsError::Draw)
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.display.flush()
    }
}
