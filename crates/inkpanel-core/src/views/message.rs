use embedded_graphics::{
    mono_font::{ascii, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle,
};
use embedded_text::{alignment::HorizontalAlignment, style::TextBoxStyleBuilder, TextBox};

/// Free text pushed from the network, word-wrapped over the whole panel.
#[derive(Debug, Clone, Default)]
pub struct MessageView {
    text: String,
}

impl MessageView {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn render<D: DrawTarget<Color = BinaryColor>>(&self, display: &mut D) -> Result<(), D::Error> {
        display.clear(BinaryColor::Off)?;
        let size = display.bounding_box().size;
        let bounds = Rectangle::new(
            Point::new(6, 6),
            Size::new(size.width.saturating_sub(12), size.height.saturating_sub(12)),
        );
        let character_style = MonoTextStyle::new(&ascii::FONT_9X15, BinaryColor::On);
        let textbox_style = TextBoxStyleBuilder::new()
            .alignment(HorizontalAlignment::Left)
            .paragraph_spacing(4)
            .build();
        TextBox::with_textbox_style(&self.text, bounds, character_style, textbox_style)
            .draw(display)?;
        Ok(())
    }
}
