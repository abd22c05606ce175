//! User avatars for the terminal.
//!
//! An image load reports up to three outcomes through [`ImageTarget`];
//! [`AvatarTarget`] folds them into a single "avatar available" callback.

pub mod loader;

use image::DynamicImage;
use image::imageops::FilterType;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

pub use loader::{AvatarError, AvatarLoader};

const UPPER_HALF_BLOCK: &str = "\u{2580}";

/// Cell geometry an avatar is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayContext {
    pub cols: u16,
    pub rows: u16,
}

impl DisplayContext {
    /// Square-looking avatar `size` rows tall (cells are about twice as tall
    /// as they are wide).
    pub fn square(size: u16) -> Self {
        Self {
            cols: size.saturating_mul(2),
            rows: size,
        }
    }
}

// ---------------------------------------------------------------------------
// Drawable
// ---------------------------------------------------------------------------

/// A rendered avatar: one styled line per terminal row.
#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    lines: Vec<Line<'static>>,
    context: DisplayContext,
}

impl Avatar {
    /// Render an image with upper-half blocks, two pixels per cell.
    pub fn from_image(image: &DynamicImage, context: DisplayContext) -> Self {
        let width = u32::from(context.cols.max(1));
        let height = u32::from(context.rows.max(1)) * 2;
        let pixels = image
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgba8();

        let lines = (0..height / 2)
            .map(|row| {
                let spans: Vec<Span<'static>> = (0..width)
                    .map(|x| {
                        let top = pixel_color(pixels.get_pixel(x, row * 2).0);
                        let bottom = pixel_color(pixels.get_pixel(x, row * 2 + 1).0);
                        Span::styled(UPPER_HALF_BLOCK, Style::default().fg(top).bg(bottom))
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();

        Self { lines, context }
    }

    /// Flat block with a centered glyph, used while loading and on failure.
    pub fn solid(context: DisplayContext, color: Color, glyph: char) -> Self {
        let cols = usize::from(context.cols.max(1));
        let rows = usize::from(context.rows.max(1));
        let style = Style::default().bg(color).fg(Color::White);

        let lines = (0..rows)
            .map(|row| {
                let mut text = " ".repeat(cols);
                if row == rows / 2 {
                    let mid = cols / 2;
                    text.replace_range(mid..mid + 1, &glyph.to_string());
                }
                Line::from(Span::styled(text, style))
            })
            .collect();

        Self { lines, context }
    }

    pub fn placeholder(context: DisplayContext) -> Self {
        Self::solid(context, Color::DarkGray, ' ')
    }

    pub fn broken(context: DisplayContext) -> Self {
        Self::solid(context, Color::DarkGray, '?')
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Prefix `text` with the avatar, row by row.
    ///
    /// Text rows below the avatar are indented to stay aligned.
    pub fn inline<'a>(&self, text: Vec<Line<'a>>) -> Vec<Line<'a>> {
        let blank = " ".repeat(usize::from(self.context.cols.max(1)));
        let rows = self.lines.len().max(text.len());
        let mut text = text.into_iter();

        (0..rows)
            .map(|row| {
                let mut spans: Vec<Span<'a>> = match self.lines.get(row) {
                    Some(line) => line.spans.clone(),
                    None => vec![Span::raw(blank.clone())],
                };
                if let Some(line) = text.next() {
                    spans.push(Span::raw(" "));
                    spans.extend(line.spans);
                }
                Line::from(spans)
            })
            .collect()
    }
}

fn pixel_color([r, g, b, a]: [u8; 4]) -> Color {
    if a < 128 {
        Color::Reset
    } else {
        Color::Rgb(r, g, b)
    }
}

// ---------------------------------------------------------------------------
// Callback adapter
// ---------------------------------------------------------------------------

/// Receiver for the outcomes of one asynchronous image load.
pub trait ImageTarget {
    fn on_load_started(&mut self, placeholder: Option<Avatar>);
    fn on_load_failed(&mut self, error: Option<Avatar>);
    /// The load is being released, not replaced.
    fn on_load_cleared(&mut self, placeholder: Option<Avatar>);
    fn on_resource_ready(&mut self, image: DynamicImage);
}

/// Single-use target that reports whichever avatar is currently appropriate.
///
/// The callback may run on a background task; the receiver is responsible
/// for getting the avatar back to wherever it is drawn.
pub struct AvatarTarget<F> {
    context: DisplayContext,
    callback: F,
}

impl<F: FnMut(Avatar)> AvatarTarget<F> {
    pub fn new(context: DisplayContext, callback: F) -> Self {
        Self { context, callback }
    }
}

impl<F: FnMut(Avatar)> ImageTarget for AvatarTarget<F> {
    fn on_load_started(&mut self, placeholder: Option<Avatar>) {
        if let Some(avatar) = placeholder {
            (self.callback)(avatar);
        }
    }

    fn on_load_failed(&mut self, error: Option<Avatar>) {
        if let Some(avatar) = error {
            (self.callback)(avatar);
        }
    }

    fn on_load_cleared(&mut self, _placeholder: Option<Avatar>) {}

    fn on_resource_ready(&mut self, image: DynamicImage) {
        (self.callback)(Avatar::from_image(&image, self.context));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_square(size: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255])))
    }

    type Seen = Rc<RefCell<Vec<Avatar>>>;

    fn collecting(context: DisplayContext) -> (AvatarTarget<impl FnMut(Avatar)>, Seen) {
        let seen: Seen = Rc::default();
        let sink = Rc::clone(&seen);
        let target = AvatarTarget::new(context, move |avatar| sink.borrow_mut().push(avatar));
        (target, seen)
    }

    #[test]
    fn missing_placeholder_is_not_reported() {
        let (mut target, seen) = collecting(DisplayContext::square(2));
        target.on_load_started(None);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn placeholder_is_reported_as_is() {
        let ctx = DisplayContext::square(2);
        let (mut target, seen) = collecting(ctx);
        let placeholder = Avatar::solid(ctx, Color::Blue, 'x');
        target.on_load_started(Some(placeholder.clone()));
        assert_eq!(*seen.borrow(), vec![placeholder]);
    }

    #[test]
    fn failure_reports_error_image_only_when_present() {
        let ctx = DisplayContext::square(2);
        let (mut target, seen) = collecting(ctx);
        target.on_load_failed(None);
        assert!(seen.borrow().is_empty());
        target.on_load_failed(Some(Avatar::broken(ctx)));
        assert_eq!(*seen.borrow(), vec![Avatar::broken(ctx)]);
    }

    #[test]
    fn clearing_never_reports() {
        let ctx = DisplayContext::square(2);
        let (mut target, seen) = collecting(ctx);
        target.on_load_cleared(Some(Avatar::placeholder(ctx)));
        target.on_load_cleared(None);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn ready_image_is_bound_to_display_context() {
        let ctx = DisplayContext { cols: 3, rows: 2 };
        let (mut target, seen) = collecting(ctx);
        target.on_resource_ready(red_square(16));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        let avatar = &seen[0];
        assert_eq!(avatar.lines().len(), 2);
        for line in avatar.lines() {
            assert_eq!(line.spans.len(), 3);
            for span in &line.spans {
                assert_eq!(span.style.fg, Some(Color::Rgb(255, 0, 0)));
                assert_eq!(span.style.bg, Some(Color::Rgb(255, 0, 0)));
            }
        }
    }

    #[test]
    fn transparent_pixels_use_terminal_background() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let avatar = Avatar::from_image(&image, DisplayContext { cols: 1, rows: 1 });
        assert_eq!(avatar.lines()[0].spans[0].style.fg, Some(Color::Reset));
    }

    #[test]
    fn solid_avatar_centers_glyph() {
        let avatar = Avatar::solid(DisplayContext { cols: 5, rows: 3 }, Color::Gray, '?');
        let middle: String = avatar.lines()[1]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(middle, "  ?  ");
    }

    #[test]
    fn inline_prefixes_each_text_row() {
        let avatar = Avatar::placeholder(DisplayContext { cols: 2, rows: 1 });
        let lines = avatar.inline(vec![Line::from("Foo"), Line::from("@foo")]);
        assert_eq!(lines.len(), 2);

        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        let second: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, "   Foo");
        assert_eq!(second, "   @foo");
    }

    #[test]
    fn zero_size_avatar_keeps_text_aligned() {
        let avatar = Avatar::placeholder(DisplayContext { cols: 0, rows: 0 });
        let lines = avatar.inline(vec![Line::from("Foo"), Line::from("@foo")]);
        assert_eq!(lines.len(), 2);

        // The avatar renders one cell wide, so padding must be one cell too.
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        let second: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, "  Foo");
        assert_eq!(second, "  @foo");
    }
}
