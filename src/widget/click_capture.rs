//! Wrapper widget reporting left clicks in content-local coordinates
//!
//! The gauge image is drawn at its native size, so a position relative to
//! the wrapper's bounds is a position in image pixels.

use cosmic::Element;
use cosmic::iced_core::{Layout, Length, Rectangle, Size, layout, mouse, widget::Tree};

pub struct ClickCapture<'a, Msg> {
    content: Element<'a, Msg>,
    on_click: Option<Box<dyn Fn(f32, f32) -> Msg + 'a>>,
}

impl<'a, Msg: Clone + 'static> ClickCapture<'a, Msg> {
    pub fn new(content: impl Into<Element<'a, Msg>>) -> Self {
        Self {
            content: content.into(),
            on_click: None,
        }
    }

    /// Clicks are only captured while a handler is set
    pub fn on_click(mut self, on_click: impl Fn(f32, f32) -> Msg + 'a) -> Self {
        self.on_click = Some(Box::new(on_click));
        self
    }

    pub fn on_click_maybe(self, on_click: Option<impl Fn(f32, f32) -> Msg + 'a>) -> Self {
        match on_click {
            Some(on_click) => self.on_click(on_click),
            None => self,
        }
    }
}

/// Position of `cursor` relative to the top-left of `bounds`, if inside
pub fn local_position(bounds: Rectangle, cursor: mouse::Cursor) -> Option<(f32, f32)> {
    let pos = cursor.position()?;
    bounds
        .contains(pos)
        .then(|| (pos.x - bounds.x, pos.y - bounds.y))
}

impl<'a, Msg: Clone + 'static> cosmic::widget::Widget<Msg, cosmic::Theme, cosmic::Renderer>
    for ClickCapture<'a, Msg>
{
    fn size(&self) -> Size<Length> {
        self.content.as_widget().size()
    }

    fn children(&self) -> Vec<Tree> {
        vec![Tree::new(&self.content)]
    }

    fn diff(&mut self, tree: &mut Tree) {
        tree.diff_children(std::slice::from_mut(&mut self.content));
    }

    fn layout(
        &self,
        tree: &mut Tree,
        renderer: &cosmic::Renderer,
        limits: &cosmic::iced::Limits,
    ) -> layout::Node {
        self.content
            .as_widget()
            .layout(&mut tree.children[0], renderer, limits)
    }

    fn draw(
        &self,
        tree: &Tree,
        renderer: &mut cosmic::Renderer,
        theme: &cosmic::Theme,
        style: &cosmic::iced_core::renderer::Style,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        viewport: &Rectangle,
    ) {
        self.content.as_widget().draw(
            &tree.children[0],
            renderer,
            theme,
            style,
            layout,
            cursor,
            viewport,
        );
    }

    fn on_event(
        &mut self,
        tree: &mut Tree,
        event: cosmic::iced_core::Event,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        renderer: &cosmic::Renderer,
        clipboard: &mut dyn cosmic::iced_core::Clipboard,
        shell: &mut cosmic::iced_core::Shell<'_, Msg>,
        viewport: &Rectangle,
    ) -> cosmic::iced_core::event::Status {
        if let cosmic::iced_core::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) =
            &event
            && let Some(on_click) = &self.on_click
            && let Some((x, y)) = local_position(layout.bounds(), cursor)
        {
            shell.publish(on_click(x, y));
            return cosmic::iced_core::event::Status::Captured;
        }

        self.content.as_widget_mut().on_event(
            &mut tree.children[0],
            event,
            layout,
            cursor,
            renderer,
            clipboard,
            shell,
            viewport,
        )
    }

    fn mouse_interaction(
        &self,
        tree: &Tree,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        viewport: &Rectangle,
        renderer: &cosmic::Renderer,
    ) -> mouse::Interaction {
        if self.on_click.is_some() && cursor.is_over(layout.bounds()) {
            return mouse::Interaction::Crosshair;
        }
        self.content.as_widget().mouse_interaction(
            &tree.children[0],
            layout,
            cursor,
            viewport,
            renderer,
        )
    }

    fn operate(
        &self,
        tree: &mut Tree,
        layout: Layout<'_>,
        renderer: &cosmic::Renderer,
        operation: &mut dyn cosmic::iced_core::widget::Operation<()>,
    ) {
        self.content
            .as_widget()
            .operate(&mut tree.children[0], layout, renderer, operation);
    }

    fn overlay<'b>(
        &'b mut self,
        tree: &'b mut Tree,
        layout: Layout<'_>,
        renderer: &cosmic::Renderer,
        translation: cosmic::iced::Vector,
    ) -> Option<cosmic::iced_core::overlay::Element<'b, Msg, cosmic::Theme, cosmic::Renderer>> {
        self.content
            .as_widget_mut()
            .overlay(&mut tree.children[0], layout, renderer, translation)
    }
}

impl<'a, Msg: Clone + 'static> From<ClickCapture<'a, Msg>> for Element<'a, Msg> {
    fn from(wrapper: ClickCapture<'a, Msg>) -> Self {
        Element::new(wrapper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmic::iced_core::Point;

    #[test]
    fn test_local_position() {
        let bounds = Rectangle::new(Point::new(10.0, 20.0), Size::new(100.0, 50.0));
        let inside = mouse::Cursor::Available(Point::new(15.5, 70.0));
        assert_eq!(local_position(bounds, inside), Some((5.5, 50.0)));
        let outside = mouse::Cursor::Available(Point::new(5.0, 30.0));
        assert_eq!(local_position(bounds, outside), None);
        assert_eq!(local_position(bounds, mouse::Cursor::Unavailable), None);
    }
}
