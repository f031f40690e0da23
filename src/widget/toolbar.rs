//! Action bar above the gauge image

use cosmic::Element;
use cosmic::cosmic_theme::Spacing;
use cosmic::iced::Length;
use cosmic::iced_widget::row;
use cosmic::widget::{button, horizontal_space, tooltip};

use crate::domain::CalibrationAction;
use crate::session::messages::Msg;

/// Shortcut hint shown in each action's tooltip
fn shortcut_hint(action: CalibrationAction) -> String {
    let position = CalibrationAction::ALL
        .iter()
        .position(|a| *a == action)
        .unwrap_or_default();
    format!("{} ({})", action.label(), position + 1)
}

/// One button per calibration action, highlighted while armed
///
/// Buttons are disabled until an image is loaded.
pub fn action_bar<'a>(
    is_armed: impl Fn(CalibrationAction) -> bool,
    has_image: bool,
    busy: bool,
    spacing: Spacing,
) -> Element<'a, Msg> {
    let mut bar = row![].spacing(spacing.space_xs);

    for action in CalibrationAction::ALL {
        let armed = is_armed(action);
        let btn = button::text(action.label())
            .class(if armed {
                cosmic::theme::Button::Suggested
            } else {
                cosmic::theme::Button::Standard
            })
            .on_press_maybe(has_image.then(|| Msg::toggle(action)));
        bar = bar.push(tooltip(
            btn,
            cosmic::widget::text(shortcut_hint(action)),
            tooltip::Position::Bottom,
        ));
    }

    let btn_open = tooltip(
        button::text("Open image…")
            .class(cosmic::theme::Button::Standard)
            .on_press(Msg::open_dialog()),
        cosmic::widget::text("Open image (Ctrl+O)"),
        tooltip::Position::Bottom,
    );

    let can_submit = has_image && !busy;
    let btn_quick = tooltip(
        button::text("Value only")
            .class(cosmic::theme::Button::Standard)
            .on_press_maybe(can_submit.then(Msg::quick_reading)),
        cosmic::widget::text("Read value without debug images (Ctrl+Shift+Enter)"),
        tooltip::Position::Bottom,
    );
    let btn_execute = tooltip(
        button::text(if busy { "Reading…" } else { "Execute" })
            .class(cosmic::theme::Button::Suggested)
            .on_press_maybe(can_submit.then(Msg::execute)),
        cosmic::widget::text("Submit for a debug reading (Ctrl+Enter)"),
        tooltip::Position::Bottom,
    );

    bar.push(horizontal_space().width(Length::Fill))
        .push(btn_open)
        .push(btn_quick)
        .push(btn_execute)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_hint_matches_key() {
        assert_eq!(shortcut_hint(CalibrationAction::CropStart), "Select crop start (1)");
        assert_eq!(shortcut_hint(CalibrationAction::EndAngle), "Select end angle (5)");
    }
}
