use cosmic::iced::{Color, Length, Size};
use cosmic::iced_core::event;
use cosmic::iced_futures::{Subscription, event::listen_with};
use std::time::Duration;

use cosmic::iced::Alignment;
use cosmic::iced_widget::{column, container, row, scrollable, text_editor, toggler};
use cosmic::widget::{button, horizontal_space, image, text};
use cosmic::{Element, Task, app};

use crate::capture::image::GaugeImage;
use crate::config::CalibrationConfig;
use crate::error::{CalibrationError, Result};
use crate::service::{HttpReadingClient, ReadingService};
use crate::session::messages::{CalibrateMsg, ImageMsg, Msg, ServiceMsg};
use crate::session::{ArmPolicy, Status, Workspace};
use crate::settings::AppSettings;
use crate::widget::ClickCapture;
use crate::widget::toolbar::action_bar;

const SIDE_PANEL_WIDTH: f32 = 440.0;
const THUMBNAIL_SIZE: f32 = 96.0;

pub fn run() -> cosmic::iced::Result {
    let settings = cosmic::app::Settings::default().size(Size::new(1400.0, 900.0));
    cosmic::app::run::<App>(settings, ())
}

pub struct App {
    core: app::Core,
    settings: AppSettings,
    client: HttpReadingClient,
    workspace: Workspace,
    editor: text_editor::Content,
    /// Decoded handles, rebuilt only when the workspace changes them
    image_handle: Option<image::Handle>,
    overlay_handle: Option<image::Handle>,
    threshold_handle: Option<image::Handle>,
    history_handles: Vec<image::Handle>,
    /// A service request is running
    busy: bool,
}

/// Run a blocking job on tokio's blocking pool
fn background<T: Send + 'static>(
    job: impl FnOnce() -> Result<T> + Send + 'static,
    to_msg: impl Fn(Result<T>) -> Msg + Send + 'static,
) -> Task<Msg> {
    cosmic::Task::perform(
        async move {
            tokio::task::spawn_blocking(job)
                .await
                .unwrap_or_else(|err| Err(CalibrationError::unavailable("background task", err)))
        },
        to_msg,
    )
}

fn handle_for(image: &GaugeImage) -> image::Handle {
    image::Handle::from_bytes(image.bytes().to_vec())
}

impl App {
    fn sync_editor(&mut self) {
        self.editor = text_editor::Content::with_text(self.workspace.config_text());
    }

    fn sync_image(&mut self) {
        self.image_handle = self.workspace.image().map(handle_for);
    }

    fn sync_reading(&mut self) {
        let reading = self.workspace.reading();
        self.overlay_handle = reading
            .and_then(|r| r.overlay.clone())
            .map(image::Handle::from_bytes);
        self.threshold_handle = reading.map(|r| image::Handle::from_bytes(r.threshold.clone()));
    }

    fn fetch_history(&self) -> Task<Msg> {
        let client = self.client.clone();
        background(
            move || client.last_images(),
            |result| Msg::Image(ImageMsg::HistoryLoaded(result)),
        )
    }

    fn update_calibrate(&mut self, msg: CalibrateMsg) -> Task<Msg> {
        match msg {
            CalibrateMsg::Toggle(action) => {
                let _ = self.workspace.toggle(action);
            }
            CalibrateMsg::DisarmAll => self.workspace.disarm_all(),
            CalibrateMsg::Click(pos) => {
                if !self.workspace.pointer_click(pos).is_empty() {
                    self.sync_editor();
                }
            }
            CalibrateMsg::SetExclusive(exclusive) => {
                let policy = if exclusive {
                    ArmPolicy::Exclusive
                } else {
                    ArmPolicy::Concurrent
                };
                self.workspace.set_policy(policy);
                self.settings.set_arm_policy(policy);
                self.settings.save();
            }
        }
        Task::none()
    }

    fn update_image(&mut self, msg: ImageMsg) -> Task<Msg> {
        match msg {
            ImageMsg::OpenDialog => {
                return cosmic::Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Open gauge image")
                            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "webp"])
                            .pick_file()
                            .await
                            .map(|handle| handle.path().to_path_buf())
                    },
                    |path| Msg::Image(ImageMsg::Picked(path)),
                );
            }
            ImageMsg::Picked(None) => {}
            ImageMsg::Picked(Some(path)) => {
                return background(
                    move || GaugeImage::from_path(path),
                    |result| Msg::Image(ImageMsg::Loaded(result)),
                );
            }
            ImageMsg::Loaded(result) => {
                if self.workspace.apply_loaded_image(result).is_ok() {
                    self.sync_image();
                    self.sync_reading();
                }
            }
            ImageMsg::SelectHistory(index) => {
                if self.workspace.select_history_entry(index).is_ok() {
                    self.sync_image();
                    self.sync_reading();
                }
            }
            ImageMsg::HistoryLoaded(result) => {
                if self.workspace.set_history(result).is_ok() {
                    self.history_handles = self
                        .workspace
                        .history()
                        .entries()
                        .iter()
                        .map(handle_for)
                        .collect();
                }
            }
        }
        Task::none()
    }

    fn update_service(&mut self, msg: ServiceMsg) -> Task<Msg> {
        match msg {
            ServiceMsg::Execute | ServiceMsg::QuickReading if self.busy => {
                log::debug!("Request already running, ignoring submit");
            }
            ServiceMsg::Execute => {
                let Ok(submission) = self.workspace.prepare_submission() else {
                    return Task::none();
                };
                self.busy = true;
                let client = self.client.clone();
                let generation = submission.generation;
                return background(
                    move || client.debug_reading(&submission.image, &submission.config),
                    move |result| Msg::Service(ServiceMsg::DebugReadingDone(generation, result)),
                );
            }
            ServiceMsg::QuickReading => {
                let Ok(submission) = self.workspace.prepare_submission() else {
                    return Task::none();
                };
                self.busy = true;
                let client = self.client.clone();
                let generation = submission.generation;
                return background(
                    move || client.gauge_value(&submission.image, &submission.config),
                    move |result| Msg::Service(ServiceMsg::ValueDone(generation, result)),
                );
            }
            ServiceMsg::DebugReadingDone(generation, result) => {
                self.busy = false;
                if self.workspace.apply_debug_reading(generation, result).is_ok() {
                    self.sync_reading();
                }
            }
            ServiceMsg::ValueDone(generation, result) => {
                self.busy = false;
                let _ = self.workspace.apply_quick_value(generation, result);
            }
        }
        Task::none()
    }

    fn update_msg(&mut self, message: Msg) -> Task<Msg> {
        match message {
            Msg::Calibrate(msg) => self.update_calibrate(msg),
            Msg::Image(msg) => self.update_image(msg),
            Msg::Service(msg) => self.update_service(msg),
            Msg::ConfigEdit(action) => {
                let is_edit = action.is_edit();
                self.editor.perform(action);
                if is_edit {
                    let _ = self.workspace.edit_config_text(self.editor.text());
                }
                Task::none()
            }
            Msg::ResetConfig => {
                self.workspace.reset_config(CalibrationConfig::default());
                self.sync_editor();
                Task::none()
            }
            Msg::Keyboard(
                cosmic::iced::keyboard::Event::KeyPressed { key, modifiers, .. },
                captured,
            ) => match crate::session::shortcuts::handle_key_event(key, modifiers, captured) {
                Some(msg) => self.update_msg(msg),
                None => Task::none(),
            },
            Msg::Keyboard(..) => Task::none(),
        }
    }

    fn image_view(&self) -> Element<'_, Msg> {
        let (Some(handle), Some(gauge)) = (&self.image_handle, self.workspace.image()) else {
            return container(text("Open an image or pick one from the history below"))
                .center(Length::Fill)
                .into();
        };

        // Native size so a click offset is a pixel offset
        let picture = image(handle.clone())
            .width(Length::Fixed(gauge.width() as f32))
            .height(Length::Fixed(gauge.height() as f32))
            .content_fit(cosmic::iced::ContentFit::None);

        let armed = self.workspace.has_armed();
        let capture = ClickCapture::new(picture).on_click_maybe(armed.then_some(Msg::click));

        scrollable(capture)
            .direction(scrollable::Direction::Both {
                vertical: scrollable::Scrollbar::default(),
                horizontal: scrollable::Scrollbar::default(),
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn side_panel(&self) -> Element<'_, Msg> {
        let spacing = self.core.system_theme().cosmic().spacing;

        let editor = text_editor(&self.editor)
            .on_action(Msg::ConfigEdit)
            .height(Length::Fixed(320.0));

        let value = match (self.workspace.reading(), self.workspace.quick_value()) {
            (Some(reading), _) => format!("Value: {}", reading.value_text()),
            (None, Some(value)) => format!("Value: {value:.2}"),
            (None, None) => "Value: –".to_string(),
        };

        let exclusive_row = row![
            text::body("One action at a time"),
            horizontal_space(),
            toggler(self.workspace.policy() == ArmPolicy::Exclusive)
                .on_toggle(Msg::set_exclusive)
                .size(24.0),
        ]
        .spacing(spacing.space_s)
        .align_y(Alignment::Center)
        .width(Length::Fill);

        // what the service will use, fallbacks included
        let mut tuning = column![text::heading("Service parameters")].spacing(spacing.space_xxs);
        for (key, value) in self.workspace.document().last_valid().effective_tuning() {
            tuning = tuning.push(row![
                text::caption(key).width(Length::Fill),
                text::caption(value),
            ]);
        }

        let mut panel = column![
            row![
                text::heading("Configuration").width(Length::Fill),
                button::text("Reset").on_press(Msg::ResetConfig),
            ]
            .spacing(spacing.space_xs),
            editor,
            exclusive_row,
            text::title4(value),
            tuning,
        ]
        .spacing(spacing.space_s)
        .width(Length::Fixed(SIDE_PANEL_WIDTH));

        if let Some(handle) = &self.overlay_handle {
            panel = panel.push(text::heading("Debug")).push(image(handle.clone()));
        }
        if let Some(handle) = &self.threshold_handle {
            panel = panel
                .push(text::heading("Threshold"))
                .push(image(handle.clone()));
        }

        scrollable(panel).height(Length::Fill).into()
    }

    fn history_view(&self) -> Element<'_, Msg> {
        let spacing = self.core.system_theme().cosmic().spacing;
        let mut gallery = row![].spacing(spacing.space_xs);

        for (index, (handle, entry)) in self
            .history_handles
            .iter()
            .zip(self.workspace.history().entries())
            .enumerate()
        {
            let caption = entry
                .value
                .map(|value| format!("{value:.2}"))
                .unwrap_or_default();
            let thumbnail = column![
                image(handle.clone())
                    .width(Length::Fixed(THUMBNAIL_SIZE))
                    .height(Length::Fixed(THUMBNAIL_SIZE)),
                text::caption(caption),
            ];
            gallery = gallery.push(
                button::custom(thumbnail)
                    .class(cosmic::theme::Button::Image)
                    .on_press(Msg::select_history(index)),
            );
        }

        scrollable(gallery)
            .direction(scrollable::Direction::Horizontal(
                scrollable::Scrollbar::default(),
            ))
            .into()
    }

    fn status_view(&self) -> Element<'_, Msg> {
        let status = self.workspace.status();
        let line = text::body(status.text().to_string());
        match status {
            Status::Error(_) => line
                .class(cosmic::theme::Text::Color(Color::from_rgb(0.85, 0.2, 0.2)))
                .into(),
            _ => line.into(),
        }
    }
}

impl cosmic::Application for App {
    type Executor = cosmic::executor::Default;

    type Flags = ();

    type Message = Msg;

    const APP_ID: &'static str = "io.github.gaugecal";

    fn core(&self) -> &app::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut app::Core {
        &mut self.core
    }

    fn init(
        core: app::Core,
        _flags: Self::Flags,
    ) -> (Self, cosmic::iced::Task<cosmic::Action<Self::Message>>) {
        let settings = AppSettings::load();
        let service_url = settings.effective_service_url();
        log::info!("Using reading service at {service_url}");

        let workspace = Workspace::new(CalibrationConfig::default(), settings.arm_policy());
        let app = Self {
            core,
            client: HttpReadingClient::new(
                service_url,
                Duration::from_secs(settings.request_timeout_secs),
            ),
            editor: text_editor::Content::with_text(workspace.config_text()),
            workspace,
            image_handle: None,
            overlay_handle: None,
            threshold_handle: None,
            history_handles: Vec::new(),
            busy: false,
            settings,
        };

        let task = if app.settings.history_on_startup {
            app.fetch_history().map(cosmic::Action::App)
        } else {
            Task::none()
        };
        (app, task)
    }

    fn view(&self) -> Element<'_, Self::Message> {
        let spacing = self.core.system_theme().cosmic().spacing;
        let toolbar = action_bar(
            |action| self.workspace.is_armed(action),
            self.workspace.image().is_some(),
            self.busy,
            spacing,
        );

        let mut content = column![
            toolbar,
            row![self.image_view(), self.side_panel()].spacing(spacing.space_m),
        ]
        .spacing(spacing.space_s)
        .padding(spacing.space_s);

        if !self.history_handles.is_empty() {
            content = content.push(self.history_view());
        }
        content.push(self.status_view()).into()
    }

    fn update(
        &mut self,
        message: Self::Message,
    ) -> cosmic::iced::Task<cosmic::Action<Self::Message>> {
        self.update_msg(message).map(cosmic::Action::App)
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        listen_with(|e, status, _| match e {
            cosmic::iced_core::Event::Keyboard(keyboard_event) => Some(Msg::Keyboard(
                keyboard_event,
                status == event::Status::Captured,
            )),
            _ => None,
        })
    }
}
