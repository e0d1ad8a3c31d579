use std::sync::Arc;
use iced::{Alignment, Application, Command, Element, Length, Settings, Size, Subscription, window};
use iced::event::{self, Event};
use iced::theme::{self, Theme};
use iced::widget::{Column, button, column, container, horizontal_rule, row, scrollable, text};
use iced::window::icon;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use crate::config::io::ConfigIO;
use crate::config::types::Config;
use crate::device::btle::BtleBluetooth;
use crate::device::types::Device;
use crate::device::watch::disconnections_subscription;
use crate::error::AppRunError;
use crate::gui::types::Message;
use crate::permission::btle::BtlePermissions;
use crate::permission::types::PermissionService;
use crate::screen::controller::ConnectionController;
use crate::screen::state::{ConnectionState, ScreenState};

pub struct ApplicationFlags {
    config_io: ConfigIO,
}

pub struct ConnectionScreen {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    // messages that the user must click away, shown before the alerts of the controller
    notices: Vec<String>,

    config_io: ConfigIO,
    permissions: Arc<dyn PermissionService>,

    // None until the config has been loaded
    controller: Option<ConnectionController>,
}

impl ConnectionScreen {
    fn before_close(&mut self) {
        self.app_cancel.cancel();
    }

    fn load_config(&self) -> Command<Message> {
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.read_or_init().await {
                Ok(config) => (config, None),
                Err(err) if err.is_file_not_found_error() => {
                    // this is probably the first start of the app
                    info!("Config file not found, using defaults");
                    (Config::default(), None)
                },
                Err(err) => {
                    error!("Failed to load config: {:?}", &err);
                    (Config::default(), Some(format!("Failed to load config: {}", &err)))
                },
            }
        };

        Command::perform(fut, Message::ConfigLoadComplete)
    }

    fn mount(&mut self, config: Config) -> Command<Message> {
        info!("Scanning for {:?}, permission model {:?}", config.scan_duration(), config.platform());

        let controller = ConnectionController::new(
            Arc::new(BtleBluetooth::new(config.scan_duration())),
            self.permissions.clone(),
            config.platform(),
        );
        let check = controller.start_adapter_check();
        self.controller = Some(controller);

        Command::perform(check, Message::AdapterCheckComplete)
    }
}

fn status_text(state: &ScreenState) -> String {
    let adapter = if state.is_adapter_enabled() { "Bluetooth is on" } else { "Bluetooth is off" };

    let connection = match state.connection() {
        ConnectionState::Disconnected => "Not connected".to_string(),
        ConnectionState::Connecting(device) => format!("Connecting to {}…", device.display_name()),
        ConnectionState::Connected(device) => format!("Connected to {}", device.display_name()),
        ConnectionState::Disconnecting(device) => format!("Disconnecting from {}…", device.display_name()),
    };

    format!("{} · {}", adapter, connection)
}

fn device_row<'a>(device: &'a Device, state: &ScreenState) -> Element<'a, Message> {
    let is_connected = state.connected_device() == Some(device);

    let mut connect_button = button(text(if is_connected { "Connected" } else { "Connect" }))
        .style(if is_connected { theme::Button::Positive } else { theme::Button::Primary });

    if state.can_connect() {
        connect_button = connect_button.on_press(Message::ConnectPress(device.clone()));
    }

    row![
        column![
            text(device.display_name()),
            text(&device.address).size(12),
        ].width(Length::Fill),

        connect_button,
    ]
    .align_items(Alignment::Center)
    .spacing(20)
    .into()
}

impl Application for ConnectionScreen {
    type Executor = iced::executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (ConnectionScreen, Command<Self::Message>) {
        let app = ConnectionScreen {
            app_cancel: CancellationToken::new(),
            notices: Vec::new(),
            config_io: flags.config_io,
            permissions: Arc::new(BtlePermissions),
            controller: None,
        };

        let command = app.load_config();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("E-Cleaning Connect ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::ConfigLoadComplete((config, error_message)) => {
                info!("Config load complete");
                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }
                return self.mount(config);
            },
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                } else if let Some(controller) = &mut self.controller {
                    controller.dismiss_alert();
                }
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                self.before_close();
                return window::close(id);
            },
            _ => {},
        }

        let Some(controller) = &mut self.controller else {
            return Command::none();
        };

        match message {
            Message::AdapterCheckComplete(enabled) => {
                controller.finish_adapter_check(enabled);
            },
            Message::DiscoverPress => {
                if let Some(discovery) = controller.start_discovery() {
                    return Command::perform(discovery, Message::DiscoverComplete);
                }
            },
            Message::DiscoverComplete(result) => {
                if let Some(check) = controller.finish_discovery(result) {
                    return Command::perform(check, Message::AdapterCheckComplete);
                }
            },
            Message::ConnectPress(device) => {
                if let Some(connect) = controller.start_connect(device) {
                    return Command::perform(connect, Message::ConnectComplete);
                }
            },
            Message::ConnectComplete(result) => {
                controller.finish_connect(result);
            },
            Message::DisconnectPress => {
                if let Some(disconnect) = controller.start_disconnect() {
                    return Command::perform(disconnect, Message::DisconnectComplete);
                }
            },
            Message::DisconnectComplete(result) => {
                controller.finish_disconnect(result);
            },
            Message::DeviceLost(address) => {
                controller.device_lost(&address);
            },
            _ => {},
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen().map(Message::EventOccurred)];

        if let Some(controller) = &self.controller {
            subscriptions.push(
                disconnections_subscription(self.app_cancel.clone(), controller.bluetooth())
                    .map(Message::DeviceLost)
            );
        }

        Subscription::batch(subscriptions)
    }

    fn view(&self) -> Element<Message> {
        let Some(controller) = &self.controller else {
            return container(text("Loading…"))
                .width(Length::Fill)
                .padding(20)
                .into();
        };
        let state = controller.state();

        let notice = self.notices.first().map(String::as_str).or(state.current_alert());
        if let Some(notice) = notice {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let mut discover_button = button(text(if state.is_scanning() { "Searching…" } else { "Search for devices" }));
        if state.can_discover() {
            discover_button = discover_button.on_press(Message::DiscoverPress);
        }

        let mut disconnect_button = button(text("Disconnect"))
            .style(theme::Button::Destructive);
        if state.connected_device().is_some() && !state.is_loading() {
            disconnect_button = disconnect_button.on_press(Message::DisconnectPress);
        }

        let device_list: Element<Message> = if state.devices().is_empty() {
            text(if state.is_scanning() { "" } else { "No devices found" }).into()
        } else {
            scrollable(
                Column::with_children(
                    state.devices()
                        .iter()
                        .map(|device| device_row(device, state))
                )
                    .spacing(15)
                    .padding([0, 15, 0, 0]),
            ).into()
        };

        container(
            column![
                text("E-Cleaning device").size(24),
                text(status_text(state)),

                row![discover_button, disconnect_button].spacing(20),

                horizontal_rule(10),

                device_list,
            ]
                .spacing(20)
                .width(Length::Fill)
                .align_items(Alignment::Center)
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .padding(20)
        .into()
    }
}

fn make_icon() -> Option<icon::Icon> {
    let bytes = include_bytes!(concat!(env!("OUT_DIR"), "/icon-32-rgba"));
    match icon::from_rgba(bytes.to_vec(), 32, 32) {
        Ok(icon) => Some(icon),
        Err(err) => {
            error!("Failed to load window icon: {:?}", err);
            None
        },
    }
}

pub fn run_application() -> Result<(), AppRunError> {
    let config_io = ConfigIO::new_sync()?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let flags = ApplicationFlags { config_io };
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("ecleaning-connect".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(480.0, 640.0);
    settings.window.icon = make_icon();

    // this function will call process::exit() unless there was a startup error
    ConnectionScreen::run(settings)?;
    Ok(())
}
