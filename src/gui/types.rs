use iced::Event;

use crate::config::types::Config;
use crate::device::types::Device;
use crate::error::ScreenError;

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    ConfigLoadComplete((Config, Option<String>)), // the error message, if loading failed
    AdapterCheckComplete(bool),
    DiscoverPress,
    DiscoverComplete(Result<Vec<Device>, ScreenError>),
    ConnectPress(Device),
    ConnectComplete(Result<(), ScreenError>),
    DisconnectPress,
    DisconnectComplete(Result<(), ScreenError>),
    DeviceLost(String), // address
    NoticeConfirmed,
}
