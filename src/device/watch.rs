use std::convert::Infallible;
use std::sync::Arc;
use futures::{future, SinkExt, StreamExt};
use futures::channel::mpsc::Sender;
use iced::subscription::{self, Subscription};
use log::{info, warn};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::device::constants::WATCH_RETRY_DELAY;
use crate::device::types::BluetoothAdapter;

async fn watch_disconnections(
    cancel: CancellationToken,
    bluetooth: Arc<dyn BluetoothAdapter>,
    mut sender: Sender<String>,
) -> Infallible {
    // note: subscription::channel expects the future to never resolve (Infallible)
    // so after `cancel` is cancelled this future stays pending instead of returning.
    while !cancel.is_cancelled() {
        match bluetooth.disconnections().await {
            Ok(mut disconnections) => loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    address = disconnections.next() => match address {
                        Some(address) => {
                            info!("Device {} disconnected", address);
                            if let Err(err) = sender.send(address).await {
                                warn!("Failed to report disconnection: {:?}", err);
                                cancel.cancel();
                            }
                        },
                        None => {
                            warn!("Bluetooth event stream ended");
                            break;
                        },
                    },
                }
            },
            Err(err) => warn!("Failed to watch for disconnections: {:?}", err),
        }

        if !cancel.is_cancelled() {
            sleep(Duration::from_millis(WATCH_RETRY_DELAY)).await;
        }
    }

    future::pending().await
}

/// Emits the address of every device that drops its connection.
pub fn disconnections_subscription(cancel: CancellationToken, bluetooth: Arc<dyn BluetoothAdapter>) -> Subscription<String> {
    struct Disconnections;

    subscription::channel(
        std::any::TypeId::of::<Disconnections>(),
        16,
        move |sender| watch_disconnections(cancel, bluetooth, sender),
    )
}
