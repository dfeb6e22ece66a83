//! Firmware runtime: the API server and the poll loop running side by side.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use homestation_access::KeypadAccessController;
use homestation_api::{ApiServer, Router};
use homestation_core::StationConfig;
use homestation_device::SharedDeviceStore;
use homestation_hardware::VirtualLcd;
use homestation_hardware::mock::{MockKeypad, MockKeypadHandle};

use crate::simulation::{SimulatedBoard, SimulationHandles};
use crate::station::{AccessPanel, Station};

/// Station running on simulated hardware.
pub type SimulatedStation = Station<MockKeypad, VirtualLcd>;

/// A started station.
pub struct Runtime {
    local_addr: SocketAddr,
    store: SharedDeviceStore,
    handles: SimulationHandles,
    shutdown: watch::Sender<bool>,
    server: JoinHandle<()>,
    station: JoinHandle<SimulatedStation>,
}

impl Runtime {
    /// Assemble the board for `config.variant`, bring the devices to their
    /// startup state and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the devices fail to initialize or the listener
    /// cannot be bound.
    pub async fn start(config: &StationConfig) -> anyhow::Result<Self> {
        let SimulatedBoard {
            mut store,
            keypad,
            lcd,
            handles,
        } = SimulatedBoard::new(config.variant).context("assembling board")?;

        let initial = store.initialize().context("initializing devices")?;
        info!(
            temperature = initial.temperature,
            humidity = initial.humidity,
            "Devices initialized"
        );
        let store = store.into_shared();

        let mut router = Router::new(store.clone(), config.variant);
        if config.variant.serves_static() {
            match &config.http.static_dir {
                Some(dir) => router = router.with_static_dir(dir),
                None => warn!("No static_dir configured, dashboard files will not be served"),
            }
        }

        let server = ApiServer::bind(&config.http, router)
            .await
            .context("starting HTTP server")?;
        let local_addr = server.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let server_shutdown = shutdown_rx.clone();
        let server = tokio::spawn(async move {
            if let Err(e) = server.run(server_shutdown).await {
                warn!(error = %e, "HTTP server failed");
            }
        });

        let mut station = Station::new(store.clone(), config.tick())
            .with_sensor_log_interval(config.sensor_log_interval());
        if let (Some(keypad), Some(lcd)) = (keypad, lcd) {
            let controller = KeypadAccessController::from_config(&config.access, lcd);
            station = station.with_panel(AccessPanel::new(keypad, controller));
        }
        let station = tokio::spawn(station.run(shutdown_rx));

        info!(
            hostname = %config.hostname,
            variant = %config.variant,
            addr = %local_addr,
            "Station running"
        );

        Ok(Self {
            local_addr,
            store,
            handles,
            shutdown: shutdown_tx,
            server,
            station,
        })
    }

    /// Address the API server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn store(&self) -> &SharedDeviceStore {
        &self.store
    }

    /// Handles for driving the simulated devices.
    pub fn sensors(&self) -> &SimulationHandles {
        &self.handles
    }

    /// Keypad handle, for variants that have one.
    pub fn keypad(&self) -> Option<MockKeypadHandle> {
        self.handles.keypad.clone()
    }

    /// A receiver that observes this runtime's shutdown signal.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Stop both tasks and hand back the stopped station.
    ///
    /// # Errors
    ///
    /// Returns an error if either task panicked.
    pub async fn shutdown(self) -> anyhow::Result<SimulatedStation> {
        let _ = self.shutdown.send(true);
        self.server.await.context("HTTP server task")?;
        let station = self.station.await.context("poll loop task")?;
        info!(ticks = station.ticks(), "Station stopped");
        Ok(station)
    }
}
