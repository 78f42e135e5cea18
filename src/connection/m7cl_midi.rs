use crossbeam_channel as channel;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use super::{
    ChannelControl, ChannelLevelFrame, Confirm, Connection, ConnectionConfig, ConnectionStatus,
    Context, Error, Event, Notification,
};
use crate::{
    m7cl,
    midi::{self, port, Direction, Endpoint},
};

const METER_REQUEST_PERIOD_S: u64 = 10;

/// Yamaha M7CL over MIDI.
///
/// Channels are switched on & off through NRPN control changes.
/// When live metering is enabled and an input device is available,
/// levels are requested every 10s and published as they are received.
pub struct M7clConnection {
    shared: Arc<Shared>,
}

struct Shared {
    config: ConnectionConfig,
    meter_period: Duration,
    evt_tx: channel::Sender<Event>,
    closed: AtomicBool,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    status: ConnectionStatus,
    levels: Option<ChannelLevelFrame>,
    output: Option<Box<dyn midi::OutputPort>>,
    input: Option<Box<dyn midi::InputPort>>,
    listeners: Vec<midi::Listener>,
    metering: Option<Metering>,
}

struct Metering {
    // Dropping the guard cancels the schedule.
    _guard: timer::Guard,
    _timer: timer::Timer,
}

impl M7clConnection {
    pub const NAME: &'static str = "M7CL (MIDI)";

    /// Starts connecting to the mixer using the `config` snapshot.
    ///
    /// The status switches to `Connecting` immediately, access to the MIDI
    /// devices is then negotiated in the background.
    pub fn connect(config: ConnectionConfig, ctx: Context) -> Self {
        Self::with_meter_period(config, ctx, Duration::from_secs(METER_REQUEST_PERIOD_S))
    }

    /// Same as [`connect`](Self::connect), requesting levels every `meter_period`.
    #[doc(hidden)]
    pub fn with_meter_period(
        config: ConnectionConfig,
        ctx: Context,
        meter_period: Duration,
    ) -> Self {
        let Context {
            backend,
            confirm,
            evt_tx,
        } = ctx;

        let shared = Arc::new(Shared {
            config,
            meter_period,
            evt_tx,
            closed: AtomicBool::new(false),
            inner: Mutex::new(Inner::default()),
        });

        if !backend.is_supported() {
            let err = midi::Error::CapabilityUnsupported;
            log::error!("{err}");
            shared.notify(Notification::error("MIDI unsupported", ""));
            shared.set_status(&mut shared.lock(), ConnectionStatus::disconnected());

            return Self { shared };
        }

        shared.set_status(&mut shared.lock(), ConnectionStatus::connecting());

        let shared_cl = shared.clone();
        let res = std::thread::Builder::new()
            .name("m7cl-access".into())
            .spawn(move || {
                let access = backend.request_access();
                Shared::negotiated(&shared_cl, access, confirm);
            });

        if let Err(err) = res {
            log::error!("Couldn't spawn MIDI access negotiation: {err}");
            shared.notify(Notification::error("MIDI access request error", err.to_string()));
            shared.set_status(&mut shared.lock(), ConnectionStatus::disconnected());
        }

        Self { shared }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// Last level frame received from the mixer.
    pub fn levels(&self) -> Option<ChannelLevelFrame> {
        self.shared.lock().levels.clone()
    }

    pub fn is_metering(&self) -> bool {
        self.shared.lock().metering.is_some()
    }
}

impl Connection for M7clConnection {
    fn fire_channel(&self, ctrl: &ChannelControl) -> Result<(), Error> {
        let list = m7cl::nrpn::channel_on(ctrl.channel, ctrl.active).map_err(|err| {
            log::error!("{err}");
            self.shared.notify(Notification::error(
                "Channel out of range",
                ctrl.channel.to_string(),
            ));
            err
        })?;

        if list.is_empty() {
            return Ok(());
        }

        let mut inner = self.shared.lock_open().ok_or(Error::NotConnected)?;
        let output = match inner.output.as_mut() {
            Some(output) => output,
            None => {
                log::warn!("Attempt to fire channel {}, but not connected", ctrl.channel);
                return Err(Error::NotConnected);
            }
        };

        for msg in list.iter() {
            if let Err(err) = output.send(msg) {
                self.shared
                    .notify(Notification::error("Failed to send MIDI message", err.to_string()));
                return Err(err.into());
            }
        }

        log::debug!(
            "Channel {} {}",
            ctrl.channel,
            if ctrl.active == Some(true) { "on" } else { "off" },
        );

        Ok(())
    }

    fn status(&self) -> ConnectionStatus {
        self.shared.lock().status.clone()
    }

    fn close(&self, ungraceful: bool) {
        self.shared.close(ungraceful);
    }
}

impl Drop for M7clConnection {
    fn drop(&mut self) {
        self.shared.close(false);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the inner state unless the connection is closed.
    fn lock_open(&self) -> Option<MutexGuard<'_, Inner>> {
        let inner = self.lock();
        if self.closed.load(Ordering::Acquire) {
            return None;
        }

        Some(inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn publish(&self, event: impl Into<Event>) {
        if self.evt_tx.send(event.into()).is_err() {
            log::trace!("No observer for connection events");
        }
    }

    fn notify(&self, notif: Notification) {
        if !self.is_closed() {
            log::debug!("Notification: {notif}");
            self.publish(notif);
        }
    }

    fn set_status(&self, inner: &mut Inner, status: ConnectionStatus) {
        log::info!("MIDI connection {status}");
        inner.status = status.clone();
        self.publish(status);
    }

    fn negotiated(
        this: &Arc<Self>,
        access: Result<Box<dyn midi::Access>, midi::Error>,
        mut confirm: Confirm,
    ) {
        if this.is_closed() {
            log::debug!("Connection closed during MIDI access negotiation");
            return;
        }

        let access = match access {
            Ok(access) => access,
            Err(err) => {
                log::error!("MIDI access request: {err}");
                this.notify(Notification::error("MIDI access request error", err.to_string()));
                if let Some(mut inner) = this.lock_open() {
                    this.set_status(&mut inner, ConnectionStatus::disconnected());
                }
                return;
            }
        };

        let outputs = access.outputs();
        let output_ep = match port::select(
            &outputs,
            Direction::Out,
            this.config.host.as_deref(),
            &mut confirm,
        ) {
            Ok(endpoint) => endpoint.clone(),
            Err(err) => {
                log::warn!("{err}");
                this.notify(Notification::error("No output device selected", ""));
                if let Some(mut inner) = this.lock_open() {
                    this.set_status(&mut inner, ConnectionStatus::disconnected());
                }
                return;
            }
        };

        let input_ep = if this.config.live_meters_enabled {
            let inputs = access.inputs();
            match port::select(
                &inputs,
                Direction::In,
                this.config.input_host.as_deref(),
                &mut confirm,
            ) {
                Ok(endpoint) => Some(endpoint.clone()),
                Err(err) => {
                    log::warn!("{err}");
                    None
                }
            }
        } else {
            None
        };

        let mut inner = match this.lock_open() {
            Some(inner) => inner,
            None => {
                log::debug!("Connection closed during MIDI device selection");
                return;
            }
        };

        let output = match access.open_output(&output_ep) {
            Ok(output) => output,
            Err(err) => {
                this.notify(Notification::error("MIDI access request error", err.to_string()));
                this.set_status(&mut inner, ConnectionStatus::disconnected());
                return;
            }
        };
        inner.output = Some(output);
        this.listen_disconnect(&mut inner, access.as_ref(), &output_ep);

        if this.config.live_meters_enabled {
            let input = input_ep.and_then(|input_ep| {
                let weak = Arc::downgrade(this);
                let on_msg = Box::new(move |msg: &[u8]| {
                    if let Some(this) = weak.upgrade() {
                        this.handle_msg(msg);
                    }
                });

                match access.open_input(&input_ep, on_msg) {
                    Ok(input) => {
                        this.listen_disconnect(&mut inner, access.as_ref(), &input_ep);
                        Some(input)
                    }
                    Err(err) => {
                        log::warn!("{err}");
                        None
                    }
                }
            });

            if input.is_none() {
                this.notify(Notification::warn(
                    "No input device found for live metering",
                    "",
                ));
            }
            inner.input = input;
        }

        let address = match inner.input {
            Some(ref input) => format!("{}/{}", output_ep.id, input.endpoint().id),
            None => output_ep.id.to_string(),
        };
        this.set_status(&mut inner, ConnectionStatus::connected(address));

        if inner.input.is_some() {
            this.start_metering(&mut inner);
        }
    }

    fn listen_disconnect(
        self: &Arc<Self>,
        inner: &mut Inner,
        access: &dyn midi::Access,
        endpoint: &Endpoint,
    ) {
        // Listeners must not keep the connection alive.
        let weak = Arc::downgrade(self);
        let handler = Box::new(move |endpoint: &Endpoint| {
            if let Some(this) = weak.upgrade() {
                this.handle_disconnect(endpoint);
            }
        });

        match access.on_disconnect(endpoint, handler) {
            Ok(listener) => inner.listeners.push(listener),
            Err(err) => log::warn!("Can't watch MIDI {} {}: {err}", endpoint.direction, endpoint.id),
        }
    }

    fn start_metering(self: &Arc<Self>, inner: &mut Inner) {
        let weak = Arc::downgrade(self);
        let timer = timer::Timer::new();
        let period = chrono::Duration::from_std(self.meter_period)
            .unwrap_or_else(|_| chrono::Duration::seconds(METER_REQUEST_PERIOD_S as i64));
        let guard = timer.schedule_repeating(period, move || {
            if let Some(this) = weak.upgrade() {
                if let Some(mut inner) = this.lock_open() {
                    this.request_metering(&mut inner);
                }
            }
        });

        inner.metering = Some(Metering {
            _guard: guard,
            _timer: timer,
        });
        log::debug!("Live metering started at {}", self.config.live_meter_point);

        self.request_metering(inner);
    }

    fn request_metering(&self, inner: &mut Inner) {
        let msg = m7cl::meter::request(self.config.live_meter_point);
        match inner.output.as_mut() {
            Some(output) => {
                if let Err(err) = output.send(&msg) {
                    log::error!("Metering request {}: {err}", msg.display());
                }
            }
            None => log::warn!("Attempt to request metering, but not connected"),
        }
    }

    fn handle_msg(&self, msg: &[u8]) {
        let frame = match m7cl::meter::decode(msg) {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(err) => {
                log::warn!("Dropping metering frame: {err}");
                return;
            }
        };

        if let Some(mut inner) = self.lock_open() {
            log::trace!("Levels for {} channels", frame.len());
            inner.levels = Some(frame.clone());
            self.publish(Event::Levels(frame));
        }
    }

    fn handle_disconnect(self: &Arc<Self>, endpoint: &Endpoint) {
        let err = Error::HardwareDisconnect(endpoint.direction);
        log::error!("{err}: {}", endpoint.id);
        self.notify(Notification::error(err.to_string(), endpoint.id.as_ref()));

        if endpoint.direction == Direction::Out && self.config.close_on_disconnect {
            self.close(true);
        }
    }

    fn close(&self, ungraceful: bool) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let (output, input, listeners, metering) = {
            let mut inner = self.lock();
            self.set_status(&mut inner, ConnectionStatus::disconnected());
            inner.levels = None;

            (
                inner.output.take(),
                inner.input.take(),
                std::mem::take(&mut inner.listeners),
                inner.metering.take(),
            )
        };

        // Ports are closed without holding the lock
        // since midir waits for the input handler to return.
        drop(metering);
        drop(listeners);
        if let Some(input) = input {
            input.close();
        }
        if let Some(output) = output {
            output.close();
        }

        if ungraceful {
            log::warn!("MIDI connection lost");
        } else {
            log::info!("MIDI connection closed");
        }
    }
}
