//! [`midir`] backed implementation of the platform MIDI capability.

use std::{cell::RefCell, sync::Arc};

use super::{
    access::{self, DisconnectHandler, Listener, MsgHandler},
    Direction, Endpoint, Error,
};

const PRESENCE_POLL_MS: i64 = 2_000;

pub struct MidirBackend {
    client_name: Arc<str>,
}

impl MidirBackend {
    pub fn new(client_name: impl Into<Arc<str>>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }
}

impl access::Backend for MidirBackend {
    fn is_supported(&self) -> bool {
        cfg!(any(
            target_os = "linux",
            target_os = "macos",
            target_os = "ios",
            target_os = "windows",
        ))
    }

    fn request_access(&self) -> Result<Box<dyn access::Access>, Error> {
        let deny = |err: midir::InitError| {
            log::error!("MIDI client initialization: {err}");
            Error::AccessDenied(err.to_string().into())
        };

        let mut midi_in = midir::MidiInput::new(&format!("{} In", self.client_name)).map_err(deny)?;
        // Metering responses are sysex msgs.
        midi_in.ignore(midir::Ignore::TimeAndActiveSense);
        let midi_out =
            midir::MidiOutput::new(&format!("{} Out", self.client_name)).map_err(deny)?;

        let ins = enumerate(&midi_in, &self.client_name, Direction::In)?;
        let outs = enumerate(&midi_out, &self.client_name, Direction::Out)?;

        Ok(Box::new(MidirAccess {
            client_name: self.client_name.clone(),
            midi_in: RefCell::new(Some(midi_in)),
            midi_out: RefCell::new(Some(midi_out)),
            ins,
            outs,
        }))
    }
}

fn enumerate<IO: midir::MidiIO>(
    io: &IO,
    client_name: &str,
    direction: Direction,
) -> Result<Vec<(Endpoint, IO::Port)>, Error> {
    let mut list = Vec::new();
    for port in io.ports() {
        let name = io.port_name(&port)?;
        if !name.starts_with(client_name) {
            list.push((Endpoint::new(name, direction), port));
        }
    }

    Ok(list)
}

fn is_present(client_name: &str, endpoint: &Endpoint) -> Result<bool, Error> {
    let probe_name = format!("{client_name} probe");
    let names = match endpoint.direction {
        Direction::In => enumerate(&midir::MidiInput::new(&probe_name)?, client_name, Direction::In)?
            .into_iter()
            .map(|(ep, _)| ep.id)
            .collect::<Vec<_>>(),
        Direction::Out => {
            enumerate(&midir::MidiOutput::new(&probe_name)?, client_name, Direction::Out)?
                .into_iter()
                .map(|(ep, _)| ep.id)
                .collect::<Vec<_>>()
        }
    };

    Ok(names.contains(&endpoint.id))
}

struct MidirAccess {
    client_name: Arc<str>,
    midi_in: RefCell<Option<midir::MidiInput>>,
    midi_out: RefCell<Option<midir::MidiOutput>>,
    ins: Vec<(Endpoint, midir::MidiInputPort)>,
    outs: Vec<(Endpoint, midir::MidiOutputPort)>,
}

fn find_port<'a, P>(list: &'a [(Endpoint, P)], endpoint: &Endpoint) -> Result<&'a P, Error> {
    list.iter()
        .find(|(ep, _)| ep.id == endpoint.id)
        .map(|(_, port)| port)
        .ok_or_else(|| Error::PortNotFound(endpoint.id.clone()))
}

impl access::Access for MidirAccess {
    fn inputs(&self) -> Vec<Endpoint> {
        self.ins.iter().map(|(ep, _)| ep.clone()).collect()
    }

    fn outputs(&self) -> Vec<Endpoint> {
        self.outs.iter().map(|(ep, _)| ep.clone()).collect()
    }

    fn open_output(&self, endpoint: &Endpoint) -> Result<Box<dyn access::OutputPort>, Error> {
        let port = find_port(&self.outs, endpoint)?;
        let midi_out = self
            .midi_out
            .borrow_mut()
            .take()
            .ok_or_else(|| Error::Connection(endpoint.id.clone()))?;

        match midi_out.connect(port, &self.client_name) {
            Ok(conn) => {
                log::info!("Connected for Output to {}", endpoint.id);
                Ok(Box::new(MidirOutput {
                    endpoint: endpoint.clone(),
                    conn,
                }))
            }
            Err(err) => {
                *self.midi_out.borrow_mut() = Some(err.into_inner());
                let err = Error::Connection(endpoint.id.clone());
                log::error!("{err}");
                Err(err)
            }
        }
    }

    fn open_input(
        &self,
        endpoint: &Endpoint,
        mut on_msg: MsgHandler,
    ) -> Result<Box<dyn access::InputPort>, Error> {
        let port = find_port(&self.ins, endpoint)?;
        let midi_in = self
            .midi_in
            .borrow_mut()
            .take()
            .ok_or_else(|| Error::Connection(endpoint.id.clone()))?;

        let res = midi_in.connect(
            port,
            &self.client_name,
            move |_ts, msg, _| on_msg(msg),
            (),
        );
        match res {
            Ok(conn) => {
                log::info!("Connected for Input to {}", endpoint.id);
                Ok(Box::new(MidirInput {
                    endpoint: endpoint.clone(),
                    conn,
                }))
            }
            Err(err) => {
                *self.midi_in.borrow_mut() = Some(err.into_inner());
                let err = Error::Connection(endpoint.id.clone());
                log::error!("{err}");
                Err(err)
            }
        }
    }

    /// midir doesn't notify hot-unplugs, so the port list is polled instead.
    fn on_disconnect(
        &self,
        endpoint: &Endpoint,
        handler: DisconnectHandler,
    ) -> Result<Listener, Error> {
        let client_name = self.client_name.clone();
        let endpoint = endpoint.clone();
        let mut handler = Some(handler);

        let timer = timer::Timer::new();
        let guard = timer.schedule_repeating(
            chrono::Duration::milliseconds(PRESENCE_POLL_MS),
            move || {
                if handler.is_none() {
                    return;
                }

                match is_present(&client_name, &endpoint) {
                    Ok(true) => (),
                    Ok(false) => {
                        log::debug!("MIDI {} {} vanished", endpoint.direction, endpoint.id);
                        if let Some(handler) = handler.take() {
                            handler(&endpoint);
                        }
                    }
                    Err(err) => log::warn!("Couldn't check MIDI {}: {err}", endpoint.id),
                }
            },
        );

        Ok(Box::new(PresenceWatch {
            _guard: guard,
            _timer: timer,
        }))
    }
}

struct PresenceWatch {
    // Dropping the guard cancels the schedule.
    _guard: timer::Guard,
    _timer: timer::Timer,
}

struct MidirOutput {
    endpoint: Endpoint,
    conn: midir::MidiOutputConnection,
}

impl access::OutputPort for MidirOutput {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn send(&mut self, msg: &[u8]) -> Result<(), Error> {
        self.conn.send(msg).map_err(|err| {
            log::error!(
                "Failed to send MIDI msg {}: {err}",
                crate::bytes::Displayable::from(msg)
            );
            err
        })?;

        Ok(())
    }

    fn close(self: Box<Self>) {
        let _ = self.conn.close();
        log::debug!("Disconnected Output from {}", self.endpoint.id);
    }
}

struct MidirInput {
    endpoint: Endpoint,
    conn: midir::MidiInputConnection<()>,
}

impl access::InputPort for MidirInput {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn close(self: Box<Self>) {
        let _ = self.conn.close();
        log::debug!("Disconnected Input from {}", self.endpoint.id);
    }
}

/// Lists the MIDI endpoints currently available, outputs first.
pub fn list_endpoints(client_name: &str) -> Result<Vec<Endpoint>, Error> {
    let probe_name = format!("{client_name} list");

    let mut list: Vec<Endpoint> =
        enumerate(&midir::MidiOutput::new(&probe_name)?, client_name, Direction::Out)?
            .into_iter()
            .map(|(ep, _)| ep)
            .collect();
    list.extend(
        enumerate(&midir::MidiInput::new(&probe_name)?, client_name, Direction::In)?
            .into_iter()
            .map(|(ep, _)| ep),
    );

    Ok(list)
}
