use once_cell::sync::Lazy;
use std::{collections::BTreeMap, sync::Arc};

use super::{
    Connection, ConnectionConfig, ConnectionStatus, Context, Error, M7clConnection,
    TransportDefaults, UserConfig,
};

pub static FACTORY: Lazy<Arc<Factory>> =
    Lazy::new(|| Factory::default().with::<M7clConnection>().into());

pub trait Buildable: Connection + Sized {
    /// Mode key, as selected by the operator.
    const MODE: &'static str;
    const NAME: &'static str;

    fn defaults() -> TransportDefaults;
    fn build(config: ConnectionConfig, ctx: Context) -> Self;
}

impl Buildable for M7clConnection {
    const MODE: &'static str = "m7cl";
    const NAME: &'static str = M7clConnection::NAME;

    fn defaults() -> TransportDefaults {
        TransportDefaults::default()
    }

    fn build(config: ConnectionConfig, ctx: Context) -> Self {
        M7clConnection::connect(config, ctx)
    }
}

pub struct Transport {
    pub name: &'static str,
    pub defaults: fn() -> TransportDefaults,
    build: fn(ConnectionConfig, Context) -> Box<dyn Connection>,
}

impl Transport {
    /// Resolves the configuration for this transport.
    pub fn complete_config(&self, user: &UserConfig) -> ConnectionConfig {
        ConnectionConfig::complete(user, &(self.defaults)())
    }
}

fn build_boxed<B: Buildable>(config: ConnectionConfig, ctx: Context) -> Box<dyn Connection> {
    Box::new(B::build(config, ctx))
}

#[derive(Default)]
pub struct Factory(BTreeMap<&'static str, Transport>);

impl Factory {
    pub(super) fn with<B: Buildable>(mut self) -> Self {
        self.0.insert(
            B::MODE,
            Transport {
                name: B::NAME,
                defaults: B::defaults,
                build: build_boxed::<B>,
            },
        );
        self
    }

    /// Lists the `(mode, name)` of the available transports.
    pub fn list(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.0.iter().map(|(mode, transport)| (*mode, transport.name))
    }

    pub fn get(&self, mode: &str) -> Option<&Transport> {
        self.0.get(mode)
    }

    pub fn build(
        &self,
        mode: &str,
        user: &UserConfig,
        ctx: Context,
    ) -> Result<Box<dyn Connection>, Error> {
        let transport = self
            .get(mode)
            .ok_or_else(|| Error::UnknownMode(mode.into()))?;

        let config = transport.complete_config(user);
        log::debug!("Building {} connection with {config:?}", transport.name);

        Ok((transport.build)(config, ctx))
    }
}

/// Holds the one connection in use.
#[derive(Default)]
pub struct Current {
    mode: Option<Arc<str>>,
    conn: Option<Box<dyn Connection>>,
}

impl Current {
    /// Closes the current connection, if any, then builds a new one.
    pub fn switch(
        &mut self,
        factory: &Factory,
        mode: &str,
        user: &UserConfig,
        ctx: Context,
    ) -> Result<&dyn Connection, Error> {
        self.close(false);

        let conn = factory.build(mode, user, ctx)?;
        self.mode = Some(mode.into());

        Ok(&**self.conn.insert(conn))
    }

    pub fn get(&self) -> Option<&dyn Connection> {
        self.conn.as_deref()
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.conn
            .as_ref()
            .map_or_else(ConnectionStatus::disconnected, |conn| conn.status())
    }

    /// The address the next connection is expected to use if not connected.
    pub fn address(&self, factory: &Factory, mode: &str, user: &UserConfig) -> Option<String> {
        if let Some(address) = self.status().address() {
            return Some(address.to_string());
        }

        factory
            .get(mode)
            .map(|transport| transport.complete_config(user).probable_address())
    }

    pub fn close(&mut self, ungraceful: bool) {
        if let Some(conn) = self.conn.take() {
            log::debug!("Closing {:?} connection", self.mode);
            conn.close(ungraceful);
        }
        self.mode = None;
    }
}

impl Drop for Current {
    fn drop(&mut self) {
        self.close(false);
    }
}
