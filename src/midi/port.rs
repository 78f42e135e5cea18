use std::{fmt, sync::Arc};

use super::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "input",
            Direction::Out => "output",
        }
    }
}

/// An input or output device as enumerated by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub manufacturer: Arc<str>,
    pub version: Arc<str>,
    pub direction: Direction,
}

impl Endpoint {
    pub fn new(id: impl Into<Arc<str>>, direction: Direction) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            manufacturer: "".into(),
            version: "".into(),
            direction,
        }
    }

    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<Arc<str>>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<Arc<str>>) -> Self {
        self.version = version.into();
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' (name: {}, manufacturer: {}, version: {})",
            self.direction, self.id, self.name, self.manufacturer, self.version,
        )
    }
}

/// Picks the endpoint to use among `endpoints` for the given `direction`.
///
/// Resolution order:
///
/// 1. the endpoint whose id is `default_id`, if any.
/// 2. the only endpoint for `direction`, if there is exactly one.
/// 3. the first endpoint for which `confirm` returns `true`,
///    candidates being presented in enumeration order.
///
/// `confirm` is never invoked in cases 1 & 2.
pub fn select<'a, C>(
    endpoints: &'a [Endpoint],
    direction: Direction,
    default_id: Option<&str>,
    mut confirm: C,
) -> Result<&'a Endpoint, Error>
where
    C: FnMut(&Endpoint) -> bool,
{
    let mut candidates = endpoints.iter().filter(|ep| ep.direction == direction);

    if let Some(default_id) = default_id {
        if let Some(endpoint) = candidates.clone().find(|ep| ep.id.as_ref() == default_id) {
            log::debug!("Using configured {endpoint}");
            return Ok(endpoint);
        }

        log::debug!("Configured MIDI {direction} '{default_id}' not found");
    }

    if candidates.clone().count() == 1 {
        if let Some(endpoint) = candidates.next() {
            log::debug!("Using single {endpoint}");
            return Ok(endpoint);
        }
    }

    for endpoint in candidates {
        log::debug!("Candidate {endpoint}");
        if confirm(endpoint) {
            return Ok(endpoint);
        }
    }

    Err(Error::NoDeviceSelected(direction))
}
