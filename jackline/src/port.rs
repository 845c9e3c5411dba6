use super::*;
use crate::client::Shared;

/// A port, registered by a [`Client`] or found by name through one.
///
/// Ports keep a reference to the client they came from, and stop working when
/// it is closed. Cloning a port does not register a new one.
#[derive(Clone)]
pub struct Port {
    owner: Arc<Shared>,
    handle: PortHandle,
    type_info: PortTypeInformation,
}

impl Port {
    #[inline(always)]
    pub(crate) fn new(owner: Arc<Shared>, handle: PortHandle, type_info: PortTypeInformation) -> Self {
        Self {
            owner,
            handle,
            type_info,
        }
    }

    #[inline(always)]
    pub(crate) fn owner(&self) -> &Shared {
        &self.owner
    }

    #[inline(always)]
    pub(crate) fn handle(&self) -> PortHandle {
        self.handle
    }

    /// Full name, `client:port`.
    pub fn name(&self) -> Result<String> {
        self.owner.ensure_open()?;
        Ok(self.owner.native().port_name(self.handle))
    }

    /// Name without the client prefix.
    pub fn short_name(&self) -> Result<String> {
        self.owner.ensure_open()?;
        Ok(self.owner.native().port_short_name(self.handle))
    }

    /// The type string, as reported by the server.
    pub fn type_name(&self) -> Result<String> {
        self.owner.ensure_open()?;
        Ok(self.owner.native().port_type(self.handle))
    }

    /// Registry metadata, resolved once, when the port was issued.
    #[inline(always)]
    pub fn type_info(&self) -> &PortTypeInformation {
        &self.type_info
    }

    pub fn flags(&self) -> Result<PortFlags> {
        self.owner.ensure_open()?;
        Ok(status::decode_port_flags(self.owner.native().port_flags(self.handle)))
    }

    /// Whether `client` owns this port on the server side.
    pub fn belongs_to(&self, client: &Client) -> Result<bool> {
        self.owner.ensure_open()?;
        client.shared().ensure_open()?;

        if !self.owner.same_native(client.shared()) {
            return Ok(false);
        }

        Ok(client
            .shared()
            .native()
            .port_is_mine(client.shared().handle(), self.handle))
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("handle", &self.handle)
            .field("type_info", &self.type_info)
            .finish_non_exhaustive()
    }
}
