use super::*;

/// A source of port type descriptions.
pub trait PortTypeProvider: Send + Sync {
    /// The types this provider knows about.
    fn types(&self) -> &[PortTypeInformation];
}

/// A provider over a fixed list of types.
#[derive(Debug, Clone, Default)]
pub struct StaticPortTypes(Box<[PortTypeInformation]>);

impl StaticPortTypes {
    #[inline(always)]
    pub fn new(types: impl IntoIterator<Item = PortTypeInformation>) -> Self {
        Self(types.into_iter().collect())
    }

    /// Default audio and MIDI types.
    #[inline(always)]
    pub fn defaults() -> Self {
        Self::new([PortTypeInformation::AUDIO, PortTypeInformation::MIDI])
    }
}

impl PortTypeProvider for StaticPortTypes {
    #[inline(always)]
    fn types(&self) -> &[PortTypeInformation] {
        &self.0
    }
}

/// Identifies a registration in a [`PortTypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(u64);

#[derive(Default)]
struct Providers {
    next_id: u64,
    list: Vec<(ProviderId, Arc<dyn PortTypeProvider>)>,
}

/// An ordered set of [`PortTypeProvider`]s, queried by type name.
///
/// Providers can be added and removed at any time, from any thread. Lookups go
/// through providers in registration order, the first match wins.
///
/// Clients look types up when registering or resolving ports, so a registry
/// is typically shared between clients behind an [`Arc`].
#[derive(Default)]
pub struct PortTypeRegistry {
    providers: parking_lot::Mutex<Providers>,
}

impl PortTypeRegistry {
    /// An empty registry. Use [`with_defaults`](Self::with_defaults) for one
    /// that knows the default audio and MIDI types.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(StaticPortTypes::defaults()));
        registry
    }

    pub fn register(&self, provider: Arc<dyn PortTypeProvider>) -> ProviderId {
        let mut providers = self.providers.lock();

        let id = ProviderId(providers.next_id);
        providers.next_id += 1;
        providers.list.push((id, provider));

        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unregister(&self, id: ProviderId) -> bool {
        let mut providers = self.providers.lock();

        let Some(i) = providers.list.iter().position(|(other, _)| *other == id) else {
            return false;
        };

        providers.list.remove(i);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<PortTypeInformation> {
        self.providers
            .lock()
            .list
            .iter()
            .flat_map(|(_, provider)| provider.types())
            .find(|info| info.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PortTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortTypeRegistry")
            .field("providers", &self.len())
            .finish()
    }
}
