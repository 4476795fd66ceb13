use hostshim_core::ShimError;

use crate::StorageClient;

/// Per-host bridge state: the installed client and the selected space.
///
/// A session starts empty. Only [`Bridge::initialize`](crate::Bridge::initialize)
/// changes it.
#[derive(Debug)]
pub struct Session<C> {
    client: Option<C>,
    current_space: Option<String>,
}

impl<C> Default for Session<C> {
    fn default() -> Self {
        Self {
            client: None,
            current_space: None,
        }
    }
}

impl<C: StorageClient> Session<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&C> {
        self.client.as_ref()
    }

    pub fn current_space(&self) -> Option<&str> {
        self.current_space.as_deref()
    }

    pub(crate) fn require_client(&self) -> Result<&C, ShimError> {
        self.client
            .as_ref()
            .ok_or_else(|| ShimError::initialization("Client not initialized"))
    }

    pub(crate) fn require_space(&self) -> Result<&str, ShimError> {
        self.current_space
            .as_deref()
            .ok_or_else(|| ShimError::state("No space selected"))
    }

    /// Install a fresh client. The selected space is cleared.
    pub(crate) fn install(&mut self, client: C) {
        self.client = Some(client);
        self.current_space = None;
    }

    pub(crate) fn select_space(&mut self, did: String) {
        self.current_space = Some(did);
    }
}
