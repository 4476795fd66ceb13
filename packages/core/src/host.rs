//! Host services: what the sandbox needs from its embedder.
//!
//! The environment is described by a trait rather than probed at runtime.
//! [`SandboxHost`] is the standard implementation; it owns the clock and
//! randomness and forwards `fetch` to a pluggable [`FetchProxy`], which by
//! default refuses every request.

use std::time::Instant;

use async_trait::async_trait;
use rand::RngCore;
use uuid::Uuid;

use crate::fetch::{FetchRequest, FetchResponse};
use crate::ShimError;

const FETCH_UNSUPPORTED: &str =
    "fetch is not implemented in the sandbox; network requests must be proxied by the host";

/// Executes network requests on behalf of the sandbox.
#[async_trait(?Send)]
pub trait FetchProxy {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ShimError>;
}

/// The default proxy: every request fails as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unproxied;

#[async_trait(?Send)]
impl FetchProxy for Unproxied {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ShimError> {
        tracing::debug!(url = %request.url, "fetch refused: no proxy installed");
        Err(ShimError::unsupported(FETCH_UNSUPPORTED))
    }
}

/// Operations of the subtle crypto surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtleOperation {
    Digest,
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    GenerateKey,
    ImportKey,
    ExportKey,
}

impl SubtleOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtleOperation::Digest => "digest",
            SubtleOperation::Encrypt => "encrypt",
            SubtleOperation::Decrypt => "decrypt",
            SubtleOperation::Sign => "sign",
            SubtleOperation::Verify => "verify",
            SubtleOperation::GenerateKey => "generateKey",
            SubtleOperation::ImportKey => "importKey",
            SubtleOperation::ExportKey => "exportKey",
        }
    }
}

/// Environment capabilities available to sandboxed code.
#[async_trait(?Send)]
pub trait HostServices {
    /// Perform a network request.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ShimError>;

    /// Wall-clock milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Milliseconds since the host was created. Never decreases.
    fn monotonic_millis(&self) -> f64;

    /// Fill `buf` with random bytes. Not suitable for key material.
    fn fill_random(&self, buf: &mut [u8]);

    /// A random (v4) UUID in hyphenated form.
    fn random_uuid(&self) -> String;

    /// Subtle crypto is not available in the sandbox.
    fn subtle(&self, operation: SubtleOperation, _input: &[u8]) -> Result<Vec<u8>, ShimError> {
        Err(ShimError::unsupported(format!(
            "crypto.subtle.{} is not supported in the sandbox",
            operation.as_str()
        )))
    }
}

/// Standard host: system clock, thread-local RNG, proxied fetch.
#[derive(Debug, Clone)]
pub struct SandboxHost<F: FetchProxy = Unproxied> {
    proxy: F,
    started: Instant,
}

impl SandboxHost {
    pub fn new() -> Self {
        Self::with_proxy(Unproxied)
    }
}

impl Default for SandboxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FetchProxy> SandboxHost<F> {
    pub fn with_proxy(proxy: F) -> Self {
        Self {
            proxy,
            started: Instant::now(),
        }
    }

    pub fn proxy(&self) -> &F {
        &self.proxy
    }
}

#[async_trait(?Send)]
impl<F: FetchProxy> HostServices for SandboxHost<F> {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ShimError> {
        self.proxy.fetch(request).await
    }

    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn monotonic_millis(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn fill_random(&self, buf: &mut [u8]) {
        rand::thread_rng().fill_bytes(buf);
    }

    fn random_uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// A proxy that returns canned responses keyed by URL.
    #[derive(Clone, Default)]
    pub struct MockProxy {
        responses: Rc<RefCell<HashMap<String, FetchResponse>>>,
        recorded: Rc<RefCell<Vec<FetchRequest>>>,
    }

    impl MockProxy {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: &str, response: FetchResponse) -> Self {
            self.responses
                .borrow_mut()
                .insert(url.to_string(), response);
            self
        }

        pub fn recorded_requests(&self) -> Vec<FetchRequest> {
            self.recorded.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl FetchProxy for MockProxy {
        async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ShimError> {
            let url = request.url.to_string();
            self.recorded.borrow_mut().push(request);
            self.responses
                .borrow()
                .get(&url)
                .cloned()
                .ok_or_else(|| ShimError::not_found(format!("No mock response for {}", url)))
        }
    }
}
