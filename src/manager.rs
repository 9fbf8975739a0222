//! RSA key lifecycle manager
//!
//! [`RsaKeyManager`] owns a device session and a [`TokenConfig`] and exposes
//! generate / import / fetch / sign / verify. Every failure is logged here
//! once, with the operation and container it belongs to, before it is
//! returned.

use tracing::error;

use crate::error::KeyResult;
use crate::model::{
    KeyRecord, KeyUsage, PrivateKeyDer, PublicKeyDer, SymmetricAlgorithm, TokenConfig,
};
use crate::ports::SkfDevice;
use crate::use_cases;

/// Key lifecycle operations on one token session
///
/// Operations take `&mut self`; share a manager across threads behind a
/// `Mutex`.
pub struct RsaKeyManager<D: SkfDevice> {
    device: D,
    config: TokenConfig,
}

impl<D: SkfDevice> RsaKeyManager<D> {
    pub fn new(device: D, config: TokenConfig) -> Self {
        Self { device, config }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn device(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_inner(self) -> D {
        self.device
    }

    /// Generate a signing keypair of `bits` in `container_name`
    pub fn generate(&mut self, container_name: &str, bits: u32) -> KeyResult<KeyRecord> {
        logged(
            "generate",
            container_name,
            use_cases::generate_key(&mut self.device, &self.config, container_name, bits),
        )
    }

    /// [`Self::generate`] with the configured default modulus length
    pub fn generate_default(&mut self, container_name: &str) -> KeyResult<KeyRecord> {
        let bits = self.config.default_bits;
        self.generate(container_name, bits)
    }

    /// Import a private key into the encryption slot of `container_name`
    pub fn import(
        &mut self,
        container_name: &str,
        algorithm: SymmetricAlgorithm,
        private_key: &PrivateKeyDer,
        expected: &PublicKeyDer,
    ) -> KeyResult<KeyRecord> {
        logged(
            "import",
            container_name,
            use_cases::import_key(
                &mut self.device,
                &self.config,
                container_name,
                algorithm,
                private_key,
                expected,
            ),
        )
    }

    /// Public key of the signing (`sign == true`) or encryption keypair, if present
    pub fn fetch(&mut self, container_name: &str, sign: bool) -> KeyResult<Option<KeyRecord>> {
        self.fetch_usage(container_name, KeyUsage::from_sign_flag(sign))
    }

    pub fn fetch_usage(
        &mut self,
        container_name: &str,
        usage: KeyUsage,
    ) -> KeyResult<Option<KeyRecord>> {
        logged(
            "fetch",
            container_name,
            use_cases::fetch_key(&mut self.device, container_name, usage),
        )
    }

    /// Raw signature over `digest` by the container's signing key
    pub fn sign(&mut self, container_name: &str, digest: &[u8]) -> KeyResult<Vec<u8>> {
        logged(
            "sign",
            container_name,
            use_cases::sign(&mut self.device, &self.config, container_name, digest),
        )
    }

    pub fn verify(
        &mut self,
        container_name: &str,
        digest: &[u8],
        signature: &[u8],
    ) -> KeyResult<bool> {
        logged(
            "verify",
            container_name,
            use_cases::verify(&mut self.device, container_name, digest, signature),
        )
    }
}

fn logged<T>(
    operation: &'static str,
    container_name: &str,
    result: KeyResult<T>,
) -> KeyResult<T> {
    if let Err(err) = &result {
        error!(operation, container = container_name, "Key operation failed: {}", err);
    }
    result
}
