//! RsaOperations trait - capability to create and use RSA keys on the token

use crate::error::DriverResult;
use crate::model::{KeyUsage, RsaPublicKeyBlob, SymmetricAlgorithm};
use crate::ports::ContainerHandle;

/// Capability to create, import and use RSA keypairs held in containers
///
/// Each container holds a signing keypair and an encryption keypair.
/// Private halves never leave the token.
pub trait RsaOperations {
    /// Generate a new signing keypair in the container
    ///
    /// # Returns
    ///
    /// The public half of the generated keypair
    fn gen_rsa_key_pair(
        &mut self,
        container: ContainerHandle,
        bits: u32,
    ) -> DriverResult<RsaPublicKeyBlob>;

    /// Export the public half of the container's keypair for `usage`
    fn export_public_key(
        &mut self,
        container: ContainerHandle,
        usage: KeyUsage,
    ) -> DriverResult<RsaPublicKeyBlob>;

    /// Encrypt `data` under an arbitrary RSA public key
    fn ext_rsa_pub_key_operation(
        &mut self,
        public_key: &RsaPublicKeyBlob,
        data: &[u8],
    ) -> DriverResult<Vec<u8>>;

    /// Install an encryption keypair transported under a wrapped session key
    ///
    /// # Arguments
    ///
    /// * `wrapped_key` - Session key encrypted under the container's signing public key
    /// * `encrypted_private_key` - Private key DER encrypted under the session key
    fn import_rsa_key_pair(
        &mut self,
        container: ContainerHandle,
        algorithm: SymmetricAlgorithm,
        wrapped_key: &[u8],
        encrypted_private_key: &[u8],
    ) -> DriverResult<()>;

    /// Sign `digest` with the container's signing private key
    fn rsa_sign_data(&mut self, container: ContainerHandle, digest: &[u8])
        -> DriverResult<Vec<u8>>;

    /// Check `signature` over `digest` against an RSA public key
    ///
    /// A well-formed but wrong signature yields `Ok(false)`, not an error.
    fn rsa_verify(
        &mut self,
        public_key: &RsaPublicKeyBlob,
        digest: &[u8],
        signature: &[u8],
    ) -> DriverResult<bool>;
}
