//! Secure import transport
//!
//! Moves an RSA private key into a container without it crossing to the
//! token in the clear. A fresh session key is drawn from the token's RNG,
//! wrapped under the container's signing public key by the token itself,
//! and used to encrypt the private key DER. The token unwraps both and
//! installs the pair in the container's encryption slot.
//!
//! Soundness of the wrap rests on the token's asymmetric operation; this
//! module only orders the calls and checks the result.

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{DeviceCall, ImportStage, KeyError, KeyResult};
use crate::logic::key_record;
use crate::model::{
    BlockCipherParam, KeyRecord, KeyUsage, PrivateKeyDer, PublicKeyDer, SymmetricAlgorithm,
    TokenConfig,
};
use crate::ports::{SessionCipher, SessionKeyHandle, SkfDevice};
use crate::registry::OpenContainer;

/// A session key loaded into the token, destroyed when dropped
struct SessionKey<'d, D>
where
    D: SessionCipher + ?Sized,
{
    device: &'d mut D,
    handle: SessionKeyHandle,
    open: bool,
}

impl<'d, D> SessionKey<'d, D>
where
    D: SessionCipher + ?Sized,
{
    fn load(device: &'d mut D, key: &[u8], algorithm: SymmetricAlgorithm) -> KeyResult<Self> {
        let handle = device
            .set_symm_key(key, algorithm)
            .during("SKF_SetSymmKey")?;
        debug!(?handle, ?algorithm, "Session key loaded");
        Ok(Self {
            device,
            handle,
            open: true,
        })
    }

    fn device(&mut self) -> &mut D {
        &mut *self.device
    }

    fn encrypt(&mut self, param: &BlockCipherParam, plaintext: &[u8]) -> KeyResult<Vec<u8>> {
        self.device
            .encrypt_init(self.handle, param)
            .during("SKF_EncryptInit")?;
        self.device
            .encrypt(self.handle, plaintext)
            .during("SKF_Encrypt")
    }

    fn close(mut self) -> KeyResult<()> {
        self.open = false;
        debug!(handle = ?self.handle, "Destroying session key");
        self.device
            .close_handle(self.handle)
            .during("SKF_CloseHandle")
    }
}

impl<D> Drop for SessionKey<'_, D>
where
    D: SessionCipher + ?Sized,
{
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        debug!(handle = ?self.handle, "Destroying session key");
        if let Err(err) = self.device.close_handle(self.handle) {
            warn!(handle = ?self.handle, "Failed to destroy session key: {}", err);
        }
    }
}

/// Import `private_key` into the container's encryption slot
///
/// The container must already hold a signing keypair; its public half wraps
/// the session key. After the token accepts the import, the encryption
/// public key is exported again and must equal `expected`.
///
/// # Returns
///
/// The identifier and DER of the imported key, tagged with usage encrypt
///
/// # Errors
///
/// - `ImportVerificationFailed` with stage `PostImport` if the re-exported key differs
/// - `Device` if any token call fails
pub fn import_private_key<D>(
    container: &mut OpenContainer<'_, D>,
    algorithm: SymmetricAlgorithm,
    private_key: &PrivateKeyDer,
    expected: &PublicKeyDer,
    config: &TokenConfig,
) -> KeyResult<KeyRecord>
where
    D: SkfDevice + ?Sized,
{
    let name = container.name().to_string();
    let handle = container.handle();
    debug!(container = %name, ?algorithm, "Starting key import");

    let sign_key = container
        .device()
        .export_public_key(handle, KeyUsage::Sign)
        .during("SKF_ExportPublicKey")?;

    let session_key = Zeroizing::new(
        container
            .device()
            .gen_random(config.session_key_len)
            .during("SKF_GenRandom")?,
    );

    let (wrapped_key, encrypted_private_key) = {
        let mut session = SessionKey::load(container.device(), &session_key, algorithm)?;
        let wrapped_key = session
            .device()
            .ext_rsa_pub_key_operation(&sign_key, &session_key)
            .during("SKF_ExtRSAPubKeyOperation")?;
        let ciphertext = session.encrypt(&config.cipher_param, private_key.as_bytes())?;
        session.close()?;
        (wrapped_key, ciphertext)
    };
    drop(session_key);

    debug!(
        container = %name,
        wrapped_len = wrapped_key.len(),
        encrypted_len = encrypted_private_key.len(),
        "Submitting wrapped key pair"
    );
    container
        .device()
        .import_rsa_key_pair(handle, algorithm, &wrapped_key, &encrypted_private_key)
        .during("SKF_ImportRSAKeyPair")?;

    let imported = container
        .device()
        .export_public_key(handle, KeyUsage::Encrypt)
        .during("SKF_ExportPublicKey")?;
    let record = key_record(&name, KeyUsage::Encrypt, &imported)?;

    if record.public_der != *expected {
        warn!(container = %name, "Imported key does not match the expected public key");
        return Err(KeyError::ImportVerificationFailed {
            name,
            stage: ImportStage::PostImport,
        });
    }

    info!(container = %name, ski = %record.ski, "Imported RSA key pair");
    Ok(record)
}
