use tracing::debug;

use crate::error::{DeviceCall, ImportStage, KeyError, KeyResult};
use crate::logic::public_der_of_private;
use crate::model::{
    ContainerType, KeyRecord, PrivateKeyDer, PublicKeyDer, SymmetricAlgorithm, TokenConfig,
};
use crate::ports::SkfDevice;
use crate::registry::resolve_container;
use crate::transport::import_private_key;

/// Import an RSA private key into the encryption slot of `container_name`
///
/// The private key is checked against `expected` on the host first; a key
/// that does not match never reaches the token. The container must exist
/// and already hold a signing keypair.
///
/// # Errors
///
/// - `Encoding` if `private_key` is not a PKCS#1 or PKCS#8 RSA key
/// - `ImportVerificationFailed` if the key does not match `expected`, before or after import
/// - `ContainerNotFound` if the container does not exist
/// - `AlgorithmMismatch` if the container is not RSA
/// - `Device` for any token failure
pub fn import_key<D>(
    device: &mut D,
    config: &TokenConfig,
    container_name: &str,
    algorithm: SymmetricAlgorithm,
    private_key: &PrivateKeyDer,
    expected: &PublicKeyDer,
) -> KeyResult<KeyRecord>
where
    D: SkfDevice + ?Sized,
{
    let derived = public_der_of_private(private_key)?;
    if derived != *expected {
        debug!(container = container_name, "Private key does not match expected public key");
        return Err(KeyError::ImportVerificationFailed {
            name: container_name.to_string(),
            stage: ImportStage::PreImport,
        });
    }

    device
        .verify_pin(config.user_type, &config.pin)
        .during("SKF_VerifyPIN")?;

    let mut container =
        resolve_container(device, container_name, false)?.require_type(ContainerType::Rsa)?;

    let record = import_private_key(&mut container, algorithm, private_key, expected, config)?;
    container.close()?;
    Ok(record)
}
