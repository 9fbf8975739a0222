use tracing::debug;

use crate::error::{DeviceCall, KeyResult};
use crate::model::{ContainerType, TokenConfig};
use crate::ports::SkfDevice;
use crate::registry::resolve_container;

/// Sign `digest` with the signing key of `container_name`
///
/// The digest is passed to the token as is; hashing is the caller's job.
///
/// # Errors
///
/// - `ContainerNotFound` if the container does not exist
/// - `AlgorithmMismatch` if the container is not RSA
/// - `Device` if PIN verification or signing fails
pub fn sign<D>(
    device: &mut D,
    config: &TokenConfig,
    container_name: &str,
    digest: &[u8],
) -> KeyResult<Vec<u8>>
where
    D: SkfDevice + ?Sized,
{
    device
        .verify_pin(config.user_type, &config.pin)
        .during("SKF_VerifyPIN")?;

    let mut container =
        resolve_container(device, container_name, false)?.require_type(ContainerType::Rsa)?;
    let handle = container.handle();

    debug!(container = container_name, digest_len = digest.len(), "Signing digest");
    let signature = container
        .device()
        .rsa_sign_data(handle, digest)
        .during("SKF_RSASignData")?;
    container.close()?;

    Ok(signature)
}
