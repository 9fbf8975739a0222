use tracing::debug;

use crate::error::{DeviceCall, KeyResult};
use crate::model::{ContainerType, KeyUsage};
use crate::ports::SkfDevice;
use crate::registry::resolve_container;

/// Check `signature` over `digest` against the signing key of `container_name`
///
/// The public key is exported and the container closed before the token is
/// asked to verify, so no PIN is needed. A well-formed but wrong signature
/// is `Ok(false)`.
///
/// # Errors
///
/// - `ContainerNotFound` if the container does not exist
/// - `AlgorithmMismatch` if the container is not RSA
/// - `Device` if export or verification fails
pub fn verify<D>(
    device: &mut D,
    container_name: &str,
    digest: &[u8],
    signature: &[u8],
) -> KeyResult<bool>
where
    D: SkfDevice + ?Sized,
{
    let mut container =
        resolve_container(device, container_name, false)?.require_type(ContainerType::Rsa)?;
    let handle = container.handle();

    let public_key = container
        .device()
        .export_public_key(handle, KeyUsage::Sign)
        .during("SKF_ExportPublicKey")?;
    container.close()?;

    let valid = device
        .rsa_verify(&public_key, digest, signature)
        .during("SKF_RSAVerify")?;
    debug!(container = container_name, valid, "Verified signature");
    Ok(valid)
}
