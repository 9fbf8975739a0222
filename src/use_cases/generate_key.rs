//! Generate key use case

use tracing::{debug, info};

use crate::error::{DeviceCall, KeyResult};
use crate::logic::key_record;
use crate::model::{ContainerType, KeyRecord, KeyUsage, TokenConfig};
use crate::ports::SkfDevice;
use crate::registry::resolve_container;

/// Generate a signing keypair in `container_name`, creating the container if needed
///
/// # Arguments
///
/// * `device` - Open device session
/// * `config` - PIN and user type to log in with
/// * `container_name` - Container to generate into
/// * `bits` - Modulus length, 1024 or 2048 on most tokens
///
/// # Returns
///
/// Identifier (usage sign) and DER of the new public key
///
/// # Errors
///
/// - `AlgorithmMismatch` if the container holds non-RSA keys
/// - `Device` if PIN verification or generation fails
pub fn generate_key<D>(
    device: &mut D,
    config: &TokenConfig,
    container_name: &str,
    bits: u32,
) -> KeyResult<KeyRecord>
where
    D: SkfDevice + ?Sized,
{
    device
        .verify_pin(config.user_type, &config.pin)
        .during("SKF_VerifyPIN")?;

    let mut container = resolve_container(device, container_name, true)?
        .require_type_or_empty(ContainerType::Rsa)?;
    let handle = container.handle();

    debug!(container = container_name, bits, "Generating RSA key pair");
    let public_key = container
        .device()
        .gen_rsa_key_pair(handle, bits)
        .during("SKF_GenRSAKeyPair")?;

    let record = key_record(container_name, KeyUsage::Sign, &public_key)?;
    container.close()?;

    info!(container = container_name, ski = %record.ski, "Generated RSA key pair");
    Ok(record)
}
