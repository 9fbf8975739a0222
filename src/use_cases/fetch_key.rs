use tracing::{debug, info};

use crate::error::{sar, KeyError, KeyResult};
use crate::logic::key_record;
use crate::model::{ContainerType, KeyRecord, KeyUsage};
use crate::ports::SkfDevice;
use crate::registry::resolve_container;

/// Look up the public key of `usage` held in `container_name`
///
/// Absence is a normal outcome here: a missing container, a non-RSA
/// container or an empty key slot all give `Ok(None)`. No PIN is needed.
pub fn fetch_key<D>(
    device: &mut D,
    container_name: &str,
    usage: KeyUsage,
) -> KeyResult<Option<KeyRecord>>
where
    D: SkfDevice + ?Sized,
{
    let mut container = match resolve_container(device, container_name, false) {
        Ok(container) => container,
        Err(KeyError::ContainerNotFound { .. }) => {
            info!(container = container_name, "No such container");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    let container_type = container.container_type()?;
    if container_type != ContainerType::Rsa {
        info!(container = container_name, ?container_type, "Container holds no RSA keys");
        return Ok(None);
    }

    let handle = container.handle();
    let public_key = match container.device().export_public_key(handle, usage) {
        Ok(public_key) => public_key,
        Err(err) if err.code == sar::KEY_NOT_FOUND => {
            info!(container = container_name, ?usage, "No key in slot");
            return Ok(None);
        }
        Err(err) => return Err(err.into_key_error("SKF_ExportPublicKey")),
    };
    container.close()?;

    let record = key_record(container_name, usage, &public_key)?;
    debug!(container = container_name, ski = %record.ski, "Fetched public key");
    Ok(Some(record))
}
