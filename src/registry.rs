//! Container registry
//!
//! Finds or creates a named container and hands it out as an
//! [`OpenContainer`] guard. The guard closes the container handle when it is
//! dropped, so every exit path of an operation releases it, including early
//! returns through `?`.

use tracing::{debug, info, warn};

use crate::error::{DeviceCall, KeyError, KeyResult};
use crate::model::ContainerType;
use crate::ports::{ContainerHandle, ContainerManager};

/// Names of all containers, treating the "no container yet" signal as empty
pub fn list_containers<D>(device: &mut D) -> KeyResult<Vec<String>>
where
    D: ContainerManager + ?Sized,
{
    match device.enum_containers() {
        Ok(names) => Ok(names),
        Err(err) if err.is_no_container() => {
            debug!("Application has no containers yet");
            Ok(Vec::new())
        }
        Err(err) => Err(err.into_key_error("SKF_EnumContainer")),
    }
}

/// Open the container called `name`, creating it first if asked to
///
/// # Errors
///
/// - `ContainerNotFound` if the container is absent and `create_if_absent` is false
/// - `Device` for any other device failure
pub fn resolve_container<'d, D>(
    device: &'d mut D,
    name: &str,
    create_if_absent: bool,
) -> KeyResult<OpenContainer<'d, D>>
where
    D: ContainerManager + ?Sized,
{
    debug!(container = name, "Resolving container");

    let exists = list_containers(device)?.iter().any(|n| n == name);

    let handle = if exists {
        device.open_container(name).map_err(|err| {
            if err.is_no_container() {
                KeyError::ContainerNotFound {
                    name: name.to_string(),
                }
            } else {
                err.into_key_error("SKF_OpenContainer")
            }
        })?
    } else if create_if_absent {
        info!(container = name, "Creating container");
        device
            .create_container(name)
            .during("SKF_CreateContainer")?
    } else {
        return Err(KeyError::ContainerNotFound {
            name: name.to_string(),
        });
    };

    debug!(container = name, ?handle, "Container open");
    Ok(OpenContainer {
        device,
        handle,
        name: name.to_string(),
        open: true,
    })
}

/// An open container; the handle is closed when this value goes away
pub struct OpenContainer<'d, D>
where
    D: ContainerManager + ?Sized,
{
    device: &'d mut D,
    handle: ContainerHandle,
    name: String,
    open: bool,
}

impl<'d, D> OpenContainer<'d, D>
where
    D: ContainerManager + ?Sized,
{
    pub fn handle(&self) -> ContainerHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The device session the container was opened on
    pub fn device(&mut self) -> &mut D {
        &mut *self.device
    }

    pub fn container_type(&mut self) -> KeyResult<ContainerType> {
        self.device
            .container_type(self.handle)
            .during("SKF_GetContainerType")
    }

    /// Keep the container only if it holds `expected` keys
    ///
    /// On mismatch the handle is closed before `AlgorithmMismatch` is returned.
    pub fn require_type(self, expected: ContainerType) -> KeyResult<Self> {
        self.require(expected, false)
    }

    /// Like [`Self::require_type`], but also accepts a container with no keys
    pub fn require_type_or_empty(self, expected: ContainerType) -> KeyResult<Self> {
        self.require(expected, true)
    }

    fn require(mut self, expected: ContainerType, allow_empty: bool) -> KeyResult<Self> {
        let actual = self.container_type()?;
        if actual == expected || (allow_empty && actual == ContainerType::Empty) {
            return Ok(self);
        }

        let name = self.name.clone();
        if let Err(err) = self.close() {
            warn!(container = %name, "Failed to close container after type mismatch: {}", err);
        }
        Err(KeyError::AlgorithmMismatch {
            name,
            expected,
            actual,
        })
    }

    /// Close now and report a failing close, instead of logging it on drop
    pub fn close(mut self) -> KeyResult<()> {
        self.open = false;
        debug!(container = %self.name, handle = ?self.handle, "Closing container");
        self.device
            .close_container(self.handle)
            .during("SKF_CloseContainer")
    }
}

impl<D> Drop for OpenContainer<'_, D>
where
    D: ContainerManager + ?Sized,
{
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        debug!(container = %self.name, handle = ?self.handle, "Closing container");
        if let Err(err) = self.device.close_container(self.handle) {
            warn!(container = %self.name, "Failed to close container: {}", err);
        }
    }
}
