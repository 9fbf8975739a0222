//! ContainerManager trait - capability to enumerate, open and create containers

use crate::error::DriverResult;
use crate::model::ContainerType;

/// Opaque handle of an open container, valid until closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerHandle(pub u64);

/// Capability to manage the named key containers of an application
pub trait ContainerManager {
    /// Names of all containers in the application
    ///
    /// # Errors
    ///
    /// A [`crate::error::DriverErrorKind::NoContainer`] error means the
    /// application has no containers yet; every other error is a failure.
    fn enum_containers(&mut self) -> DriverResult<Vec<String>>;

    fn open_container(&mut self, name: &str) -> DriverResult<ContainerHandle>;

    /// Create an empty container; fails if the name is already taken
    fn create_container(&mut self, name: &str) -> DriverResult<ContainerHandle>;

    fn close_container(&mut self, handle: ContainerHandle) -> DriverResult<()>;

    fn container_type(&mut self, handle: ContainerHandle) -> DriverResult<ContainerType>;
}
