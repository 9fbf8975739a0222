use crate::error::DriverResult;
use crate::model::{Pin, UserType};

pub trait PinVerifier {
    /// Present `pin` for `user_type` to the open application
    fn verify_pin(&mut self, user_type: UserType, pin: &Pin) -> DriverResult<()>;
}
