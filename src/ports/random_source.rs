use crate::error::DriverResult;

pub trait RandomSource {
    /// `len` bytes from the token's random number generator
    fn gen_random(&mut self, len: usize) -> DriverResult<Vec<u8>>;
}
