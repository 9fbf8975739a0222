//! Software token implementing every device port
//!
//! Keys live in memory as `rsa` private keys. Session keys are emulated with
//! AES-128-CBC whatever SM1/SSF33/SM4 identifier they are loaded under, and
//! only the CBC identifiers are accepted. An import unwraps the private key
//! with the IV and padding of the last `encrypt_init`. Every port method can be made to
//! fail with [`SoftToken::fail_on`], and handle accounting is exposed through
//! [`SoftToken::stats`] and [`SoftToken::handles_balanced`].

use std::collections::{BTreeMap, HashMap};

use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::{sar, DriverError, DriverResult};
use crate::model::{
    BlockCipherParam, ContainerType, KeyUsage, Pin, RsaPublicKeyBlob, SymmetricAlgorithm,
    UserType, MAX_RSA_EXPONENT_LEN, MAX_RSA_MODULUS_LEN,
};
use crate::ports::{
    ContainerHandle, ContainerManager, PinVerifier, RandomSource, RsaOperations, SessionCipher,
    SessionKeyHandle,
};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const SESSION_KEY_LEN: usize = 16;
const MAX_NAME_LEN: usize = 64;
const PIN_RETRIES: u32 = 3;

/// Port methods that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    VerifyPin,
    EnumContainer,
    OpenContainer,
    CreateContainer,
    CloseContainer,
    GetContainerType,
    GenRandom,
    SetSymmKey,
    EncryptInit,
    Encrypt,
    CloseHandle,
    GenRsaKeyPair,
    ExportPublicKey,
    ExtRsaPubKeyOperation,
    ImportRsaKeyPair,
    RsaSignData,
    RsaVerify,
}

/// Handle counters since the token was created
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    /// Handles issued by open and create
    pub containers_opened: u32,
    pub containers_created: u32,
    pub containers_closed: u32,
    pub session_keys_opened: u32,
    pub session_keys_closed: u32,
}

struct SoftContainer {
    container_type: ContainerType,
    sign_key: Option<RsaPrivateKey>,
    enc_key: Option<RsaPrivateKey>,
}

impl SoftContainer {
    fn empty() -> Self {
        Self {
            container_type: ContainerType::Empty,
            sign_key: None,
            enc_key: None,
        }
    }
}

struct SoftSessionKey {
    key: Zeroizing<Vec<u8>>,
    param: Option<BlockCipherParam>,
}

pub struct SoftToken {
    user_pin: Pin,
    admin_pin: Pin,
    retries_left: u32,
    logged_in: bool,
    containers: BTreeMap<String, SoftContainer>,
    open_containers: HashMap<u64, String>,
    session_keys: HashMap<u64, SoftSessionKey>,
    next_handle: u64,
    faults: HashMap<Call, u32>,
    corrupt_import: bool,
    corrupt_export: Option<KeyUsage>,
    import_param: BlockCipherParam,
    stats: CallStats,
}

impl SoftToken {
    pub fn new() -> Self {
        Self::with_pin(Pin::default())
    }

    pub fn with_pin(user_pin: Pin) -> Self {
        Self {
            user_pin,
            admin_pin: Pin::from_str("12345678").unwrap(),
            retries_left: PIN_RETRIES,
            logged_in: false,
            containers: BTreeMap::new(),
            open_containers: HashMap::new(),
            session_keys: HashMap::new(),
            next_handle: 1,
            faults: HashMap::new(),
            corrupt_import: false,
            corrupt_export: None,
            import_param: BlockCipherParam::default(),
            stats: CallStats::default(),
        }
    }

    /// Make every later `call` fail with status `code`
    pub fn fail_on(&mut self, call: Call, code: u32) {
        self.faults.insert(call, code);
    }

    pub fn clear_fault(&mut self, call: Call) {
        self.faults.remove(&call);
    }

    /// Install the signing key in place of whatever the next imports carry
    pub fn corrupt_import(&mut self) {
        self.corrupt_import = true;
    }

    /// Hand out a zero modulus for keys of `usage`, on generate and export
    pub fn corrupt_export(&mut self, usage: KeyUsage) {
        self.corrupt_export = Some(usage);
    }

    /// Container with ECC type and no RSA keys
    pub fn add_ecc_container(&mut self, name: &str) {
        let mut container = SoftContainer::empty();
        container.container_type = ContainerType::Ecc;
        self.containers.insert(name.to_string(), container);
    }

    pub fn container_names(&self) -> Vec<String> {
        self.containers.keys().cloned().collect()
    }

    pub fn stats(&self) -> CallStats {
        self.stats
    }

    /// No container or session key handle is left open
    pub fn handles_balanced(&self) -> bool {
        self.open_containers.is_empty() && self.session_keys.is_empty()
    }

    pub fn retries_left(&self) -> u32 {
        self.retries_left
    }

    pub fn log_out(&mut self) {
        self.logged_in = false;
    }

    fn check(&self, call: Call) -> DriverResult<()> {
        match self.faults.get(&call) {
            Some(code) => Err(DriverError::new(*code, format!("injected failure in {call:?}"))),
            None => Ok(()),
        }
    }

    fn require_login(&self) -> DriverResult<()> {
        if self.logged_in {
            Ok(())
        } else {
            Err(DriverError::new(sar::USER_NOT_LOGGED_IN, "PIN not verified"))
        }
    }

    fn issue_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn container(&self, handle: ContainerHandle) -> DriverResult<&SoftContainer> {
        self.open_containers
            .get(&handle.0)
            .and_then(|name| self.containers.get(name))
            .ok_or_else(|| DriverError::new(sar::INVALID_HANDLE, "unknown container handle"))
    }

    fn container_mut(&mut self, handle: ContainerHandle) -> DriverResult<&mut SoftContainer> {
        let name = self
            .open_containers
            .get(&handle.0)
            .ok_or_else(|| DriverError::new(sar::INVALID_HANDLE, "unknown container handle"))?;
        self.containers
            .get_mut(name)
            .ok_or_else(|| DriverError::new(sar::INVALID_HANDLE, "container was removed"))
    }

    fn session_key(&mut self, handle: SessionKeyHandle) -> DriverResult<&mut SoftSessionKey> {
        self.session_keys
            .get_mut(&handle.0)
            .ok_or_else(|| DriverError::new(sar::INVALID_HANDLE, "unknown session key handle"))
    }
}

impl Default for SoftToken {
    fn default() -> Self {
        Self::new()
    }
}

fn left_pad(bytes: Vec<u8>, len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        return bytes;
    }
    let mut padded = vec![0u8; len - bytes.len()];
    padded.extend_from_slice(&bytes);
    padded
}

fn to_blob(key: &RsaPrivateKey) -> RsaPublicKeyBlob {
    RsaPublicKeyBlob::new(
        (key.size() * 8) as u32,
        left_pad(key.n().to_bytes_be(), MAX_RSA_MODULUS_LEN),
        left_pad(key.e().to_bytes_be(), MAX_RSA_EXPONENT_LEN),
    )
}

fn zero_modulus(mut blob: RsaPublicKeyBlob) -> RsaPublicKeyBlob {
    blob.modulus.iter_mut().for_each(|b| *b = 0);
    blob
}

fn from_blob(blob: &RsaPublicKeyBlob) -> DriverResult<RsaPublicKey> {
    RsaPublicKey::new(
        BigUint::from_bytes_be(&blob.modulus),
        BigUint::from_bytes_be(&blob.public_exponent),
    )
    .map_err(|e| DriverError::new(sar::INVALID_PARAM, e.to_string()))
}

fn is_cbc(algorithm: SymmetricAlgorithm) -> bool {
    matches!(
        algorithm,
        SymmetricAlgorithm::Sm1Cbc | SymmetricAlgorithm::Ssf33Cbc | SymmetricAlgorithm::Sm4Cbc
    )
}

fn cbc_iv(param: &BlockCipherParam) -> [u8; 16] {
    let mut iv = [0u8; 16];
    let len = param.iv_len().min(16);
    iv[..len].copy_from_slice(&param.iv()[..len]);
    iv
}

impl PinVerifier for SoftToken {
    fn verify_pin(&mut self, user_type: UserType, pin: &Pin) -> DriverResult<()> {
        self.check(Call::VerifyPin)?;
        if self.retries_left == 0 {
            return Err(DriverError::new(sar::PIN_LOCKED, "PIN locked"));
        }

        let expected = match user_type {
            UserType::Admin => &self.admin_pin,
            UserType::User => &self.user_pin,
        };
        if pin.as_bytes() == expected.as_bytes() {
            self.retries_left = PIN_RETRIES;
            self.logged_in = true;
            return Ok(());
        }

        self.retries_left -= 1;
        if self.retries_left == 0 {
            Err(DriverError::new(sar::PIN_LOCKED, "PIN locked"))
        } else {
            Err(DriverError::new(
                sar::PIN_INCORRECT,
                format!("wrong PIN, {} retries left", self.retries_left),
            ))
        }
    }
}

impl ContainerManager for SoftToken {
    fn enum_containers(&mut self) -> DriverResult<Vec<String>> {
        self.check(Call::EnumContainer)?;
        if self.containers.is_empty() {
            return Err(DriverError::no_container("application holds no containers"));
        }
        Ok(self.container_names())
    }

    fn open_container(&mut self, name: &str) -> DriverResult<ContainerHandle> {
        self.check(Call::OpenContainer)?;
        if !self.containers.contains_key(name) {
            return Err(DriverError::no_container(format!("no container {name}")));
        }
        let handle = self.issue_handle();
        self.open_containers.insert(handle, name.to_string());
        self.stats.containers_opened += 1;
        Ok(ContainerHandle(handle))
    }

    fn create_container(&mut self, name: &str) -> DriverResult<ContainerHandle> {
        self.check(Call::CreateContainer)?;
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(DriverError::new(sar::NAME_LEN, "bad container name length"));
        }
        if self.containers.contains_key(name) {
            return Err(DriverError::new(
                sar::FILE_ALREADY_EXIST,
                format!("container {name} already exists"),
            ));
        }
        self.containers
            .insert(name.to_string(), SoftContainer::empty());
        let handle = self.issue_handle();
        self.open_containers.insert(handle, name.to_string());
        self.stats.containers_created += 1;
        self.stats.containers_opened += 1;
        Ok(ContainerHandle(handle))
    }

    fn close_container(&mut self, handle: ContainerHandle) -> DriverResult<()> {
        self.check(Call::CloseContainer)?;
        self.open_containers
            .remove(&handle.0)
            .ok_or_else(|| DriverError::new(sar::INVALID_HANDLE, "unknown container handle"))?;
        self.stats.containers_closed += 1;
        Ok(())
    }

    fn container_type(&mut self, handle: ContainerHandle) -> DriverResult<ContainerType> {
        self.check(Call::GetContainerType)?;
        Ok(self.container(handle)?.container_type)
    }
}

impl RandomSource for SoftToken {
    fn gen_random(&mut self, len: usize) -> DriverResult<Vec<u8>> {
        self.check(Call::GenRandom)?;
        let mut buf = vec![0u8; len];
        rand::rng().fill_bytes(&mut buf);
        Ok(buf)
    }
}

impl SessionCipher for SoftToken {
    fn set_symm_key(
        &mut self,
        key: &[u8],
        algorithm: SymmetricAlgorithm,
    ) -> DriverResult<SessionKeyHandle> {
        self.check(Call::SetSymmKey)?;
        if !is_cbc(algorithm) {
            return Err(DriverError::new(
                sar::INVALID_PARAM,
                format!("{algorithm:?} not emulated"),
            ));
        }
        if key.len() != SESSION_KEY_LEN {
            return Err(DriverError::new(sar::INVALID_PARAM, "session key must be 16 bytes"));
        }

        let handle = self.issue_handle();
        self.session_keys.insert(
            handle,
            SoftSessionKey {
                key: Zeroizing::new(key.to_vec()),
                param: None,
            },
        );
        self.stats.session_keys_opened += 1;
        Ok(SessionKeyHandle(handle))
    }

    fn encrypt_init(
        &mut self,
        handle: SessionKeyHandle,
        param: &BlockCipherParam,
    ) -> DriverResult<()> {
        self.check(Call::EncryptInit)?;
        self.session_key(handle)?.param = Some(param.clone());
        // the next import unwraps with the same IV and padding
        self.import_param = param.clone();
        Ok(())
    }

    fn encrypt(&mut self, handle: SessionKeyHandle, plaintext: &[u8]) -> DriverResult<Vec<u8>> {
        self.check(Call::Encrypt)?;
        let session = self.session_key(handle)?;
        let param = session
            .param
            .take()
            .ok_or_else(|| DriverError::new(sar::FAIL, "encrypt called before encrypt_init"))?;

        let cipher = Aes128CbcEnc::new_from_slices(&session.key, &cbc_iv(&param))
            .map_err(|e| DriverError::new(sar::INVALID_PARAM, e.to_string()))?;
        if param.is_padded() {
            Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
        } else if plaintext.len() % 16 == 0 {
            Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(plaintext))
        } else {
            Err(DriverError::new(sar::IN_DATA, "unpadded input not block aligned"))
        }
    }

    fn close_handle(&mut self, handle: SessionKeyHandle) -> DriverResult<()> {
        self.check(Call::CloseHandle)?;
        self.session_keys
            .remove(&handle.0)
            .ok_or_else(|| DriverError::new(sar::INVALID_HANDLE, "unknown session key handle"))?;
        self.stats.session_keys_closed += 1;
        Ok(())
    }
}

impl RsaOperations for SoftToken {
    fn gen_rsa_key_pair(
        &mut self,
        container: ContainerHandle,
        bits: u32,
    ) -> DriverResult<RsaPublicKeyBlob> {
        self.check(Call::GenRsaKeyPair)?;
        self.require_login()?;
        if bits != 1024 && bits != 2048 {
            return Err(DriverError::new(
                sar::MODULUS_LEN,
                format!("unsupported modulus length {bits}"),
            ));
        }

        let corrupt = self.corrupt_export == Some(KeyUsage::Sign);
        let container = self.container_mut(container)?;
        if container.container_type == ContainerType::Ecc {
            return Err(DriverError::new(sar::FAIL, "container holds ECC keys"));
        }
        let key = RsaPrivateKey::new(&mut OsRng, bits as usize)
            .map_err(|e| DriverError::new(sar::FAIL, e.to_string()))?;
        let blob = to_blob(&key);
        container.sign_key = Some(key);
        container.container_type = ContainerType::Rsa;
        Ok(if corrupt { zero_modulus(blob) } else { blob })
    }

    fn export_public_key(
        &mut self,
        container: ContainerHandle,
        usage: KeyUsage,
    ) -> DriverResult<RsaPublicKeyBlob> {
        self.check(Call::ExportPublicKey)?;
        let corrupt = self.corrupt_export == Some(usage);
        let container = self.container(container)?;
        let key = match usage {
            KeyUsage::Sign => container.sign_key.as_ref(),
            KeyUsage::Encrypt => container.enc_key.as_ref(),
        };
        let blob = key
            .map(to_blob)
            .ok_or_else(|| DriverError::new(sar::KEY_NOT_FOUND, format!("no {usage:?} key")))?;
        Ok(if corrupt { zero_modulus(blob) } else { blob })
    }

    fn ext_rsa_pub_key_operation(
        &mut self,
        public_key: &RsaPublicKeyBlob,
        data: &[u8],
    ) -> DriverResult<Vec<u8>> {
        self.check(Call::ExtRsaPubKeyOperation)?;
        from_blob(public_key)?
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, data)
            .map_err(|e| DriverError::new(sar::FAIL, e.to_string()))
    }

    fn import_rsa_key_pair(
        &mut self,
        container: ContainerHandle,
        algorithm: SymmetricAlgorithm,
        wrapped_key: &[u8],
        encrypted_private_key: &[u8],
    ) -> DriverResult<()> {
        self.check(Call::ImportRsaKeyPair)?;
        self.require_login()?;
        if !is_cbc(algorithm) {
            return Err(DriverError::new(
                sar::INVALID_PARAM,
                format!("{algorithm:?} not emulated"),
            ));
        }
        let corrupt = self.corrupt_import;
        let param = self.import_param.clone();
        let container = self.container_mut(container)?;
        let sign_key = container
            .sign_key
            .clone()
            .ok_or_else(|| DriverError::new(sar::KEY_NOT_FOUND, "no signing key to unwrap with"))?;

        let session_key = Zeroizing::new(
            sign_key
                .decrypt(Pkcs1v15Encrypt, wrapped_key)
                .map_err(|e| DriverError::new(sar::RSA_DEC, e.to_string()))?,
        );
        let cipher = Aes128CbcDec::new_from_slices(&session_key, &cbc_iv(&param))
            .map_err(|e| DriverError::new(sar::RSA_DEC, e.to_string()))?;
        let der = Zeroizing::new(
            if param.is_padded() {
                cipher.decrypt_padded_vec_mut::<Pkcs7>(encrypted_private_key)
            } else {
                cipher.decrypt_padded_vec_mut::<NoPadding>(encrypted_private_key)
            }
            .map_err(|e| DriverError::new(sar::IN_DATA, e.to_string()))?,
        );
        let key = RsaPrivateKey::from_pkcs1_der(&der)
            .or_else(|_| RsaPrivateKey::from_pkcs8_der(&der))
            .map_err(|e| DriverError::new(sar::IN_DATA, e.to_string()))?;

        container.enc_key = Some(if corrupt { sign_key } else { key });
        container.container_type = ContainerType::Rsa;
        Ok(())
    }

    fn rsa_sign_data(
        &mut self,
        container: ContainerHandle,
        digest: &[u8],
    ) -> DriverResult<Vec<u8>> {
        self.check(Call::RsaSignData)?;
        self.require_login()?;
        let key = self
            .container(container)?
            .sign_key
            .as_ref()
            .ok_or_else(|| DriverError::new(sar::KEY_NOT_FOUND, "no signing key"))?;
        key.sign(Pkcs1v15Sign::new_unprefixed(), digest)
            .map_err(|e| DriverError::new(sar::FAIL, e.to_string()))
    }

    fn rsa_verify(
        &mut self,
        public_key: &RsaPublicKeyBlob,
        digest: &[u8],
        signature: &[u8],
    ) -> DriverResult<bool> {
        self.check(Call::RsaVerify)?;
        let key = from_blob(public_key)?;
        Ok(key
            .verify(Pkcs1v15Sign::new_unprefixed(), digest, signature)
            .is_ok())
    }
}

/// Route `tracing` output of the code under test to the test harness
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_tests_for;
    use crate::ports::contract_tests::device_contract;

    contract_tests_for!(
        soft_token_contract,
        make = SoftToken::new,
        tests = {
            test_pin_verification_success => device_contract::test_pin_verification_success,
            test_pin_verification_failure => device_contract::test_pin_verification_failure,
            test_empty_application_signals_no_container => device_contract::test_empty_application_signals_no_container,
            test_create_duplicate_fails => device_contract::test_create_duplicate_fails,
            test_generate_requires_login => device_contract::test_generate_requires_login,
            test_generate_and_export_match => device_contract::test_generate_and_export_match,
            test_export_missing_key => device_contract::test_export_missing_key,
            test_sign_and_verify => device_contract::test_sign_and_verify,
            test_session_key_handles_close => device_contract::test_session_key_handles_close,
        }
    );

    #[test]
    fn test_pin_locks_after_retries() {
        let mut token = SoftToken::new();
        let wrong = Pin::from_str("000000").unwrap();

        let first = token.verify_pin(UserType::User, &wrong).unwrap_err();
        assert_eq!(first.code, sar::PIN_INCORRECT);
        token.verify_pin(UserType::User, &wrong).unwrap_err();
        let last = token.verify_pin(UserType::User, &wrong).unwrap_err();
        assert_eq!(last.code, sar::PIN_LOCKED);

        let locked = token.verify_pin(UserType::User, &Pin::default()).unwrap_err();
        assert_eq!(locked.code, sar::PIN_LOCKED);
    }

    #[test]
    fn test_correct_pin_resets_retries() {
        let mut token = SoftToken::new();
        let wrong = Pin::from_str("000000").unwrap();
        token.verify_pin(UserType::User, &wrong).unwrap_err();
        assert_eq!(token.retries_left(), PIN_RETRIES - 1);

        token.verify_pin(UserType::User, &Pin::default()).unwrap();
        assert_eq!(token.retries_left(), PIN_RETRIES);
    }

    #[test]
    fn test_injected_fault_is_reported() {
        let mut token = SoftToken::new();
        token.fail_on(Call::GenRandom, sar::FAIL);
        assert_eq!(token.gen_random(16).unwrap_err().code, sar::FAIL);

        token.clear_fault(Call::GenRandom);
        assert_eq!(token.gen_random(16).unwrap().len(), 16);
    }

    #[test]
    fn test_unsupported_modulus_length() {
        let mut token = SoftToken::new();
        token.verify_pin(UserType::User, &Pin::default()).unwrap();
        let handle = token.create_container("c").unwrap();

        let err = token.gen_rsa_key_pair(handle, 1536).unwrap_err();
        assert_eq!(err.code, sar::MODULUS_LEN);
    }

    #[test]
    fn test_exported_blob_is_fixed_width() {
        let mut token = SoftToken::new();
        token.verify_pin(UserType::User, &Pin::default()).unwrap();
        let handle = token.create_container("c").unwrap();

        let blob = token.gen_rsa_key_pair(handle, 1024).unwrap();
        assert_eq!(blob.bit_len, 1024);
        assert_eq!(blob.modulus.len(), MAX_RSA_MODULUS_LEN);
        assert_eq!(blob.public_exponent, vec![0, 1, 0, 1]);
        assert!(blob.modulus[..128].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_corrupt_export_zeroes_modulus() {
        let mut token = SoftToken::new();
        token.verify_pin(UserType::User, &Pin::default()).unwrap();
        token.corrupt_export(KeyUsage::Sign);
        let handle = token.create_container("c").unwrap();

        let generated = token.gen_rsa_key_pair(handle, 1024).unwrap();
        let exported = token.export_public_key(handle, KeyUsage::Sign).unwrap();

        assert!(generated.modulus.iter().all(|b| *b == 0));
        assert!(exported.modulus.iter().all(|b| *b == 0));
        assert_eq!(exported.public_exponent, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_ecb_session_keys_rejected() {
        let mut token = SoftToken::new();
        let err = token
            .set_symm_key(&[0u8; 16], SymmetricAlgorithm::Sm4Ecb)
            .unwrap_err();
        assert_eq!(err.code, sar::INVALID_PARAM);
        assert!(token.handles_balanced());
    }
}
