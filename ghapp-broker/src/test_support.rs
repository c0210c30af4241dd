//! Shared helpers for unit tests

use crate::signer::Clock;
use rand::rngs::OsRng;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;

pub(crate) struct TestKeypair {
    pub private_pem: String,
    pub public_pem: String,
    pub pkcs8_pem: String,
}

/// A freshly generated RSA key pair, shared by every test in the crate
pub(crate) fn test_keypair() -> &'static TestKeypair {
    static KEYPAIR: OnceLock<TestKeypair> = OnceLock::new();
    KEYPAIR.get_or_init(|| {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation failed");
        TestKeypair {
            private_pem: private_key
                .to_pkcs1_pem(LineEnding::LF)
                .expect("private key PEM export failed")
                .to_string(),
            public_pem: private_key
                .to_public_key()
                .to_pkcs1_pem(LineEnding::LF)
                .expect("public key PEM export failed"),
            pkcs8_pem: private_key
                .to_pkcs8_pem(LineEnding::LF)
                .expect("PKCS#8 export failed")
                .to_string(),
        }
    })
}

pub(crate) struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        self.0
    }
}

pub(crate) struct SteppingClock {
    now: AtomicI64,
}

impl SteppingClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for SteppingClock {
    fn now_secs(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
