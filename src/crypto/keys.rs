//! Key material generation and persisted forms
//! Author: kartik4091
//! Created: 2025-06-04

use std::fmt;

use openssl::asn1::Asn1Object;
use openssl::ec::{EcGroup, EcKey};
use openssl::pkey::{PKey, Private};

use crate::error::{Error, Result};
use crate::utils::encoding;

use super::provider::ensure_registered;

/// Looks up the domain parameters of a named curve.
pub fn resolve_curve(name: &str) -> Result<EcGroup> {
    ensure_registered();
    let nid = Asn1Object::from_str(name)
        .map_err(|e| Error::KeyGeneration(format!("Unknown curve {}: {}", name, e)))?
        .nid();
    EcGroup::from_curve_name(nid)
        .map_err(|e| Error::KeyGeneration(format!("Curve parameters unavailable for {}: {}", name, e)))
}

/// An EC key pair. The private half is exported unencrypted.
#[derive(Clone)]
pub struct KeyMaterial {
    key: PKey<Private>,
}

impl KeyMaterial {
    /// Generates a fresh key pair on the named curve.
    pub fn generate(curve: &str) -> Result<Self> {
        let group = resolve_curve(curve)?;
        let ec_key = EcKey::generate(&group)
            .map_err(|e| Error::KeyGeneration(format!("Failed to generate EC keypair: {}", e)))?;
        let key = PKey::from_ec_key(ec_key)
            .map_err(|e| Error::KeyGeneration(format!("Failed to create private key: {}", e)))?;
        Ok(Self { key })
    }

    /// Decodes a PKCS#8 DER private key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        ensure_registered();
        let key = PKey::private_key_from_pkcs8(der)
            .map_err(|e| Error::Signing(format!("Failed to decode private key: {}", e)))?;
        Ok(Self { key })
    }

    /// Decodes a Base64 PKCS#8 DER private key.
    pub fn from_base64(text: &str) -> Result<Self> {
        let der = encoding::decode(text, "Private key", Error::Signing)?;
        Self::from_pkcs8_der(&der)
    }

    pub fn private_key_pkcs8_der(&self) -> Result<Vec<u8>> {
        self.key
            .private_key_to_pkcs8()
            .map_err(|e| Error::KeyGeneration(format!("Failed to encode private key: {}", e)))
    }

    pub fn private_key_base64(&self) -> Result<String> {
        Ok(encoding::encode(&self.private_key_pkcs8_der()?))
    }

    /// SubjectPublicKeyInfo DER of the public half.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        self.key
            .public_key_to_der()
            .map_err(|e| Error::KeyGeneration(format!("Failed to encode public key: {}", e)))
    }

    pub fn pkey(&self) -> &PKey<Private> {
        &self.key
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("bits", &self.key.bits())
            .field("private", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_reload_pkcs8() {
        let key = KeyMaterial::generate("prime256v1").unwrap();
        let der = key.private_key_pkcs8_der().unwrap();
        let reloaded = KeyMaterial::from_pkcs8_der(&der).unwrap();
        assert_eq!(key.public_key_der().unwrap(), reloaded.public_key_der().unwrap());
    }

    #[test]
    fn test_base64_form() {
        let key = KeyMaterial::generate("prime256v1").unwrap();
        let text = key.private_key_base64().unwrap();
        let reloaded = KeyMaterial::from_base64(&text).unwrap();
        assert_eq!(key.public_key_der().unwrap(), reloaded.public_key_der().unwrap());
    }

    #[test]
    fn test_unknown_curve_is_key_generation_error() {
        let err = KeyMaterial::generate("definitely-not-a-curve").unwrap_err();
        assert!(matches!(err, Error::KeyGeneration(_)));
    }

    #[test]
    fn test_garbage_key_is_signing_error() {
        assert!(matches!(KeyMaterial::from_base64("@@@"), Err(Error::Signing(_))));
        assert!(matches!(KeyMaterial::from_pkcs8_der(b"junk"), Err(Error::Signing(_))));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let key = KeyMaterial::generate("prime256v1").unwrap();
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("<redacted>"));
    }
}
