// INICIO DEL ARCHIVO [libs/core/secret-vault/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CRYPTOGRAPHIC VAULT ENGINE (V3.4 - SEALED STRATA)
 * CLASIFICACIÓN: CORE SECURITY (ESTRATO L1)
 * RESPONSABILIDAD: CIFRADO AUTENTICADO DE CREDENCIALES EN REPOSO
 *
 * VISION HIPER-HOLÍSTICA:
 * Implementa el túnel simétrico AES-256-GCM del plano de control.
 * La llave maestra se transforma una única vez mediante PBKDF2 y
 * reside exclusivamente en la memoria del proceso. El material
 * cifrado es auto-descriptivo (algoritmo, nonce y tag embebidos)
 * y transportable por JSON sin re-codificación.
 * =================================================================
 */

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    /// El material recibido no es un sobre de bóveda válido.
    #[error("ENVELOPE_MALFORMATION: {0}")]
    MalformedEnvelope(String),
    /// Fallo de decodificación Base64 en algún segmento del sobre.
    #[error("BASE64_DECODE_FAULT: {0}")]
    EncodingError(#[from] base64::DecodeError),
    /// Verificación de integridad fallida o llave maestra incorrecta.
    /// Nunca se devuelve texto plano parcial.
    #[error("BAD_CIPHERTEXT: Integrity compromised or incorrect Master Key")]
    BadCiphertext,
}

/// Identificador nominal del algoritmo sellado en cada sobre.
const VAULT_ALGORITHM_IDENTIFIER: &str = "AES-256-GCM";

/// Sobre auto-descriptivo que viaja como columna TEXT del Ledger.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EncryptedSecretEnvelope {
    pub algorithm: String,
    pub nonce_base64: String,
    pub cipher_text_base64: String,
}

/// Motor de bóveda con llave derivada residente en memoria de proceso.
pub struct SecretVault {
    cipher_engine: Aes256Gcm,
}

impl SecretVault {
    /// Iteraciones de endurecimiento PBKDF2-HMAC-SHA256.
    const PBKDF2_ITERATIONS: u32 = 150_000;
    const KEY_LENGTH_BYTES: usize = 32;
    /// Sal de dominio determinista: aísla esta derivación de cualquier
    /// otro consumidor de la misma llave maestra.
    const DOMAIN_SALT: &'static str = "vigil_vault_strata_v1";

    /**
     * Forja el motor de bóveda derivando la llave simétrica de la
     * frase maestra del proceso.
     *
     * # Mathematical Proof:
     * PBKDF2-HMAC-SHA256 transforma la frase maestra en una llave de
     * 256 bits; la misma frase produce siempre la misma llave, por lo
     * que el material cifrado sobrevive a reinicios del proceso.
     */
    pub fn from_master_key(master_key: &str) -> Self {
        let mut derived_key_buffer = [0u8; Self::KEY_LENGTH_BYTES];
        pbkdf2_hmac::<Sha256>(
            master_key.as_bytes(),
            Self::DOMAIN_SALT.as_bytes(),
            Self::PBKDF2_ITERATIONS,
            &mut derived_key_buffer,
        );

        let key = Key::<Aes256Gcm>::from_slice(&derived_key_buffer);

        Self {
            cipher_engine: Aes256Gcm::new(key),
        }
    }

    /**
     * Sella un valor en texto plano dentro de un sobre autenticado.
     *
     * # Returns:
     * Sobre serializado como JSON compacto, apto para columnas TEXT
     * y transporte por APIs JSON.
     */
    pub fn encrypt(&self, plaintext_value: &str) -> Result<String, VaultError> {
        // 1. GENERACIÓN DE NONCE ÚNICO (96 bits, CSPRNG del sistema)
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // 2. EJECUCIÓN DEL SELLADO CON TAG DE AUTENTICACIÓN
        let cipher_text = self
            .cipher_engine
            .encrypt(&nonce, plaintext_value.as_bytes())
            .map_err(|_| VaultError::BadCiphertext)?;

        let envelope = EncryptedSecretEnvelope {
            algorithm: VAULT_ALGORITHM_IDENTIFIER.to_string(),
            nonce_base64: BASE64.encode(nonce),
            cipher_text_base64: BASE64.encode(cipher_text),
        };

        serde_json::to_string(&envelope)
            .map_err(|fault| VaultError::MalformedEnvelope(fault.to_string()))
    }

    /**
     * Abre un sobre autenticado y recupera el texto plano original.
     *
     * # Errors:
     * - `MalformedEnvelope`: El JSON no describe un sobre de bóveda.
     * - `BadCiphertext`: Tag de autenticación inválido, nonce mutado
     *   o llave maestra divergente. Jamás se filtra plano parcial.
     */
    pub fn decrypt(&self, sealed_envelope_json: &str) -> Result<String, VaultError> {
        // 1. RECONSTRUCCIÓN DEL SOBRE AUTO-DESCRIPTIVO
        let envelope: EncryptedSecretEnvelope = serde_json::from_str(sealed_envelope_json)
            .map_err(|fault| VaultError::MalformedEnvelope(fault.to_string()))?;

        if envelope.algorithm != VAULT_ALGORITHM_IDENTIFIER {
            return Err(VaultError::MalformedEnvelope(format!(
                "UNSUPPORTED_ALGORITHM: {}",
                envelope.algorithm
            )));
        }

        // 2. ADQUISICIÓN DE BUFFERS BINARIOS
        let cipher_text = BASE64.decode(&envelope.cipher_text_base64)?;
        let nonce_material = BASE64.decode(&envelope.nonce_base64)?;

        if nonce_material.len() != 12 {
            return Err(VaultError::BadCiphertext);
        }

        let nonce = Nonce::from_slice(&nonce_material);

        // 3. DESCIFRADO CON VERIFICACIÓN DE INTEGRIDAD (Auth Tag)
        let decrypted_bytes = self
            .cipher_engine
            .decrypt(nonce, cipher_text.as_ref())
            .map_err(|_| VaultError::BadCiphertext)?;

        String::from_utf8(decrypted_bytes).map_err(|_| VaultError::BadCiphertext)
    }
}

// FIN DEL ARCHIVO [libs/core/secret-vault/src/lib.rs]
