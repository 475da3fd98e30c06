//! TLS configuration for the local endpoints.
//!
//! Both local APIs serve a self-signed certificate on `127.0.0.1`. The
//! verifier below accepts any certificate chain but still checks handshake
//! signatures with the provider's algorithms, so the session is encrypted
//! and the peer must hold the key of the certificate it presents.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};

use crate::error::{Error, Result};

// ============================================================================
// AcceptLocalCertificate
// ============================================================================

/// Certificate verifier that trusts whatever the local process presents.
#[derive(Debug)]
struct AcceptLocalCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptLocalCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Builds a rustls client config that accepts the local self-signed certificate.
///
/// # Errors
///
/// Returns [`Error::Connection`] if the provider rejects the default
/// protocol versions.
pub fn local_client_config() -> Result<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::connection(format!("TLS setup failed: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptLocalCertificate { provider }))
        .with_no_client_auth();

    Ok(Arc::new(config))
}

// ============================================================================
// Tests
// ============================================================================
