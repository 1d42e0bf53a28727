//! TLS versions and client configuration for the raw client.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme, SupportedProtocolVersion};

use crate::http::VersionError;

/// Minimum TLS version a client accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

const TLS_VERSIONS: &[(&str, TlsVersion)] = &[
    ("1.0", TlsVersion::Tls10),
    ("1.1", TlsVersion::Tls11),
    ("1.2", TlsVersion::Tls12),
    ("1.3", TlsVersion::Tls13),
];

impl TlsVersion {
    pub fn from_name(name: &str) -> Result<TlsVersion, VersionError> {
        TLS_VERSIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| VersionError::UnsupportedTls(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            TlsVersion::Tls10 => "1.0",
            TlsVersion::Tls11 => "1.1",
            TlsVersion::Tls12 => "1.2",
            TlsVersion::Tls13 => "1.3",
        }
    }

    /// Protocol versions rustls may negotiate. Only 1.2 and 1.3 exist there,
    /// so older minimums behave like 1.2.
    fn protocol_versions(&self) -> &'static [&'static SupportedProtocolVersion] {
        match self {
            TlsVersion::Tls13 => TLS13_ONLY,
            _ => rustls::ALL_VERSIONS,
        }
    }
}

/// Builds the rustls configuration for `https` targets.
pub fn client_config(min_version: TlsVersion, insecure: bool) -> Result<Arc<ClientConfig>, rustls::Error> {
    if min_version < TlsVersion::Tls12 {
        tracing::warn!(
            requested = min_version.name(),
            "TLS versions below 1.2 are not supported, negotiating 1.2 or newer"
        );
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(min_version.protocol_versions())?;

    let config = if insecure {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots).with_no_client_auth()
    };

    Ok(Arc::new(config))
}

/// Skips certificate validation (`--insecure`). Handshake signatures are
/// still checked so the session keys belong to the presented certificate.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_version_table() {
        assert_eq!(TlsVersion::from_name("1.3"), Ok(TlsVersion::Tls13));
        assert_eq!(TlsVersion::from_name("1.0"), Ok(TlsVersion::Tls10));
        assert_eq!(
            TlsVersion::from_name("1.4"),
            Err(VersionError::UnsupportedTls("1.4".to_string()))
        );
    }

    #[test]
    fn builds_verifying_and_insecure_configs() {
        assert!(client_config(TlsVersion::Tls12, false).is_ok());
        assert!(client_config(TlsVersion::Tls13, true).is_ok());
        assert!(client_config(TlsVersion::Tls10, false).is_ok());
    }
}
