use std::{
    fmt::{self, Debug},
    sync::Arc,
};

use rustls::{
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider},
    pki_types::{self, UnixTime},
    server::ParsedCertificate,
    ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};

use crate::smtp::error::{self, Error};

/// Parameters to use for secure clients
#[derive(Clone)]
pub struct TlsParameters {
    pub(crate) connector: Arc<ClientConfig>,
    pub(crate) server_name: pki_types::ServerName<'static>,
    domain: Box<str>,
}

impl TlsParameters {
    /// Creates a new `TlsParameters` using the default options, trusting the
    /// webpki root certificates
    pub fn new(domain: String) -> Result<Self, Error> {
        TlsParametersBuilder::new(domain).build()
    }

    /// Creates a new `TlsParameters` builder
    pub fn builder(domain: String) -> TlsParametersBuilder {
        TlsParametersBuilder::new(domain)
    }

    /// The domain name which is expected in the TLS certificate from the server
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Debug for TlsParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsParameters")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Builder for `TlsParameters`
#[derive(Debug, Clone)]
pub struct TlsParametersBuilder {
    domain: String,
    root_certs: Vec<Certificate>,
    accept_invalid_certs: bool,
}

impl TlsParametersBuilder {
    /// Creates a new builder for `TlsParameters`
    pub fn new(domain: String) -> Self {
        Self {
            domain,
            root_certs: Vec::new(),
            accept_invalid_certs: false,
        }
    }

    /// Add a custom root certificate
    ///
    /// Can be used to safely connect to a server using a self-signed certificate, for example.
    pub fn add_root_certificate(mut self, cert: Certificate) -> Self {
        self.root_certs.push(cert);
        self
    }

    /// Controls whether invalid certificates are accepted
    ///
    /// Defaults to `false`.
    ///
    /// # Warning
    ///
    /// You should think very carefully before using this method.
    /// If invalid certificates are trusted, *any* certificate for
    /// *any* site will be trusted for use, including expired certificates.
    /// This introduces significant vulnerabilities, and should only be used
    /// as a last resort.
    pub fn dangerous_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    /// Creates a new `TlsParameters` using rustls with the provided configuration
    pub fn build(self) -> Result<TlsParameters, Error> {
        let crypto_provider = Arc::new(crate::rustls_crypto::crypto_provider());
        let tls = ClientConfig::builder_with_provider(Arc::clone(&crypto_provider))
            .with_safe_default_protocol_versions()
            .map_err(error::tls)?;

        let mut root_cert_store = RootCertStore::empty();
        root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        for cert in self.root_certs {
            root_cert_store.add(cert.0).map_err(error::tls)?;
        }

        let tls = if self.accept_invalid_certs {
            tls.dangerous()
                .with_custom_certificate_verifier(Arc::new(InvalidCertsVerifier { crypto_provider }))
        } else {
            tls.with_root_certificates(root_cert_store)
        };
        let tls = tls.with_no_client_auth();

        let server_name = pki_types::ServerName::try_from(self.domain.as_str())
            .map_err(error::tls)?
            .to_owned();

        Ok(TlsParameters {
            connector: Arc::new(tls),
            server_name,
            domain: self.domain.into_boxed_str(),
        })
    }
}

/// A certificate that can be used with [`TlsParametersBuilder::add_root_certificate`]
#[derive(Clone)]
pub struct Certificate(pki_types::CertificateDer<'static>);

impl Certificate {
    /// Create a `Certificate` from a DER encoded certificate
    pub fn from_der(der: Vec<u8>) -> Self {
        Self(der.into())
    }

    /// Create a `Certificate` from a PEM encoded certificate
    pub fn from_pem(pem: &[u8]) -> Result<Self, Error> {
        use rustls::pki_types::pem::PemObject as _;

        Ok(Self(
            pki_types::CertificateDer::from_pem_slice(pem)
                .map_err(|_| error::tls("invalid certificate"))?,
        ))
    }
}

impl Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate").finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct InvalidCertsVerifier {
    crypto_provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for InvalidCertsVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &pki_types::CertificateDer<'_>,
        _intermediates: &[pki_types::CertificateDer<'_>],
        _server_name: &pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        ParsedCertificate::try_from(end_entity)?;
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &pki_types::CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.crypto_provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &pki_types::CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.crypto_provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.crypto_provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod test {
    use super::{Certificate, TlsParameters};

    #[test]
    fn builds_for_a_domain() {
        let parameters = TlsParameters::new("smtp.example.com".to_owned()).unwrap();
        assert_eq!(parameters.domain(), "smtp.example.com");
    }

    #[test]
    fn trusts_a_custom_root() {
        let cert =
            Certificate::from_pem(include_bytes!("../../../tests/fixtures/localhost.crt")).unwrap();
        let parameters = TlsParameters::builder("127.0.0.1".to_owned())
            .add_root_certificate(cert)
            .build()
            .unwrap();
        assert_eq!(parameters.domain(), "127.0.0.1");
    }

    #[test]
    fn invalid_certs_can_be_accepted() {
        let parameters = TlsParameters::builder("localhost".to_owned())
            .dangerous_accept_invalid_certs(true)
            .build()
            .unwrap();
        assert_eq!(parameters.domain(), "localhost");
    }

    #[test]
    fn rejects_garbage_pem() {
        assert!(Certificate::from_pem(b"not a certificate").unwrap_err().is_tls());
    }
}
