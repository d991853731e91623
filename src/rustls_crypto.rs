pub(crate) use rustls::crypto::ring::default_provider as crypto_provider;
