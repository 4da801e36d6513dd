//! Detached PKCS#7 signature over the pass manifest
//!
//! The signature is a DER `ContentInfo` wrapping CMS `SignedData` with no
//! encapsulated content. Its single signer info signs the content-type,
//! message-digest and signing-time attributes with the signer's RSA key
//! (PKCS#1 v1.5, SHA-256). The certificate set carries the WWDR and signer
//! certificates so wallets can rebuild the chain.

use crate::certificates::Certificates;
use crate::error::{PassError, Result};
use cms::builder::{create_signing_time_attribute, SignedDataBuilder, SignerInfoBuilder};
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::signed_data::{EncapsulatedContentInfo, SignerIdentifier};
use const_oid::db::{rfc5911, rfc5912};
use der::Encode;
use rsa::pkcs1v15::{Signature, SigningKey};
use sha2::{Digest, Sha256};
use tracing::debug;
use x509_cert::spki::AlgorithmIdentifierOwned;

/// Sign `manifest` and return the DER-encoded detached signature
pub fn create_signature(manifest: &[u8], certificates: &Certificates) -> Result<Vec<u8>> {
    let content = EncapsulatedContentInfo {
        econtent_type: rfc5911::ID_DATA,
        econtent: None,
    };
    let digest = Sha256::digest(manifest);
    let digest_algorithm = AlgorithmIdentifierOwned {
        oid: rfc5912::ID_SHA_256,
        parameters: None,
    };

    let signer_cert = certificates.signer_cert();
    let signer_id = SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
        issuer: signer_cert.tbs_certificate.issuer.clone(),
        serial_number: signer_cert.tbs_certificate.serial_number.clone(),
    });

    let signing_key = SigningKey::<Sha256>::new(certificates.signer_key().clone());

    let mut signer_info = SignerInfoBuilder::new(
        &signing_key,
        signer_id,
        digest_algorithm.clone(),
        &content,
        Some(digest.as_slice()),
    )
    .map_err(signing_error)?;
    signer_info
        .add_signed_attribute(create_signing_time_attribute().map_err(signing_error)?)
        .map_err(signing_error)?;

    let mut builder = SignedDataBuilder::new(&content);
    builder
        .add_digest_algorithm(digest_algorithm)
        .map_err(signing_error)?
        .add_certificate(CertificateChoices::Certificate(certificates.wwdr().clone()))
        .map_err(signing_error)?
        .add_certificate(CertificateChoices::Certificate(signer_cert.clone()))
        .map_err(signing_error)?
        .add_signer_info::<SigningKey<Sha256>, Signature>(signer_info)
        .map_err(signing_error)?;

    let content_info = builder.build().map_err(signing_error)?;
    let der = content_info
        .to_der()
        .map_err(|e| PassError::SignatureFailed(e.to_string()))?;

    debug!("Created {} byte manifest signature", der.len());
    Ok(der)
}

fn signing_error(err: cms::builder::Error) -> PassError {
    PassError::SignatureFailed(format!("{:?}", err))
}
