//! # Certificate Signing Requests
//!
//! Extracts the hostnames a PKCS#10 request asks for.

use thiserror::Error;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

#[derive(Debug, Error)]
pub enum CsrError {
    #[error("certificate request is not valid PEM: {0}")]
    Pem(String),

    #[error("certificate request could not be decoded: {0}")]
    Der(String),

    #[error("certificate request does not contain any DNS names")]
    NoHostnames,
}

/// DNS names requested by a PEM encoded CSR, in request order.
///
/// Names come from the subjectAltName extension. When the request carries no
/// DNS names there, the subject common name is used instead.
pub fn dns_names(pem: &[u8]) -> Result<Vec<String>, CsrError> {
    let (_, pem) = parse_x509_pem(pem).map_err(|e| CsrError::Pem(e.to_string()))?;
    let (_, csr) =
        X509CertificationRequest::from_der(&pem.contents).map_err(|e| CsrError::Der(e.to_string()))?;

    let mut names: Vec<String> = Vec::new();
    if let Some(extensions) = csr.requested_extensions() {
        for extension in extensions {
            if let ParsedExtension::SubjectAlternativeName(san) = extension {
                for name in &san.general_names {
                    if let GeneralName::DNSName(dns) = name {
                        if !names.iter().any(|n| n == dns) {
                            names.push((*dns).to_string());
                        }
                    }
                }
            }
        }
    }

    if names.is_empty() {
        names.extend(
            csr.certification_request_info
                .subject
                .iter_common_name()
                .filter_map(|cn| cn.as_str().ok())
                .map(str::to_string),
        );
    }

    if names.is_empty() {
        return Err(CsrError::NoHostnames);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSR: &[u8] = include_bytes!("../../tests/fixtures/csr.pem");

    #[test]
    fn test_dns_names_from_subject_alt_name() {
        assert_eq!(
            dns_names(CSR).unwrap(),
            vec!["example.com".to_string(), "www.example.com".to_string()]
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(dns_names(b"not a csr"), Err(CsrError::Pem(_))));
    }

    #[test]
    fn test_wrong_pem_contents_are_rejected() {
        let pem = b"-----BEGIN CERTIFICATE REQUEST-----\nAAAA\n-----END CERTIFICATE REQUEST-----\n";
        assert!(matches!(dns_names(pem), Err(CsrError::Der(_))));
    }
}
