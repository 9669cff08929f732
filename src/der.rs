//! Minimal DER walking for attestation certificates
//!
//! Only as much ASN.1 as the registration blob needs: reading a
//! certificate's self-delimiting length out of its outer SEQUENCE header,
//! and normalizing the "unused bits" byte of the trailing signature
//! BIT STRING. Neither requires a full ASN.1 parser.

use crate::error::{Error, Result};

/// Parse a tag-length header at `pos`. Returns (content_start, content_len).
///
/// Definite short and long form lengths only; indefinite lengths are not
/// valid DER and are rejected.
fn tlv(buf: &[u8], pos: usize) -> Option<(usize, usize)> {
    buf.get(pos)?;
    let first = *buf.get(pos + 1)?;
    if first < 0x80 {
        return Some((pos + 2, first as usize));
    }
    let n = (first & 0x7f) as usize;
    if n == 0 || n > 4 {
        return None;
    }
    let mut len = 0usize;
    for i in 0..n {
        len = (len << 8) | *buf.get(pos + 2 + i)? as usize;
    }
    Some((pos + 2 + n, len))
}

/// Total encoded length of the DER certificate at the start of `der`
///
/// The registration blob carries the certificate without any surrounding
/// length field; it delimits itself through its own SEQUENCE header.
pub(crate) fn certificate_length(der: &[u8]) -> Result<usize> {
    if der.first() != Some(&0x30) {
        return Err(Error::MalformedWireData("attestation certificate tag"));
    }
    let (content_start, content_len) =
        tlv(der, 0).ok_or(Error::MalformedWireData("attestation certificate length"))?;
    let total = content_start
        .checked_add(content_len)
        .ok_or(Error::MalformedWireData("attestation certificate length"))?;
    if total > der.len() {
        return Err(Error::MalformedWireData("attestation certificate truncated"));
    }
    Ok(total)
}

/// Normalize the signature BIT STRING's "unused bits" byte to zero
///
/// Some authenticators ship attestation certificates whose trailing
/// signature BIT STRING declares a non-zero number of unused bits, which is
/// invalid DER and rejected by strict verifiers. This walks the outer
/// certificate structure (SEQUENCE, tbsCertificate, signatureAlgorithm,
/// signature BIT STRING) and rewrites that one byte to zero, leaving every
/// other byte untouched.
///
/// Best-effort: input that does not match the expected certificate shape is
/// returned unchanged. Idempotent.
pub fn fix_signature_unused_bits(der: &[u8]) -> Vec<u8> {
    match locate_unused_bits_byte(der) {
        Some(idx) if der[idx] != 0 => {
            let mut fixed = der.to_vec();
            fixed[idx] = 0;
            fixed
        }
        _ => der.to_vec(),
    }
}

/// Offset of the unused-bits byte of the certificate's signature BIT STRING
fn locate_unused_bits_byte(der: &[u8]) -> Option<usize> {
    if *der.first()? != 0x30 {
        return None;
    }
    let (mut pos, outer_len) = tlv(der, 0)?;
    let end = pos.checked_add(outer_len)?;
    if end > der.len() {
        return None;
    }

    // tbsCertificate
    if *der.get(pos)? != 0x30 {
        return None;
    }
    let (content, len) = tlv(der, pos)?;
    pos = content.checked_add(len)?;

    // signatureAlgorithm
    if *der.get(pos)? != 0x30 {
        return None;
    }
    let (content, len) = tlv(der, pos)?;
    pos = content.checked_add(len)?;

    // signatureValue: the BIT STRING's first content byte is the
    // unused-bits count
    if *der.get(pos)? != 0x03 {
        return None;
    }
    let (content, len) = tlv(der, pos)?;
    if len == 0 || content.checked_add(len)? != end {
        return None;
    }
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Example certificate from the FIDO U2F raw message formats document
    // ("Gnubby Pilot"); its signature BIT STRING is already conformant.
    const GNUBBY_CERT_HEX: &str = "3082013c3081e4a003020102020a4790128000115595735230\
0a06082a8648ce3d0403023017311530130603550403130c476e756262792050696c6f74301e170d3132\
303831343138323933325a170d3133303831343138323933325a3031312f302d060355040313265069\
6c6f74476e756262792d302e342e312d34373930313238303030313135353935373335323059301306\
072a8648ce3d020106082a8648ce3d030107034200048d617e65c9508e64bcc5673ac82a6799da3c14\
46682c258c463fffdf58dfd2fa3e6c378b53d795c4a4dffb4199edd7862f23abaf0203b4b8911ba056\
9994e101300a06082a8648ce3d0403020347003044022060cdb6061e9c22262d1aac1d96d8c70829b2\
366531dda268832cb836bcd30dfa0220631b1459f09e6330055722c8d89b7f48883b9089b88d60d1d9\
795902b30410df";

    // "CN=Yubico U2F EE Serial 13831167861": encodes two unused bits in the
    // signature BIT STRING, which the repair must zero.
    const YUBICO_CERT_BROKEN_HEX: &str = "3082021c30820106a00302010202043866df7530\
0b06092a864886f70d01010b302e312c302a0603550403132359756269636f2055324620526f6f7420\
43412053657269616c203435373230303633313020170d3134303830313030303030305a180f323035\
30303930343030303030305a302b3129302706035504030c2059756269636f20553246204545205365\
7269616c2031333833313136373836313059301306072a8648ce3d020106082a8648ce3d0301070342\
0004378dfc740c739b94724ed3d523b9b876810656c13de86fafaecf38d90f55e2c80a1bfe0b30dc53\
b35de7d045b96dcb8f2bf94fa8e0b903163c7f6edc2e487b71a3123010300e060a2b0601040182c40a\
01010400300b06092a864886f70d01010b03820101021a4764ca0089cf92adb87fa848538e72cc3efd\
bb34792943047b8216a939baf4c113562a345b61475979697947bce671aa6a7c06796ed4ebb1b8fd60\
2719b71deb3cf642e98db1d9666ff01e6db74f45af7967c046d6e6ff4b4e09a3141834b69af16465cc\
decf3a0a809c0aa49a7b1943f5bd4e3dae3bdccfde6a713a49269eacfb3f9cede0ba79c6bbfba75e61\
18e20f0f957ea61eed52688226cab42df791037e97eda5e2df6029d2bb7fc327e745e7f9f5862bed29\
b068cb972a36c86522deb2c7196533335ddfaeb8b6fa0db5026aca845419061aa4d17c070e98fa2fd6\
71d4acd0c290e474a1b4783ec246e0f89a9887c0a4d7a85c662919ba24ea7b9c";

    #[test]
    fn test_conformant_certificate_unchanged() {
        let cert = hex::decode(GNUBBY_CERT_HEX).unwrap();
        assert_eq!(fix_signature_unused_bits(&cert), cert);
    }

    #[test]
    fn test_nonzero_unused_bits_zeroed() {
        let broken = hex::decode(YUBICO_CERT_BROKEN_HEX).unwrap();
        let fixed = fix_signature_unused_bits(&broken);
        assert_ne!(fixed, broken);
        // Exactly one byte differs, and it is now zero.
        let diffs: Vec<usize> = broken
            .iter()
            .zip(fixed.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diffs.len(), 1);
        assert_eq!(broken[diffs[0]], 0x02);
        assert_eq!(fixed[diffs[0]], 0x00);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let broken = hex::decode(YUBICO_CERT_BROKEN_HEX).unwrap();
        let fixed = fix_signature_unused_bits(&broken);
        assert_eq!(fix_signature_unused_bits(&fixed), fixed);
    }

    #[test]
    fn test_unrecognized_input_passes_through() {
        assert_eq!(fix_signature_unused_bits(&[]), Vec::<u8>::new());
        assert_eq!(fix_signature_unused_bits(b"not a certificate"), b"not a certificate");
        // SEQUENCE header with a length past the end of the buffer
        assert_eq!(fix_signature_unused_bits(&[0x30, 0x10, 0x01]), vec![0x30, 0x10, 0x01]);
    }

    #[test]
    fn test_certificate_length() {
        let cert = hex::decode(GNUBBY_CERT_HEX).unwrap();
        assert_eq!(certificate_length(&cert).unwrap(), cert.len());

        // Trailing bytes after the certificate do not count.
        let mut padded = cert.clone();
        padded.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(certificate_length(&padded).unwrap(), cert.len());
    }

    #[test]
    fn test_certificate_length_rejects_truncation() {
        let cert = hex::decode(GNUBBY_CERT_HEX).unwrap();
        assert!(certificate_length(&cert[..cert.len() - 1]).is_err());
        assert!(certificate_length(&[]).is_err());
        assert!(certificate_length(&[0x02, 0x01, 0x00]).is_err());
    }
}
