use crate::error::PayError;
use crate::qris::crc::crc16;

/// Point-of-initiation tag 01: value 11 marks a static QR, 12 a dynamic one.
const STATIC_POI: &str = "010211";
const DYNAMIC_POI: &str = "010212";
/// Tag 58 country code, the splice point for the amount field.
const COUNTRY_CODE: &str = "5802ID";

/// A merchant's static QRIS code, validated once at startup. Holds the TLV
/// body with the trailing CRC value already stripped.
#[derive(Debug, Clone)]
pub struct QrisTemplate {
    body: String,
}

impl QrisTemplate {
    pub fn parse(raw: &str) -> Result<Self, PayError> {
        if !raw.is_ascii() {
            return Err(PayError::MalformedTemplate(
                "template must be ASCII".to_string(),
            ));
        }
        let stripped = raw
            .len()
            .checked_sub(4)
            .map(|end| &raw[..end])
            .filter(|body| !body.is_empty())
            .ok_or_else(|| {
                PayError::MalformedTemplate("template too short to carry a checksum".to_string())
            })?;

        match stripped.matches(STATIC_POI).count() {
            1 => {}
            n => {
                return Err(PayError::MalformedTemplate(format!(
                    "expected exactly one static point-of-initiation tag, found {n}"
                )))
            }
        }
        match stripped.matches(COUNTRY_CODE).count() {
            1 => {}
            n => {
                return Err(PayError::MalformedTemplate(format!(
                    "expected exactly one country-code tag, found {n}"
                )))
            }
        }

        Ok(Self {
            body: stripped.to_string(),
        })
    }

    /// Rewrites the template into a dynamic payload carrying `amount`:
    /// flips the point-of-initiation value, splices a length-prefixed tag 54
    /// amount field ahead of the country code, and appends a fresh CRC.
    pub fn build_payload(&self, amount: u64) -> Result<String, PayError> {
        self.build_payload_raw(&amount.to_string())
    }

    /// `amount` must be a plain decimal string. The tag 54 length prefix is
    /// two digits, so amounts past 99 characters are rejected outright rather
    /// than truncated.
    pub fn build_payload_raw(&self, amount: &str) -> Result<String, PayError> {
        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PayError::InvalidAmount(format!(
                "not a decimal amount: {amount:?}"
            )));
        }
        if amount.len() > 99 {
            return Err(PayError::InvalidAmount(format!(
                "{} digits does not fit the 2-digit length prefix",
                amount.len()
            )));
        }
        if amount.bytes().all(|b| b == b'0') {
            return Err(PayError::InvalidAmount("amount must be positive".to_string()));
        }

        let dynamic = self.body.replacen(STATIC_POI, DYNAMIC_POI, 1);
        let (head, tail) = dynamic
            .split_once(COUNTRY_CODE)
            .expect("country code checked at parse");

        let amount_field = format!("54{:02}{amount}{COUNTRY_CODE}", amount.len());
        let payload = format!("{head}{amount_field}{tail}");
        Ok(format!("{}{}", payload, crc16(&payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Synthetic merchant code: one point-of-initiation tag, one country code,
    // trailing 6304 CRC tag with a dummy value.
    const TEMPLATE: &str =
        "0002010102115204541153033605802ID5909TOKO TEST6007BANDUNG6304ABCD";

    #[test]
    fn parses_valid_template() {
        assert!(QrisTemplate::parse(TEMPLATE).is_ok());
    }

    #[test]
    fn rejects_missing_markers() {
        let no_poi = "00020152045411530336054031005802ID6304ABCD";
        assert!(matches!(
            QrisTemplate::parse(no_poi),
            Err(PayError::MalformedTemplate(_))
        ));

        let no_country = "000201010211520454115303360630ABCD";
        assert!(matches!(
            QrisTemplate::parse(no_country),
            Err(PayError::MalformedTemplate(_))
        ));

        assert!(matches!(
            QrisTemplate::parse("63"),
            Err(PayError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn rejects_duplicate_markers() {
        let twice = "0002010102110102115204541153033605802ID6304ABCD";
        assert!(matches!(
            QrisTemplate::parse(twice),
            Err(PayError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn splices_length_prefixed_amount() {
        let template = QrisTemplate::parse(TEMPLATE).unwrap();
        let payload = template.build_payload(1000).unwrap();

        // Tag 54, two-digit length 04, value 1000, country code re-inserted.
        assert!(payload.contains("540410005802ID"));
        assert!(payload.contains(DYNAMIC_POI));
        assert!(!payload.contains(STATIC_POI));
    }

    #[test]
    fn checksum_round_trips() {
        let template = QrisTemplate::parse(TEMPLATE).unwrap();
        for amount in [1u64, 42, 1000, 5007, 150_000, u64::MAX] {
            let payload = template.build_payload(amount).unwrap();
            let (body, checksum) = payload.split_at(payload.len() - 4);
            assert_eq!(checksum, crc16(body));
        }
    }

    #[test]
    fn wide_amounts_fail_fast() {
        let template = QrisTemplate::parse(TEMPLATE).unwrap();
        let ninety_nine = "1".repeat(99);
        assert!(template.build_payload_raw(&ninety_nine).is_ok());

        let hundred = "1".repeat(100);
        assert!(matches!(
            template.build_payload_raw(&hundred),
            Err(PayError::InvalidAmount(_))
        ));
    }

    #[test]
    fn zero_and_junk_amounts_rejected() {
        let template = QrisTemplate::parse(TEMPLATE).unwrap();
        for bad in ["0", "000", "", "12a4", "-5"] {
            assert!(matches!(
                template.build_payload_raw(bad),
                Err(PayError::InvalidAmount(_))
            ));
        }
    }
}
