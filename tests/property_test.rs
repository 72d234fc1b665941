//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold for any valid input.

use num_bigint::BigUint;
use proptest::prelude::*;

use stark_vip::domain::{parse_field_element, ProofRequest, RawProofRequest};
use stark_vip::infra::{
    decode_option_u256_array, encode_array_argument, parse_calldata_output, CalldataParseMode,
    FailureCategory,
};
use stark_vip::prover::{codec, validate, ValidationError};
use stark_vip::CalldataArray;

// ============================================================================
// Custom Strategies
// ============================================================================

/// Generate a field element below 2^252
fn arb_felt() -> impl Strategy<Value = BigUint> {
    prop::collection::vec(any::<u8>(), 0..32).prop_map(|mut bytes| {
        if let Some(first) = bytes.first_mut() {
            *first &= 0x0f;
        }
        BigUint::from_bytes_be(&bytes)
    })
}

fn arb_u128() -> impl Strategy<Value = BigUint> {
    any::<u128>().prop_map(BigUint::from)
}

// ============================================================================
// Codec Properties
// ============================================================================

proptest! {
    /// Decoding an encoding yields the original bytes
    #[test]
    fn prop_codec_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let encoded = codec::encode(&bytes);
        prop_assert_eq!(codec::decode(&encoded).unwrap(), bytes.clone());
        prop_assert_eq!(codec::decode_lenient(&encoded).unwrap(), bytes);
    }

    /// Encoded output is padded base64 of the expected length
    #[test]
    fn prop_codec_output_shape(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let encoded = codec::encode(&bytes);
        prop_assert_eq!(encoded.len(), bytes.len().div_ceil(3) * 4);
        prop_assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
    }
}

// ============================================================================
// Field Element and Calldata Properties
// ============================================================================

proptest! {
    /// Decimal and hex spellings parse to the same value
    #[test]
    fn prop_field_element_decimal_and_hex_agree(value in arb_felt()) {
        let decimal = parse_field_element(&value.to_str_radix(10)).unwrap();
        let hex = parse_field_element(&format!("0x{}", value.to_str_radix(16))).unwrap();
        prop_assert_eq!(&decimal, &value);
        prop_assert_eq!(hex, value);
    }

    /// Tolerant parsing of whitespace tokens matches strict parsing of the JSON array
    #[test]
    fn prop_calldata_json_and_tokens_agree(values in prop::collection::vec(arb_felt(), 1..40)) {
        let decimals: Vec<String> = values.iter().map(|v| v.to_str_radix(10)).collect();
        let json = serde_json::to_string(&decimals).unwrap();
        let tokens = decimals.join(" ");

        let strict = parse_calldata_output(&json, CalldataParseMode::Strict).unwrap();
        let tolerant = parse_calldata_output(&tokens, CalldataParseMode::Tolerant).unwrap();

        prop_assert_eq!(strict.len(), values.len());
        prop_assert_eq!(&strict, &tolerant);
        for (element, value) in strict.elements().iter().zip(&values) {
            prop_assert!(element.starts_with("0x"));
            prop_assert_eq!(&parse_field_element(element).unwrap(), value);
        }
    }

    /// The array argument is always length-prefixed
    #[test]
    fn prop_array_argument_length_prefix(count in 0usize..64) {
        let calldata = CalldataArray::new((0..count).map(|i| format!("{i:#x}")).collect());
        let felts = encode_array_argument(&calldata);
        prop_assert_eq!(felts.len(), count + 1);
        prop_assert_eq!(
            parse_field_element(&felts[0]).unwrap(),
            BigUint::from(count)
        );
    }

    /// `Some` results decode each (low, high) pair to low + high * 2^128
    #[test]
    fn prop_option_u256_decoding(pairs in prop::collection::vec((arb_u128(), arb_u128()), 0..8)) {
        let mut felts = vec!["0x0".to_string(), format!("{:#x}", pairs.len())];
        for (low, high) in &pairs {
            felts.push(format!("0x{}", low.to_str_radix(16)));
            felts.push(format!("0x{}", high.to_str_radix(16)));
        }

        let decoded = decode_option_u256_array(&felts).unwrap().unwrap();
        prop_assert_eq!(decoded.len(), pairs.len());
        for (value, (low, high)) in decoded.iter().zip(&pairs) {
            let expected: BigUint = low + (high << 128u32);
            prop_assert_eq!(value, &expected.to_str_radix(10));
        }
    }

    /// Classification never panics and unknown messages fall through to Other
    #[test]
    fn prop_unknown_messages_are_other(message in "[0-9 .:]{0,64}") {
        prop_assert_eq!(FailureCategory::classify(&message), FailureCategory::Other);
    }
}

// ============================================================================
// Validation Properties
// ============================================================================

proptest! {
    /// Equal non-empty nonces and balance >= threshold always pass
    #[test]
    fn prop_sufficient_balance_passes(threshold in 0u64..1_000_000, extra in 0u64..1_000_000, nonce in "[1-9][0-9]{0,30}") {
        let request = ProofRequest::new(threshold, nonce.clone(), threshold + extra, nonce);
        prop_assert_eq!(validate(&request), Ok(()));
    }

    /// Balance below threshold always fails with the actual amounts
    #[test]
    fn prop_insufficient_balance_fails(balance in 0u64..1_000_000, gap in 1u64..1_000_000) {
        let request = ProofRequest::new(balance + gap, "7", balance, "7");
        prop_assert_eq!(
            validate(&request),
            Err(ValidationError::InsufficientBalance { balance, threshold: balance + gap })
        );
    }

    /// Negative raw amounts never become a request
    #[test]
    fn prop_negative_amounts_rejected(threshold in i64::MIN..0, balance in 0i64..1000) {
        let raw = RawProofRequest {
            threshold,
            nonce: "1".to_string(),
            balance,
            secret_nonce: "1".to_string(),
        };
        prop_assert_eq!(
            ProofRequest::try_from(raw),
            Err(ValidationError::NegativeThreshold(threshold))
        );
    }
}
