use alloy::primitives::{B256, U256};
use ark_ff::{BigInt, PrimeField};

/// Errors raised while decoding wire values into field elements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("invalid scalar string: {0}")]
    InvalidScalar(String),

    #[error("value {0} is not a canonical field element")]
    OutOfField(U256),

    #[error("plaintext block must be 32 bytes, got {0}")]
    BlockLength(usize),
}

/// Convert a 256-bit integer into a field element, rejecting values at or above the modulus.
pub fn u256_to_field<F>(value: U256) -> Result<F, EncodingError>
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    F::from_bigint(BigInt::new(value.into_limbs())).ok_or(EncodingError::OutOfField(value))
}

/// Convert a 256-bit integer into a field element, reducing modulo the field order.
pub fn u256_to_field_reduced<F: PrimeField>(value: U256) -> F {
    F::from_be_bytes_mod_order(&value.to_be_bytes::<32>())
}

/// Convert a field element into its canonical integer representative.
pub fn field_to_u256<F>(value: F) -> U256
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    U256::from_limbs(value.into_bigint().0)
}

/// The modulus of a prime field as a 256-bit integer.
pub fn modulus<F>() -> U256
where
    F: PrimeField<BigInt = BigInt<4>>,
{
    U256::from_limbs(F::MODULUS.0)
}

/// Render as `0x` followed by exactly 64 lowercase hex digits.
pub fn to_hex(value: U256) -> String {
    format!("{}", B256::from(value))
}

/// Parse a scalar from either `0x`-prefixed hex (any length up to 64 digits) or decimal.
pub fn parse_scalar(s: &str) -> Result<U256, EncodingError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => return Err(EncodingError::InvalidScalar(s.to_string())),
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(s, 10),
    };
    parsed.map_err(|_| EncodingError::InvalidScalar(s.to_string()))
}

/// Serde adapter for `U256` values on the wire (`0x` + 64 hex digits).
pub mod hex_u256 {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_hex(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_scalar(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for a pair of wire scalars, serialized as a two-element array.
pub mod hex_u256_pair {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &[U256; 2], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [super::to_hex(value[0]), super::to_hex(value[1])].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[U256; 2], D::Error>
    where
        D: Deserializer<'de>,
    {
        let [a, b] = <[String; 2]>::deserialize(deserializer)?;
        let a = super::parse_scalar(&a).map_err(serde::de::Error::custom)?;
        let b = super::parse_scalar(&b).map_err(serde::de::Error::custom)?;
        Ok([a, b])
    }
}

/// Serde adapter for a list of wire scalars.
pub mod hex_u256_vec {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[U256], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(value.iter().map(|v| super::to_hex(*v)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| super::parse_scalar(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Serde adapter for opaque bytes as `0x`-prefixed hex.
pub mod hex_bytes {
    use alloy::primitives::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fq, Fr};

    #[test]
    fn test_hex_roundtrip_keeps_leading_zeros() {
        let s = "0x000000000000000000000000000000000000000000000000000000000001e240";
        let v = parse_scalar(s).unwrap();
        assert_eq!(v, U256::from(123456u64));
        assert_eq!(to_hex(v), s);
    }

    #[test]
    fn test_parse_decimal_and_short_hex() {
        assert_eq!(parse_scalar("123456").unwrap(), U256::from(123456u64));
        assert_eq!(parse_scalar("0x1e240").unwrap(), U256::from(123456u64));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_scalar("0x").is_err());
        assert!(parse_scalar("0xzz").is_err());
        assert!(parse_scalar("12ab").is_err());
    }

    #[test]
    fn test_field_roundtrip() {
        let v = U256::from(0xdead_beefu64);
        let f: Fr = u256_to_field(v).unwrap();
        assert_eq!(field_to_u256(f), v);
    }

    #[test]
    fn test_out_of_field_rejected() {
        let p = modulus::<Fr>();
        assert!(u256_to_field::<Fr>(p).is_err());
        assert!(u256_to_field::<Fr>(p - U256::from(1u64)).is_ok());
        // The G1 base field is larger than Fr.
        assert!(u256_to_field::<Fq>(p).is_ok());
    }

    #[test]
    fn test_reduced_conversion_wraps() {
        let p = modulus::<Fr>();
        let f: Fr = u256_to_field_reduced(p + U256::from(5u64));
        assert_eq!(field_to_u256(f), U256::from(5u64));
    }
}
