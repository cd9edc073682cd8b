use crate::ErrorCode;

/// Validate an IEEE-754 binary64 bit pattern for the profile.
///
/// NaN and both infinities are forbidden on the wire; every other value,
/// including negative zero and subnormals, round-trips and is allowed.
#[inline]
pub fn validate_f64_bits(bits: u64) -> Result<(), ErrorCode> {
    let v = f64::from_bits(bits);
    if v.is_nan() || v.is_infinite() {
        return Err(ErrorCode::InvalidFloat);
    }
    Ok(())
}

/// Narrow a binary64 value to binary32, permitted only when re-widening
/// reproduces the exact original value.
#[inline]
pub fn narrow_to_f32(v: f64) -> Result<f32, ErrorCode> {
    let narrowed = v as f32;
    if f64::from(narrowed).to_bits() == v.to_bits() {
        Ok(narrowed)
    } else {
        Err(ErrorCode::NarrowFloatForbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nan_and_infinities() {
        assert_eq!(
            validate_f64_bits(f64::NAN.to_bits()),
            Err(ErrorCode::InvalidFloat)
        );
        assert_eq!(
            validate_f64_bits(f64::INFINITY.to_bits()),
            Err(ErrorCode::InvalidFloat)
        );
        assert_eq!(
            validate_f64_bits(f64::NEG_INFINITY.to_bits()),
            Err(ErrorCode::InvalidFloat)
        );
    }

    #[test]
    fn negative_zero_round_trips() {
        assert!(validate_f64_bits((-0.0f64).to_bits()).is_ok());
    }

    #[test]
    fn narrowing_requires_exact_round_trip() {
        assert_eq!(narrow_to_f32(1.5), Ok(1.5f32));
        assert_eq!(narrow_to_f32(-4.1), Err(ErrorCode::NarrowFloatForbidden));
    }
}
