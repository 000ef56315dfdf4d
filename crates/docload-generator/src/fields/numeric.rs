//! Numeric and random-string field values.

use docload_core::Value;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random integer in the given range (inclusive).
pub fn generate_int_range<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> Value {
    Value::Int64(rng.gen_range(min..=max))
}

/// Random float in the given range (inclusive).
pub fn generate_float_range<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> Value {
    Value::Double(rng.gen_range(min..=max))
}

/// Alphanumeric string with a length drawn from `[min_length, max_length]`.
pub fn generate_alphanumeric<R: Rng + ?Sized>(
    rng: &mut R,
    min_length: usize,
    max_length: usize,
) -> Value {
    let length = rng.gen_range(min_length..=max_length);
    let s: String = (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    Value::String(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_int_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let value = generate_int_range(&mut rng, 10, 20);
            let v = value.as_i64().unwrap();
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_generate_float_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let v = generate_float_range(&mut rng, 0.5, 1.5).as_f64().unwrap();
            assert!((0.5..=1.5).contains(&v));
        }
    }

    #[test]
    fn test_generate_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let value = generate_alphanumeric(&mut rng, 3, 8);
            let s = value.as_str().unwrap();
            assert!((3..=8).contains(&s.len()));
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
