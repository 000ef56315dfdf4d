//! Pattern-based string generator.
//!
//! Supports placeholders:
//! - `{id}` - numeric id of the document being generated
//! - `{uuid}` - UUID built from the generation RNG
//! - `{rand:N}` - random N-digit number

use docload_core::{IdLong, Value};
use rand::Rng;
use uuid::Builder;

/// Generate a string based on a pattern with placeholders.
pub fn generate_pattern<R: Rng + ?Sized>(pattern: &str, rng: &mut R, id: IdLong) -> Value {
    let mut result = pattern.replace("{id}", &id.to_string());

    // UUIDs come from the RNG so seeded generations stay reproducible.
    while result.contains("{uuid}") {
        let uuid = Builder::from_random_bytes(rng.gen()).into_uuid();
        result = result.replacen("{uuid}", &uuid.to_string(), 1);
    }

    let mut search_from = 0;
    while let Some(offset) = result[search_from..].find("{rand:") {
        let start = search_from + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let end = start + len;
        match result[start + 6..end].parse::<usize>() {
            Ok(digits) => {
                let random_num = generate_random_digits(rng, digits);
                result = format!("{}{}{}", &result[..start], random_num, &result[end + 1..]);
                search_from = start + random_num.len();
            }
            // Leave malformed placeholders in place.
            Err(_) => search_from = end + 1,
        }
    }

    Value::String(result)
}

/// Generate a random number with exactly N digits.
fn generate_random_digits<R: Rng + ?Sized>(rng: &mut R, digits: usize) -> String {
    if digits == 0 {
        return String::new();
    }

    let mut result = String::with_capacity(digits);
    // No leading zero.
    result.push(char::from(b'0' + rng.gen_range(1..10u8)));
    for _ in 1..digits {
        result.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_pattern_id() {
        let mut rng = StdRng::seed_from_u64(42);
        let value = generate_pattern("customer_{id}@example.com", &mut rng, IdLong::new(123));

        assert_eq!(value, Value::from("customer_123@example.com"));
    }

    #[test]
    fn test_generate_pattern_uuid_is_seeded() {
        let a = generate_pattern("id-{uuid}", &mut StdRng::seed_from_u64(7), IdLong::new(0));
        let b = generate_pattern("id-{uuid}", &mut StdRng::seed_from_u64(7), IdLong::new(0));
        assert_eq!(a, b);

        let s = a.as_str().unwrap();
        assert!(s.starts_with("id-"));
        assert_eq!(s.len(), 3 + 36);
    }

    #[test]
    fn test_generate_pattern_random_digits() {
        let mut rng = StdRng::seed_from_u64(42);
        let value = generate_pattern("code-{rand:6}", &mut rng, IdLong::new(0));

        let s = value.as_str().unwrap();
        assert!(s.starts_with("code-"));
        assert_eq!(s.len(), 5 + 6);
        assert!(s[5..].chars().all(|c| c.is_ascii_digit()));
        assert_ne!(&s[5..6], "0");
    }

    #[test]
    fn test_malformed_placeholder_kept() {
        let mut rng = StdRng::seed_from_u64(42);
        let value = generate_pattern("{rand:x}-{rand:2}", &mut rng, IdLong::new(0));

        let s = value.as_str().unwrap();
        assert!(s.starts_with("{rand:x}-"));
        assert_eq!(s.len(), "{rand:x}-".len() + 2);
    }
}
