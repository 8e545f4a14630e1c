//! Customer-facing booking codes: `<PREFIX>-<8 x [A-Z0-9]>`.

use rand::Rng;

use crate::models::PackageRef;

pub const SUFFIX_LEN: usize = 8;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const FALLBACK_PREFIX: &str = "BKG";

fn first_three(value: &str) -> String {
    value.trim().chars().take(3).collect::<String>().to_uppercase()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// City code, else the first three letters of the city name, else of the
/// package name.
pub fn code_prefix(package: &PackageRef) -> String {
    if let Some(code) = non_blank(&package.city_code) {
        return code.to_uppercase();
    }
    if let Some(city) = non_blank(&package.city_name) {
        return first_three(city);
    }

    let from_name = first_three(&package.name);
    if from_name.is_empty() {
        FALLBACK_PREFIX.to_string()
    } else {
        from_name
    }
}

pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())]))
        .collect()
}

pub fn generate(prefix: &str) -> String {
    format!("{prefix}-{}", random_suffix(&mut rand::thread_rng()))
}
