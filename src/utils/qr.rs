/// URL of an externally rendered QR image encoding `data`.
pub fn qr_image_url(base: &str, data: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}data={}", urlencoding::encode(data))
}
