use std::time::{SystemTime, UNIX_EPOCH};

/// Creation timestamp for durable records: whole seconds since the Unix
/// epoch with a trailing `Z`. Opaque to clients, compared only for
/// equality, never parsed back.
pub fn timestamp_now() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{secs}Z")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_shape() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert!(ts[..ts.len() - 1].chars().all(|c| c.is_ascii_digit()));
    }
}
