//! API endpoint URL builders

use ivt_common::RecordId;

/// Collection URL used for create and list calls
pub fn collection_url(api_url: &str) -> String {
    api_url.trim_end_matches('/').to_string()
}

/// Single-record URL used for delete calls
pub fn record_url(api_url: &str, id: &RecordId) -> String {
    format!(
        "{}/{}",
        api_url.trim_end_matches('/'),
        urlencoding::encode(&id.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_url() {
        assert_eq!(
            collection_url("http://localhost:8000/api/inventario/"),
            "http://localhost:8000/api/inventario"
        );
    }

    #[test]
    fn test_record_url() {
        assert_eq!(
            record_url("http://localhost:8000/api/inventario", &RecordId::Number(42)),
            "http://localhost:8000/api/inventario/42"
        );
        assert_eq!(
            record_url("http://localhost:8000/api/inventario/", &RecordId::Text("a b/c".into())),
            "http://localhost:8000/api/inventario/a%20b%2Fc"
        );
    }
}
