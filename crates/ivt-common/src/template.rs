//! Downloadable import template

use crate::error::Result;
use std::path::Path;

/// Default file name for the template
pub const TEMPLATE_FILE_NAME: &str = "modelo_inventario.csv";

/// Header row of the template
pub const TEMPLATE_HEADER: &str = "descricao,codigo,EAN,embalagem";

/// Sample rows shipped with the template
pub const TEMPLATE_ROWS: &[&str] = &[
    "Produto Teste A,PROD001,7891234567890,UN",
    "Caixa Organizadora,PROD002,7891234567891,CX",
    "Kit Ferramentas,PROD003,7891234567892,KT",
];

const UTF8_BOM: &str = "\u{feff}";

/// Template body without the byte-order mark
pub fn template_csv() -> String {
    std::iter::once(TEMPLATE_HEADER)
        .chain(TEMPLATE_ROWS.iter().copied())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the template with a UTF-8 BOM so spreadsheet tools detect the encoding
pub fn write_template(path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, format!("{}{}", UTF8_BOM, template_csv()))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_bytes, normalize_file};
    use crate::record::FieldValue;

    #[test]
    fn test_template_normalizes_cleanly() {
        let table = normalize_bytes(template_csv().as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["descricao", "codigo", "EAN", "embalagem"]);
        assert_eq!(table.len(), 3);
        assert!(table.warnings.is_empty());
        assert_eq!(
            table.records[1].get("EAN"),
            Some(&FieldValue::Number(7891234567891.0))
        );
    }

    #[test]
    fn test_written_template_has_bom_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TEMPLATE_FILE_NAME);
        write_template(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM.as_bytes()));

        let table = normalize_file(&path).unwrap();
        assert_eq!(table.headers[0], "descricao");
        assert_eq!(
            table.records[2].get("codigo"),
            Some(&FieldValue::String("PROD003".to_string()))
        );
    }
}
