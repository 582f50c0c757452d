//! Regex patterns shared by the document parsers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice header fields
    pub static ref INVOICE_ID: Regex = Regex::new(
        r"(?im)(?:factura|invoice|folio)(?:\s+(?:no\b\.?|numero|num|#))?\s*[:.]\s*([A-Z0-9][\w\-]*)|(?:\bno\b\.?|#)\s*[:.#]?\s*([A-Z0-9][\w\-]*)"
    ).unwrap();

    pub static ref INVOICE_DATE: Regex = Regex::new(
        r"(?im)(?:fecha|date|emision)\s*[:.]?\s*(\d{4}[/\-]\d{1,2}[/\-]\d{1,2}|\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})"
    ).unwrap();

    pub static ref INVOICE_DATE_LONG: Regex = Regex::new(
        r"(?im)(\d{1,2}\s+de\s+\w+\s+de\s+\d{4})"
    ).unwrap();

    pub static ref VENDOR: Regex = Regex::new(
        r"(?im)(?:proveedor|vendor|emisor|razon social)\s*[:.]?\s*(.+?)(?:\n|$)"
    ).unwrap();

    pub static ref CLIENT: Regex = Regex::new(
        r"(?im)(?:cliente|customer|comprador|receptor)\s*[:.]?\s*(.+?)(?:\n|$)"
    ).unwrap();

    pub static ref TAX_ID: Regex = Regex::new(
        r"(?im)(?:rfc|nif|cif|tax\s*id)\s*[:.]?\s*([A-Z0-9\-]+)"
    ).unwrap();

    // Amounts must sit on the label's line
    pub static ref SUBTOTAL: Regex = Regex::new(
        r"(?im)(?:subtotal|sub[ \t]*total)[ \t]*[:.]?[ \t]*\$?[ \t]*([\d,.]+)"
    ).unwrap();

    // Optional rate in parentheses: "IVA (16%): $224.00"
    pub static ref TAX: Regex = Regex::new(
        r"(?im)\b(?:iva|tax|impuesto)(?:[ \t]*\([^)]*\))?[ \t]*[:.]?[ \t]*\$?[ \t]*([\d,.]+)"
    ).unwrap();

    pub static ref TOTAL: Regex = Regex::new(
        r"(?im)\b(?:total(?:[ \t]*a[ \t]*pagar)?|grand[ \t]*total|importe[ \t]*total)[ \t]*[:.]?[ \t]*\$?[ \t]*([\d,.]+)"
    ).unwrap();

    // Free-text line items: quantity, description, unit price, line total
    pub static ref ITEM_LINE: Regex = Regex::new(
        r"(?m)(\d+)\s+(.+?)\s+\$?([\d,.]+)\s+\$?([\d,.]+)"
    ).unwrap();

    // Report metadata
    pub static ref REPORT_TITLE: Regex = Regex::new(
        r"(?im)^(.*?(?:reporte|informe|report|listado).*?)$"
    ).unwrap();

    pub static ref REPORT_DATE: Regex = Regex::new(
        r"(?im)(?:fecha|date|periodo|period)\s*[:.]?\s*(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})"
    ).unwrap();

    pub static ref REPORT_PERIOD: Regex = Regex::new(
        r"(?im)(?:periodo|period)\s*[:.]?\s*(.+?)(?:\n|$)"
    ).unwrap();

    pub static ref PAGE: Regex = Regex::new(
        r"(?im)(?:pagina|page|pag\.?)\s*[:.]?\s*(\d+)\s*(?:de|of|/)\s*(\d+)"
    ).unwrap();

    pub static ref NUMERIC_CELL: Regex = Regex::new(
        r"^[\d,.\-\s$%]+$"
    ).unwrap();

    // Financial statements
    pub static ref COMPANY: Regex = Regex::new(
        r"(?m)^([A-Z][A-Za-z \t,.]+(?:S\.A\.|Inc\.|Corp\.|LLC)?)"
    ).unwrap();

    pub static ref STATEMENT_DATE: Regex = Regex::new(
        r"(?i)(?:\bal|as\s+of|\bat)\s+(\d{1,2}\s+de\s+\w+\s+de\s+\d{4}|\w+\s+\d{1,2},?\s+\d{4})"
    ).unwrap();

    pub static ref CURRENCY_UNIT: Regex = Regex::new(
        r"(?i)(?:cifras\s+(?:expresadas\s+)?en|amounts?\s+in)\s+(miles\s+de\s+pesos|millones|thousands|millions)"
    ).unwrap();

    pub static ref YEAR_CELL: Regex = Regex::new(
        r"\b20\d{2}\b"
    ).unwrap();

    pub static ref FINANCIAL_NUMERIC_CELL: Regex = Regex::new(
        r"^[\d,.\-()$\s]+$"
    ).unwrap();
}
