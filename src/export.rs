//! Serializers for the final product list.
//!
//! Every format writes the fields in [`FIELD_ORDER`]. Absent optional values
//! are empty cells in CSV, `null` in JSON, and omitted lines in text output.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::{Availability, ProductRecord, FIELD_ORDER};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const TXT_RULE_WIDTH: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Jsonl,
    Txt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Txt => "txt",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat CSV row: badges joined into one cell.
#[derive(Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    url: &'a str,
    image: &'a str,
    price: u64,
    old_price: Option<u64>,
    discount_amount: Option<u64>,
    rating: Option<f64>,
    reviews_count: Option<u32>,
    availability: Availability,
    badges: String,
    brand: &'a str,
    discount_percent: Option<u8>,
}

impl<'a> From<&'a ProductRecord> for CsvRow<'a> {
    fn from(record: &'a ProductRecord) -> Self {
        Self {
            title: &record.title,
            url: &record.url,
            image: &record.image,
            price: record.price,
            old_price: record.old_price,
            discount_amount: record.discount_amount,
            rating: record.rating,
            reviews_count: record.reviews_count,
            availability: record.availability,
            badges: record.badges_joined(),
            brand: &record.brand,
            discount_percent: record.discount_percent,
        }
    }
}

pub fn write_csv<W: Write>(records: &[ProductRecord], writer: &mut W, bom: bool) -> Result<(), ExportError> {
    if bom {
        writer.write_all(UTF8_BOM)?;
    }
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    // Written explicitly so an empty list still gets a header row.
    csv_writer.write_record(FIELD_ORDER)?;
    for record in records {
        csv_writer.serialize(CsvRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[ProductRecord], writer: &mut W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut *writer, records)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// One record per line.
pub fn write_jsonl<W: Write>(records: &[ProductRecord], writer: &mut W) -> Result<(), ExportError> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Numbered human-readable blocks.
pub fn write_txt<W: Write>(records: &[ProductRecord], writer: &mut W) -> Result<(), ExportError> {
    let rule = "=".repeat(TXT_RULE_WIDTH);
    for (i, p) in records.iter().enumerate() {
        writeln!(writer, "{}", rule)?;
        writeln!(writer, "ТОВАР #{}", i + 1)?;
        writeln!(writer, "{}", rule)?;
        writeln!(writer, "Назва: {}", p.title)?;
        writeln!(writer, "URL: {}", p.url)?;
        if !p.image.is_empty() {
            writeln!(writer, "Зображення: {}", p.image)?;
        }
        writeln!(writer, "Ціна: {} ₴", p.price)?;
        if let Some(old) = p.old_price {
            writeln!(writer, "Стара ціна: {} ₴", old)?;
        }
        if let Some(amount) = p.discount_amount {
            writeln!(writer, "Економія: {} ₴", amount)?;
        }
        if let Some(rating) = p.rating {
            writeln!(writer, "Рейтинг: {}", rating)?;
        }
        if let Some(reviews) = p.reviews_count {
            writeln!(writer, "Відгуків: {}", reviews)?;
        }
        writeln!(writer, "Наявність: {}", p.availability)?;
        if !p.badges.is_empty() {
            writeln!(writer, "Бейджі: {}", p.badges_joined())?;
        }
        writeln!(writer, "Бренд: {}", p.brand)?;
        if let Some(pct) = p.discount_percent {
            writeln!(writer, "Знижка: {}%", pct)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn write_records<W: Write>(
    records: &[ProductRecord],
    format: OutputFormat,
    writer: &mut W,
    csv_bom: bool,
) -> Result<(), ExportError> {
    match format {
        OutputFormat::Csv => write_csv(records, writer, csv_bom),
        OutputFormat::Json => write_json(records, writer),
        OutputFormat::Jsonl => write_jsonl(records, writer),
        OutputFormat::Txt => write_txt(records, writer),
    }
}

/// Write to `path`, creating parent directories as needed.
pub fn write_file(
    records: &[ProductRecord],
    format: OutputFormat,
    path: &Path,
    csv_bom: bool,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write_records(records, format, &mut writer, csv_bom)?;
    writer.flush()?;
    Ok(())
}

/// Console preview of the first `count` records.
pub fn render_sample(records: &[ProductRecord], count: usize) -> String {
    let shown = records.len().min(count);
    if shown == 0 {
        return String::new();
    }
    let mut out = format!("Приклад товарів ({} шт.):\n\n", shown);
    for (i, p) in records.iter().take(shown).enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, p.title));
        out.push_str(&format!("   Бренд: {}\n", p.brand));
        out.push_str(&format!("   Ціна: {} ₴\n", p.price));
        if p.has_discount() {
            if let Some(old) = p.old_price {
                out.push_str(&format!("   Стара ціна: {} ₴\n", old));
            }
            if let Some(amount) = p.discount_amount {
                out.push_str(&format!("   Економія: {} ₴\n", amount));
            }
            if let Some(pct) = p.discount_percent {
                out.push_str(&format!("   Знижка: -{}%\n", pct));
            }
        } else {
            out.push_str("   Без знижки\n");
        }
        if let Some(rating) = p.rating {
            out.push_str(&format!("   Рейтинг: {}/5\n", rating));
        }
        if let Some(reviews) = p.reviews_count {
            out.push_str(&format!("   Відгуків: {}\n", reviews));
        }
        if !p.badges.is_empty() {
            out.push_str(&format!("   Бейджі: {}\n", p.badges_joined()));
        }
        out.push_str(&format!("   {}\n", p.availability));
        out.push_str(&format!("   {}\n\n", p.url));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordDraft;
    use tempfile::TempDir;

    fn discounted() -> ProductRecord {
        RecordDraft {
            title: Some("Ariel гель, 1.95 л".to_string()),
            url: "https://maudau.com.ua/product/ariel".to_string(),
            price: Some(319),
            old_price: Some(399),
            rating: Some(4.5),
            availability: Availability::InStock,
            badges: vec!["Хіт".to_string(), "Акція".to_string()],
            brand: "Ariel".to_string(),
            ..Default::default()
        }
        .finish()
        .unwrap()
    }

    fn plain() -> ProductRecord {
        RecordDraft {
            title: Some("Мило".to_string()),
            price: Some(45),
            ..Default::default()
        }
        .finish()
        .unwrap()
    }

    #[test]
    fn test_csv_header_and_rows() {
        let mut buffer = Vec::new();
        write_csv(&[discounted(), plain()], &mut buffer, false).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], FIELD_ORDER.join(","));
        assert_eq!(
            lines[1],
            "\"Ariel гель, 1.95 л\",https://maudau.com.ua/product/ariel,,319,399,80,4.5,,В наявності,\"Хіт, Акція\",Ariel,20"
        );
        assert_eq!(lines[2], "Мило,,,45,,,,,Невідомо,,,");
    }

    #[test]
    fn test_csv_bom_and_empty_list() {
        let mut buffer = Vec::new();
        write_csv(&[], &mut buffer, true).unwrap();
        assert!(buffer.starts_with(UTF8_BOM));
        let output = String::from_utf8(buffer[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(output.trim_end(), FIELD_ORDER.join(","));
    }

    #[test]
    fn test_json_keeps_field_order() {
        let mut buffer = Vec::new();
        write_json(&[discounted()], &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        let positions: Vec<usize> = FIELD_ORDER
            .iter()
            .map(|field| output.find(&format!("\"{}\"", field)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let parsed: Vec<ProductRecord> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, vec![discounted()]);
    }

    #[test]
    fn test_jsonl_one_record_per_line() {
        let mut buffer = Vec::new();
        write_jsonl(&[discounted(), plain()], &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["title"], "Мило");
        assert_eq!(second["old_price"], serde_json::Value::Null);
        assert_eq!(second["availability"], "Невідомо");
    }

    #[test]
    fn test_txt_blocks() {
        let mut buffer = Vec::new();
        write_txt(&[discounted(), plain()], &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("ТОВАР #1\n"));
        assert!(output.contains("ТОВАР #2\n"));
        assert!(output.contains("Стара ціна: 399 ₴\n"));
        assert!(output.contains("Знижка: 20%\n"));
        assert_eq!(output.matches("Стара ціна").count(), 1);
    }

    #[test]
    fn test_render_sample_shows_only_present_fields() {
        let sample = render_sample(&[plain(), discounted()], 1);
        assert!(sample.contains("1. Мило"));
        assert!(!sample.contains("Ariel"));
        assert!(!sample.contains("Стара ціна"));
        assert!(!sample.contains("Рейтинг"));
        assert!(sample.contains("Без знижки"));
        assert_eq!(render_sample(&[], 5), "");
    }

    #[test]
    fn test_render_sample_discount_block() {
        let sample = render_sample(&[discounted()], 1);
        assert!(sample.contains("Стара ціна: 399 ₴\n"));
        assert!(sample.contains("Економія: 80 ₴\n"));
        assert!(sample.contains("Знижка: -20%\n"));
        assert!(!sample.contains("Без знижки"));
    }

    #[test]
    fn test_write_file_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join(format!("products.{}", OutputFormat::Jsonl.extension()));
        write_file(&[plain()], OutputFormat::Jsonl, &path, false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 1);
    }
}
