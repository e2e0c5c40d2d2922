use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::domain::ContactDraft;

const REQUIRED_COLUMNS: [&str; 2] = ["name", "phone_number"];

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// One data row of an import: a validated draft or the reason it was skipped.
pub type ParsedRow = Result<ContactDraft, String>;

/// Reads `name, phone_number, company_name, email, tags` rows.
///
/// Header problems fail the whole import. Row problems are reported as
/// `Row N: <reason>` with data rows numbered from 1.
pub fn parse_contacts<R: Read>(reader: R) -> Result<Vec<ParsedRow>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(ImportError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<ContactRow>().enumerate() {
        let row_number = index + 1;
        let parsed = match record {
            Ok(row) => row
                .into_draft()
                .validate()
                .map_err(|reason| format!("Row {row_number}: {reason}")),
            Err(err) => Err(format!("Row {row_number}: {err}")),
        };
        rows.push(parsed);
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct ContactRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    phone_number: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    company_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    tags: Option<String>,
}

impl ContactRow {
    fn into_draft(self) -> ContactDraft {
        ContactDraft {
            name: self.name.unwrap_or_default(),
            phone_number: self.phone_number.unwrap_or_default(),
            company_name: self.company_name,
            email: self.email,
            tags: self.tags,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_reports_per_row_problems() {
        let csv = "name,phone_number,company_name,email,tags\n\
                   Ada,+14155550100,Analytical Engines,,vip\n\
                   ,+14155550101,,,\n\
                   Grace,,,,\n\
                   Linus,555-0100,,,\n";

        let rows = parse_contacts(csv.as_bytes()).expect("headers valid");
        assert_eq!(rows.len(), 4);

        let ada = rows[0].as_ref().expect("first row valid");
        assert_eq!(ada.name, "Ada");
        assert_eq!(ada.company_name.as_deref(), Some("Analytical Engines"));
        assert_eq!(ada.email, None);
        assert_eq!(ada.tags.as_deref(), Some("vip"));

        assert_eq!(rows[1].as_ref().unwrap_err(), "Row 2: Name is required");
        assert_eq!(rows[2].as_ref().unwrap_err(), "Row 3: Phone number is required");
        assert_eq!(
            rows[3].as_ref().unwrap_err(),
            "Row 4: Invalid phone number format: 555-0100"
        );
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let rows = parse_contacts("phone_number,name\n+14155550100, Ada \n".as_bytes())
            .expect("headers valid");
        let ada = rows[0].as_ref().expect("valid row");
        assert_eq!(ada.name, "Ada");
        assert_eq!(ada.tags, None);
    }

    #[test]
    fn missing_required_column_fails_import() {
        let err = parse_contacts("name,email\nAda,ada@example.com\n".as_bytes())
            .expect_err("phone column missing");
        assert!(matches!(err, ImportError::MissingColumn("phone_number")));
    }
}
