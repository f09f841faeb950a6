//! Data-link CSV reader.
//!
//! The first record is the header; it fixes the date column, its format and
//! the value column for every following record. Cells are trimmed, empty
//! cells are skipped, numeric cells (exponent notation included) become
//! numbers and anything else stays text.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;

use crate::domain::data_row::{DataRow, Field};
use crate::domain::error::ReaderError;
use crate::domain::value_column::{normalise, DataDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateFormat {
    Day,
    Month,
    Year,
}

impl DateFormat {
    fn for_column(name: &str) -> Option<Self> {
        match name {
            "date" => Some(DateFormat::Day),
            "report_month" => Some(DateFormat::Month),
            "year" => Some(DateFormat::Year),
            _ => None,
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Day => "yyyy-MM-dd",
            DateFormat::Month => "yyyy-MM",
            DateFormat::Year => "yyyy",
        }
    }

    fn parse(self, s: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::Day => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            DateFormat::Month => NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").ok(),
            DateFormat::Year => s
                .parse::<i32>()
                .ok()
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatalinkSchema {
    columns: Vec<String>,
    date_index: usize,
    date_format: DateFormat,
    value_index: Option<usize>,
}

impl DatalinkSchema {
    pub fn from_header<'a, I>(header: I, descriptor: &DataDescriptor) -> Result<Self, ReaderError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let columns: Vec<String> = header.into_iter().map(normalise).collect();

        let (date_index, date_format) = columns
            .iter()
            .enumerate()
            .find_map(|(i, c)| DateFormat::for_column(c).map(|f| (i, f)))
            .ok_or_else(|| ReaderError::MissingDateColumn {
                header: columns.join(","),
            })?;

        let value_index = descriptor.resolve(&columns)?;

        Ok(DatalinkSchema {
            columns,
            date_index,
            date_format,
            value_index,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn value_column(&self) -> Option<&str> {
        self.value_index.map(|i| self.columns[i].as_str())
    }

    pub fn read_record(
        &self,
        symbol: &str,
        record: &StringRecord,
        line: usize,
    ) -> Result<DataRow, ReaderError> {
        if record.len() > self.columns.len() {
            return Err(ReaderError::Malformed {
                line,
                reason: format!(
                    "{} cells for {} columns",
                    record.len(),
                    self.columns.len()
                ),
            });
        }

        let date_cell = record.get(self.date_index).unwrap_or("").trim();
        let date = self
            .date_format
            .parse(date_cell)
            .ok_or_else(|| ReaderError::InvalidDate {
                line,
                value: date_cell.to_string(),
                format: self.date_format.pattern(),
            })?;

        let mut fields = BTreeMap::new();
        for (i, cell) in record.iter().enumerate() {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let field = if i == self.date_index {
                Field::Date(date)
            } else {
                parse_cell(cell)
            };
            fields.insert(self.columns[i].clone(), field);
        }

        let value = self
            .value_index
            .and_then(|i| fields.get(&self.columns[i]))
            .and_then(Field::as_number);

        Ok(DataRow {
            symbol: symbol.to_string(),
            date,
            fields,
            value,
        })
    }
}

fn parse_cell(cell: &str) -> Field {
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Field::Number(v),
        _ => Field::Text(cell.to_string()),
    }
}

/// Parse a whole data-link CSV document into rows sorted by date.
pub fn parse_rows(
    symbol: &str,
    content: &str,
    descriptor: &DataDescriptor,
) -> Result<Vec<DataRow>, ReaderError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut records = rdr.records();
    let header = match records.next() {
        Some(Ok(h)) => h,
        Some(Err(e)) => {
            return Err(ReaderError::Malformed {
                line: 1,
                reason: e.to_string(),
            });
        }
        None => return Err(ReaderError::EmptySource),
    };
    let schema = DatalinkSchema::from_header(header.iter(), descriptor)?;

    let mut rows = Vec::new();
    for (i, result) in records.enumerate() {
        let line = i + 2;
        let record = result.map_err(|e| ReaderError::Malformed {
            line,
            reason: e.to_string(),
        })?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(schema.read_record(symbol, &record, line)?);
    }

    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DescriptorError;

    fn two_lines(header: &str, data: &str) -> String {
        format!("{}\n{}\n", header, data)
    }

    #[test]
    fn custom_value_column() {
        let content = two_lines(
            "date,open,high,low,close,transactions,index",
            "2021-12-02,100,101,100,101,1000,999",
        );
        let d = DataDescriptor::custom("index").unwrap();
        let rows = parse_rows("UMICH/SOC1", &content, &d).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, Some(999.0));
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2021, 12, 2).unwrap());
    }

    #[test]
    fn default_descriptor_uses_close() {
        let content = two_lines(
            "date,open,high,low,close,transactions,adj. close",
            "2021-12-02,100,101,100,101,1000,999",
        );
        let rows = parse_rows("WIKI/IBM", &content, &DataDescriptor::Default).unwrap();
        assert_eq!(rows[0].value, Some(101.0));
    }

    #[test]
    fn two_descriptors_over_one_source() {
        let content = two_lines(
            "date,open,high,low,close,transactions,adj. close, adj. volume",
            "2021-12-02,100,101,100,101,1000,999, 111",
        );
        let close = DataDescriptor::custom("adj. close").unwrap();
        let volume = DataDescriptor::custom("adj. volume").unwrap();
        assert_eq!(parse_rows("IBM", &content, &close).unwrap()[0].value, Some(999.0));
        assert_eq!(parse_rows("SPY", &content, &volume).unwrap()[0].value, Some(111.0));
    }

    #[test]
    fn custom_column_absent_from_header() {
        let content = two_lines("date,close", "2021-12-02,1");
        let d = DataDescriptor::custom("settle").unwrap();
        let err = parse_rows("X", &content, &d).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::Descriptor(DescriptorError::MissingValueColumn { .. })
        ));
    }

    #[test]
    fn various_dataset_layouts() {
        let cases = [
            (
                "code,date,value",
                "TRFUS,2020-08-28,1197064.8298",
                Some(1197064.8298),
            ),
            ("indicator,date,value", "ZWE_PPPSH,1997-12-31,", None),
            (
                "energy,code,country,date,value,notes",
                "OIL,TPSDKT,ZAF,2024-04-30,0.0000,3",
                Some(0.0),
            ),
            (
                "code,date,high,low,mid,last,bid,ask,volume",
                "ZRXBTC,2022-02-20,1.493e-05,1.448e-05,1.487e-05,1.489e-05,1.485e-05,1.489e-05,6907.80795766",
                None,
            ),
            ("date,value", "2024-01-12,80.18", Some(80.18)),
            (
                "item_code,country_code,date,opening_stock,delivered_in,delivered_out,closing_stock,open_tonnage,cancelled_tonnage",
                "ZII,UNE,2020-07-23,26075.0,0.0,0.0,26075.0,14425.0,11650.0",
                None,
            ),
            (
                "series_id,country_code,country_name,year,value",
                "VC.PKP.TOTL.UN,XKX,Kosovo,2017,357.0",
                Some(357.0),
            ),
            (
                "code,report_month,region,commodity,item,year,period,value,min_value,max_value",
                "WHEAT_WORLD_19,2024-02,World Less China,Wheat,Production,2023/24 Proj.,Jan,648.32,,",
                Some(648.32),
            ),
        ];

        for (header, data, expected) in cases {
            let rows = parse_rows("QDL", &two_lines(header, data), &DataDescriptor::Default)
                .unwrap_or_else(|e| panic!("{}: {}", header, e));
            assert_eq!(rows.len(), 1, "{}", header);
            assert_eq!(rows[0].value, expected, "{}", header);
        }
    }

    #[test]
    fn exponent_cells_are_numbers() {
        let content = two_lines("code,date,high", "ZRXBTC,2022-02-20,1.493e-05");
        let rows = parse_rows("QDL/BITFINEX", &content, &DataDescriptor::Default).unwrap();
        assert_eq!(rows[0].get("high"), Some(&Field::Number(1.493e-05)));
        assert_eq!(rows[0].get("code"), Some(&Field::Text("ZRXBTC".into())));
    }

    #[test]
    fn year_and_month_dates() {
        let rows = parse_rows(
            "WB/DATA",
            &two_lines("series_id,year,value", "X,2017,1"),
            &DataDescriptor::Default,
        )
        .unwrap();
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2017, 1, 1).unwrap());

        let rows = parse_rows(
            "WASDE/DATA",
            &two_lines("code,report_month,value", "W,2022-08,17.15"),
            &DataDescriptor::Default,
        )
        .unwrap();
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2022, 8, 1).unwrap());
    }

    #[test]
    fn first_date_like_column_wins() {
        let rows = parse_rows(
            "WASDE/DATA",
            &two_lines("report_month,year,value", "2024-02,2023/24 Proj.,1"),
            &DataDescriptor::Default,
        )
        .unwrap();
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(rows[0].get("year"), Some(&Field::Text("2023/24 Proj.".into())));
    }

    #[test]
    fn header_names_are_normalised() {
        let content = two_lines("Date, Settle ", "2020-01-02,400.5");
        let d = DataDescriptor::custom("Settle").unwrap();
        let rows = parse_rows("SHFE/SCF2021", &content, &d).unwrap();
        assert_eq!(rows[0].value, Some(400.5));
    }

    #[test]
    fn missing_date_column() {
        let err = parse_rows("X", &two_lines("a,b", "1,2"), &DataDescriptor::Default).unwrap_err();
        assert_eq!(
            err,
            ReaderError::MissingDateColumn {
                header: "a,b".into()
            }
        );
    }

    #[test]
    fn invalid_date_reports_line() {
        let content = "date,close\n2020-01-02,1\n02/01/2020,2\n";
        let err = parse_rows("X", content, &DataDescriptor::Default).unwrap_err();
        assert_eq!(
            err,
            ReaderError::InvalidDate {
                line: 3,
                value: "02/01/2020".into(),
                format: "yyyy-MM-dd",
            }
        );
    }

    #[test]
    fn too_many_cells_is_malformed() {
        let err = parse_rows("X", "date,close\n2020-01-02,1,2\n", &DataDescriptor::Default)
            .unwrap_err();
        assert!(matches!(err, ReaderError::Malformed { line: 2, .. }));
    }

    #[test]
    fn empty_source() {
        assert_eq!(
            parse_rows("X", "", &DataDescriptor::Default).unwrap_err(),
            ReaderError::EmptySource
        );
    }

    #[test]
    fn rows_sorted_by_date() {
        let content = "date,close\n2020-01-03,3\n2020-01-01,1\n2020-01-02,2\n";
        let rows = parse_rows("X", content, &DataDescriptor::Default).unwrap();
        let values: Vec<_> = rows.iter().map(|r| r.value.unwrap()).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn schema_reports_value_column() {
        let schema =
            DatalinkSchema::from_header(["date", "open", "settle"], &DataDescriptor::Default)
                .unwrap();
        assert_eq!(schema.value_column(), Some("settle"));
        assert_eq!(schema.columns().len(), 3);
    }
}
