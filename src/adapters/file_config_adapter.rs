//! INI file configuration adapter.

use crate::domain::error::LinkError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LinkError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| LinkError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, LinkError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| LinkError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[session]
start_date = 2014-01-01
cash = 25000

[strategy]
kind = ratio
numerator_column = adj. close
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("session", "start_date"),
            Some("2014-01-01".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "numerator_column"),
            Some("adj. close".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[session]\ncash = 100\n").unwrap();
        assert_eq!(adapter.get_string("session", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn section_and_key_names_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Data]\nAuth_Token = abc\n").unwrap();
        assert_eq!(adapter.get_string("data", "auth_token"), Some("abc".into()));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\nplots_path = /tmp/plots.csv\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "plots_path"),
            Some("/tmp/plots.csv".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini")
            .err()
            .unwrap();
        assert!(matches!(err, LinkError::ConfigParse { ref file, .. } if file.contains("config.ini")));
    }
}
